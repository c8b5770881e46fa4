//! Capability-token-authorized blob writes
//!
//! The SAS-equivalent surface: clients PUT chunk files under their
//! session's storage prefix, presenting the token from their capability
//! grant. No bearer auth here - the token itself is the credential, and it
//! only opens the one prefix it was minted for.

use axum::{
    Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::put,
};
use serde::Deserialize;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: String,
}

/// Storage routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/{*path}", put(put_blob))
}

/// Write a blob under a capability-granted prefix
///
/// PUT /storage/{path}?token={capability}
async fn put_blob(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<TokenQuery>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    // Expired tokens map to TOKEN_EXPIRED so clients know to re-request a
    // grant rather than treat the upload as failed data
    state.signer.verify(&query.token, &path)?;

    state.store.put(&path, &body).await?;

    debug!(path = %path, bytes = body.len(), "Accepted blob write");
    Ok(StatusCode::CREATED)
}
