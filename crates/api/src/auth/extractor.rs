//! Authenticated-user extractor

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;
use crate::state::AppState;

/// Largest credential we bother validating
const MAX_TOKEN_SIZE: usize = 8 * 1024;

/// The authenticated subject, extracted from the Authorization header
///
/// Handlers take this as an argument; extraction failure rejects the
/// request before the handler runs.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Authenticated subject id
    pub id: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = bearer_token(parts).ok_or(ApiError::Unauthorized)?;

        let id = state
            .auth
            .validate(&token)
            .await
            .map_err(|_| ApiError::Unauthorized)?;

        Ok(AuthUser { id })
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    let header = parts.headers.get(axum::http::header::AUTHORIZATION)?;
    let value = header.to_str().ok()?;

    let token = value.strip_prefix("Bearer ").unwrap_or(value);
    if token.is_empty() || token.len() > MAX_TOKEN_SIZE {
        return None;
    }
    Some(token.to_string())
}
