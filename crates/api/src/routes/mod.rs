//! API routes

pub mod ops;
pub mod sessions;
pub mod storage;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the complete API router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Liveness (no auth)
        .merge(ops::routes())
        // Session lifecycle
        .nest("/api/v1/sessions", sessions::routes())
        // Capability-token-authorized blob writes
        .nest("/storage", storage::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
