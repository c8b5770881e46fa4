//! Application state
//!
//! Shared state for API handlers: the session catalog, the object store,
//! the capability-token signer and the auth provider.

use std::sync::Arc;

use chrono::Duration;

use suburi_control::Catalog;
use suburi_store::{CapabilitySigner, ObjectStore, default_token_ttl};

use crate::auth::AuthProvider;

/// Default storage container name
pub const DEFAULT_CONTAINER: &str = "capture";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Session catalog
    pub catalog: Arc<Catalog>,
    /// Blob store backing uploads and finalize verification
    pub store: Arc<dyn ObjectStore>,
    /// Authentication provider (bearer credential → subject id)
    pub auth: Arc<dyn AuthProvider>,
    /// Capability token signer
    pub signer: CapabilitySigner,
    /// Container name reported in capability grants
    pub container: String,
    /// Capability token lifetime
    pub token_ttl: Duration,
}

impl AppState {
    pub fn new(
        catalog: Arc<Catalog>,
        store: Arc<dyn ObjectStore>,
        auth: Arc<dyn AuthProvider>,
        signer: CapabilitySigner,
    ) -> Self {
        Self {
            catalog,
            store,
            auth,
            signer,
            container: DEFAULT_CONTAINER.to_string(),
            token_ttl: default_token_ttl(),
        }
    }

    /// Override the capability token lifetime
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Storage prefix a session's files live under
    pub fn session_scope(user_id: &str, session_id: i64) -> String {
        format!("users/{}/sessions/{}/", user_id, session_id)
    }
}
