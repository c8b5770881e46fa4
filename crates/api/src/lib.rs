//! Suburi API
//!
//! HTTP ingestion service for capture sessions, built on Axum.
//!
//! # Endpoints
//!
//! - `POST /api/v1/sessions` - idempotent session creation. Returns 201
//!   with a fresh capability grant, or 200 when the client upload id was
//!   already recorded (the retry path under flaky networks).
//! - `POST /api/v1/sessions/{id}/finalize` - register the file manifest,
//!   verify existence and size against the store, record optional rate
//!   stats. Idempotent: a repeat call returns the cached summary.
//! - `GET /api/v1/sessions/{id}` - session detail with files and stats.
//! - `GET /api/v1/sessions` - paginated list, owner-scoped.
//! - `PUT /storage/{path}` - capability-token-authorized blob writes (the
//!   SAS-equivalent surface backed by the local object store).
//! - `GET /health` - liveness.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use suburi_api::{AppState, auth::LocalJwtProvider, build_router};
//! use suburi_control::Catalog;
//! use suburi_store::{CapabilitySigner, LocalFsStore};
//!
//! let catalog = Arc::new(Catalog::new("data/catalog.db").await?);
//! let store = Arc::new(LocalFsStore::new("data/blobs"));
//! let auth = Arc::new(LocalJwtProvider::new(b"secret"));
//! let signer = CapabilitySigner::new(b"secret");
//!
//! let state = AppState::new(catalog, store, auth, signer);
//! let app = build_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, Result};
pub use routes::build_router;
pub use state::AppState;
