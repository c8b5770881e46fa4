//! Suburi Store
//!
//! Object storage behind the ingestion service:
//!
//! - [`ObjectStore`] - minimal blob interface (put, head, exists). Finalize
//!   verification needs nothing more than existence and size.
//! - [`LocalFsStore`] - filesystem-backed implementation.
//! - [`CapabilitySigner`] - HMAC-SHA256 capability tokens scoped to one
//!   session's storage prefix with a bounded expiry. The SAS-token
//!   equivalent: holders may write under their prefix and nowhere else,
//!   and an expired token is a normal, recoverable condition.

mod error;
mod local;
mod object_store;
mod token;


pub use error::{Result, StoreError};
pub use local::LocalFsStore;
pub use object_store::ObjectStore;
pub use token::{CapabilitySigner, default_token_ttl};
