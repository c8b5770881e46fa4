//! Authentication
//!
//! The ingestion service treats identity as external: a bearer credential
//! arrives with each request and the only thing extracted from it is the
//! authenticated subject id. [`AuthProvider`] is the seam; the shipped
//! implementation validates locally-issued HS256 JWTs.

mod extractor;
mod provider;
pub mod test_utils;

pub use extractor::AuthUser;
pub use provider::{AuthError, AuthProvider, LocalJwtProvider};
