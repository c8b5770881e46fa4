//! Store error types

use thiserror::Error;

/// Result alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors from blob storage and capability tokens
#[derive(Debug, Error)]
pub enum StoreError {
    /// Blob does not exist
    #[error("blob not found: {0}")]
    NotFound(String),

    /// Path escapes the store root or contains invalid components
    #[error("invalid storage path: {0}")]
    InvalidPath(String),

    /// Token failed signature verification or is malformed
    #[error("invalid capability token")]
    InvalidToken,

    /// Token expired - recoverable by requesting a new grant
    #[error("capability token expired")]
    TokenExpired,

    /// Write attempted outside the token's scoped prefix
    #[error("path '{path}' is outside the token scope '{scope}'")]
    OutsideScope { path: String, scope: String },

    /// Underlying I/O failure
    #[error("storage i/o error: {0}")]
    Io(#[from] std::io::Error),
}
