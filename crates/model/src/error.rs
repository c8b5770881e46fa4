//! Model error types

use thiserror::Error;

/// Result alias for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors from parsing or validating model values
#[derive(Debug, Error)]
pub enum ModelError {
    /// Unknown file purpose tag
    #[error("invalid file purpose '{0}' (expected raw, manifest, device, calib or events)")]
    InvalidPurpose(String),

    /// Unknown device platform
    #[error("invalid platform '{0}' (expected ios, android, switch or other)")]
    InvalidPlatform(String),

    /// Unknown coordinate frame tag
    #[error("invalid coord frame '{0}' (expected device or world)")]
    InvalidCoordFrame(String),

    /// Malformed SHA-256 checksum string
    #[error("invalid sha256 checksum for '{file}': must be 64 hex characters")]
    InvalidChecksum { file: String },
}
