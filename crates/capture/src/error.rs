//! Capture error taxonomy
//!
//! Variants map to distinct recovery strategies: sensor loss is fatal for
//! the session, transient network failures retry then queue, expired
//! capability tokens re-request a grant, and rejections surface directly.

use thiserror::Error;

/// Result alias for capture operations
pub type Result<T> = std::result::Result<T, CaptureError>;

/// Capture pipeline errors
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The sensor went away. Fatal for the session; never retried.
    #[error("sensor unavailable: {0}")]
    SensorUnavailable(String),

    /// Transient network failure - retried with backoff, then queued
    #[error("transient network error: {0}")]
    NetworkTransient(String),

    /// Capability token expired - re-request a session, not fatal
    #[error("capability token expired")]
    TokenExpired,

    /// The server rejected the request (auth, ownership, verification)
    #[error("server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Disk failure for one chunk - fatal to that chunk only
    #[error("chunk i/o error: {0}")]
    ChunkIo(#[from] std::io::Error),

    /// Malformed chunk or journal content
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// Lifecycle event arrived in the wrong state
    #[error("invalid transition: {event} while {state}")]
    InvalidState {
        state: &'static str,
        event: &'static str,
    },

    /// Internal task failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl CaptureError {
    /// Whether the upload path should retry after this error
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkTransient(_))
    }
}
