//! API error types
//!
//! Structured error responses for the ingestion service. Every variant maps
//! to a status code and a stable machine-readable code.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use suburi_store::StoreError;

/// Result alias for handlers
pub type Result<T> = std::result::Result<T, ApiError>;

/// API errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request parameters
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Authentication required or failed
    #[error("authentication required")]
    Unauthorized,

    /// Capability token expired - recoverable by re-creating the session
    #[error("capability token expired")]
    TokenExpired,

    /// Authenticated but not allowed
    #[error("permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Manifest size verification failed
    #[error("file size mismatch for {filename}: claimed {claimed}, actual {actual}")]
    SizeMismatch {
        filename: String,
        claimed: i64,
        actual: i64,
    },

    /// Manifest files absent from the backing store
    #[error("files not found in storage: {}", .0.join(", "))]
    MissingFiles(Vec<String>),

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),

    /// Catalog error
    #[error(transparent)]
    Control(#[from] suburi_control::ControlError),
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::TokenExpired => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::SizeMismatch { .. } => StatusCode::BAD_REQUEST,
            Self::MissingFiles(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Control(suburi_control::ControlError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Control(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::SizeMismatch { .. } => "SIZE_MISMATCH",
            Self::MissingFiles(_) => "MISSING_FILES",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Control(suburi_control::ControlError::NotFound { .. }) => "NOT_FOUND",
            Self::Control(_) => "CATALOG_ERROR",
        }
    }

    // Helper constructors

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{} '{}' not found", entity, id))
    }

    /// Create a forbidden error
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Create a validation error
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::TokenExpired => Self::TokenExpired,
            StoreError::InvalidToken => Self::Unauthorized,
            StoreError::OutsideScope { path, .. } => {
                Self::Forbidden(format!("write outside granted scope: {}", path))
            }
            StoreError::NotFound(path) => Self::NotFound(path),
            StoreError::InvalidPath(path) => Self::BadRequest(format!("invalid path: {}", path)),
            StoreError::Io(e) => Self::Internal(format!("storage i/o: {}", e)),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code (machine-readable)
    pub error: &'static str,
    /// Error message (human-readable)
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.code(),
            message: self.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(error_code = body.error, error_message = %body.message, "API error");
        } else {
            tracing::warn!(error_code = body.error, error_message = %body.message, "API rejection");
        }

        (status, Json(body)).into_response()
    }
}
