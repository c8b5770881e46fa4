//! Catalog error types

use thiserror::Error;

/// Catalog errors
#[derive(Debug, Error)]
pub enum ControlError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] turso::Error),

    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Uniqueness constraint hit
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    /// Stored data failed to parse back into a model value
    #[error("invalid {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl ControlError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn already_exists(entity: &'static str, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity,
            id: id.into(),
        }
    }

    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, ControlError>;
