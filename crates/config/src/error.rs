//! Configuration error types

use std::io;

use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors from loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
