//! Suburi Configuration
//!
//! TOML-based configuration loading with sensible defaults. A minimal
//! config should just work - only specify what you need to change.
//!
//! # Example
//!
//! ```toml
//! [server]
//! bind_addr = "0.0.0.0:3000"
//! data_dir = "data"
//!
//! [capture]
//! target_hz = 100.0
//!
//! [log]
//! level = "info"
//! ```

mod capture;
mod error;
mod logging;
mod server;

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

pub use capture::CaptureSettings;
pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use server::ServerConfig;

/// Main configuration structure
///
/// All sections are optional with defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ingestion service settings
    pub server: ServerConfig,

    /// Capture client settings
    pub capture: CaptureSettings,

    /// Logging settings
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_str(&content)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.server.bind_addr, "127.0.0.1:3000");
        assert_eq!(config.capture.target_hz, 100.0);
        assert_eq!(config.log.level, LogLevel::Info);
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let config = Config::from_str(
            r#"
            [server]
            bind_addr = "0.0.0.0:8080"

            [capture]
            buffer_limit = 5000
            "#,
        )
        .unwrap();

        assert_eq!(config.server.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.server.data_dir, "data");
        assert_eq!(config.capture.buffer_limit, 5000);
        assert_eq!(config.capture.upload_concurrency, 2);
    }
}
