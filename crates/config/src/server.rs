//! Ingestion service configuration

use serde::Deserialize;

/// Server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    /// Default: 127.0.0.1:3000
    pub bind_addr: String,

    /// Root directory for the catalog database and blob store
    /// Default: "data"
    pub data_dir: String,

    /// Shared secret for bearer-token validation and capability signing.
    /// Default: unset - must be provided outside local development.
    pub auth_secret: Option<String>,

    /// Capability token lifetime in minutes
    /// Default: 120 (2 hours)
    pub capability_ttl_minutes: i64,

    /// Container name reported in capability grants
    /// Default: "capture"
    pub container: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            data_dir: "data".to_string(),
            auth_secret: None,
            capability_ttl_minutes: 120,
            container: "capture".to_string(),
        }
    }
}
