//! Ingestion protocol wire types
//!
//! JSON payloads exchanged between the capture client and the ingestion
//! service, plus the per-chunk metadata header written as the first line of
//! every chunk file. Timestamps are RFC 3339 via chrono's serde support.
//!
//! # Protocol
//!
//! - `POST /api/v1/sessions` - [`CreateSessionRequest`] → [`CreateSessionResponse`]
//!   (201 created, 200 when the client upload id was already registered)
//! - `POST /api/v1/sessions/{id}/finalize` - [`FinalizeRequest`] → [`FinalizeResponse`]
//! - `GET /api/v1/sessions/{id}` - [`SessionDetail`]
//! - `GET /api/v1/sessions` - paginated [`SessionSummary`] list

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{CoordFrame, DeviceInfo, FilePurpose, RateStats, SessionFile};

/// Chunk/protocol schema version; bump when the field set changes
pub const SCHEMA_VERSION: &str = "1";

// =============================================================================
// CreateSession
// =============================================================================

/// Request body for idempotent session creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    /// Client-generated idempotency key (one logical capture)
    pub client_upload_id: String,
    pub device_info: DeviceInfo,
    pub start_time_utc: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nominal_hz: Option<f64>,
    #[serde(default)]
    pub coord_frame: CoordFrame,
    #[serde(default = "default_gravity_removed")]
    pub gravity_removed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn default_gravity_removed() -> bool {
    true
}

/// Capability grant scoped to one session's storage prefix
///
/// Time-bounded write access; expired grants are re-issued by calling
/// `CreateSession` again with the same client upload id, never refreshed
/// in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityGrant {
    /// Storage container name
    pub container: String,
    /// Session prefix the token is scoped to, e.g. `users/u1/sessions/42/`
    pub path: String,
    /// Opaque signed token the client presents on writes
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl CapabilityGrant {
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// Response for session creation (or idempotent retrieval)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: i64,
    pub user_id: String,
    pub device_id: i64,
    pub start_time_utc: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nominal_hz: Option<f64>,
    pub coord_frame: CoordFrame,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,
    pub capability: CapabilityGrant,
}

// =============================================================================
// FinalizeManifest
// =============================================================================

/// One manifest entry; the server verifies existence and size
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestFile {
    pub filename: String,
    pub purpose: FilePurpose,
    pub bytes_size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256_hex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_samples: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// Request body for manifest finalization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizeRequest {
    pub end_time_utc: DateTime<Utc>,
    /// May be empty for sessions that captured no data
    #[serde(default)]
    pub files: Vec<ManifestFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_stats: Option<RateStats>,
}

/// Finalize summary; identical for the first call and idempotent replays
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizeResponse {
    pub session_id: i64,
    pub total_files: i64,
    pub total_bytes: i64,
    pub total_samples: i64,
    pub end_time_utc: DateTime<Utc>,
    /// True when this call hit an already-finalized session
    #[serde(default)]
    pub already_finalized: bool,
}

// =============================================================================
// Reads
// =============================================================================

/// Full session detail including registered files and rate stats
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDetail {
    pub session_id: i64,
    pub user_id: String,
    pub device_id: i64,
    pub start_time_utc: DateTime<Utc>,
    pub end_time_utc: Option<DateTime<Utc>>,
    pub nominal_hz: Option<f64>,
    pub actual_mean_hz: Option<f64>,
    pub coord_frame: CoordFrame,
    pub gravity_removed: bool,
    pub game_session_id: Option<String>,
    pub action_type: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub device: Option<DeviceInfo>,
    pub files: Vec<SessionFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_stats: Option<RateStats>,
}

/// One row of the paginated session list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: i64,
    pub start_time_utc: DateTime<Utc>,
    pub end_time_utc: Option<DateTime<Utc>>,
    pub nominal_hz: Option<f64>,
    pub actual_mean_hz: Option<f64>,
    pub coord_frame: CoordFrame,
    pub action_type: Option<String>,
    pub file_count: i64,
}

// =============================================================================
// Chunk metadata
// =============================================================================

/// First line of every chunk file
///
/// Carries enough context to reprocess the chunk without the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMeta {
    pub schema_version: String,
    pub session_id: i64,
    pub user_id: String,
    pub device_id: i64,
    pub session_start_utc: DateTime<Utc>,
    pub nominal_hz: Option<f64>,
    pub coord_frame: CoordFrame,
    pub gravity_removed: bool,
    /// Zero-based chunk index within the session
    pub chunk_index: u32,
}
