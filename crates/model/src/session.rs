//! Session catalogue entities
//!
//! Server-side records for capture sessions, registered files, per-session
//! rate statistics and the client-upload idempotency ledger. Enum fields use
//! `as_str`/`parse` pairs so the database stores plain strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

// =============================================================================
// Enums
// =============================================================================

/// Device platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
    Switch,
    Other,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::Android => "android",
            Self::Switch => "switch",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ModelError> {
        match s {
            "ios" => Ok(Self::Ios),
            "android" => Ok(Self::Android),
            "switch" => Ok(Self::Switch),
            "other" => Ok(Self::Other),
            _ => Err(ModelError::InvalidPlatform(s.to_string())),
        }
    }
}

/// Coordinate frame the samples were captured in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordFrame {
    /// Device body frame (raw sensor axes)
    #[default]
    Device,
    /// World frame (platform-fused)
    World,
}

impl CoordFrame {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Device => "device",
            Self::World => "world",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ModelError> {
        match s {
            "device" => Ok(Self::Device),
            "world" => Ok(Self::World),
            _ => Err(ModelError::InvalidCoordFrame(s.to_string())),
        }
    }
}

/// Purpose tag for a registered session file
///
/// Exactly these five; adding another requires a schema version bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilePurpose {
    /// Raw sample chunk
    Raw,
    /// Upload manifest
    Manifest,
    /// Device snapshot
    Device,
    /// Calibration data
    Calib,
    /// Event log
    Events,
}

impl FilePurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Manifest => "manifest",
            Self::Device => "device",
            Self::Calib => "calib",
            Self::Events => "events",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ModelError> {
        match s {
            "raw" => Ok(Self::Raw),
            "manifest" => Ok(Self::Manifest),
            "device" => Ok(Self::Device),
            "calib" => Ok(Self::Calib),
            "events" => Ok(Self::Events),
            _ => Err(ModelError::InvalidPurpose(s.to_string())),
        }
    }
}

// =============================================================================
// Entities
// =============================================================================

/// Client-reported device identity, upserted per (user, hw_id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub platform: Platform,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    /// Stable hardware identifier; defaults to "unknown" when unavailable
    #[serde(default = "default_hw_id")]
    pub hw_id: String,
}

fn default_hw_id() -> String {
    "unknown".to_string()
}

/// A server-catalogued capture session
///
/// Lifecycle: created open by `CreateSession`, mutated exactly once by
/// `FinalizeManifest` (sets `end_time` and `actual_mean_hz`), then terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSession {
    /// Server-assigned id, immutable
    pub id: i64,
    /// Owning user (authenticated subject id)
    pub user_id: String,
    /// Catalogued device row
    pub device_id: i64,
    pub start_time: DateTime<Utc>,
    /// Set on finalize; null while the session is open
    pub end_time: Option<DateTime<Utc>>,
    /// Requested sample rate - a request, not a guarantee
    pub nominal_hz: Option<f64>,
    /// Measured mean rate, set on finalize when the client supplied stats
    pub actual_mean_hz: Option<f64>,
    pub coord_frame: CoordFrame,
    pub gravity_removed: bool,
    /// Informational link to an external activity session (set-null FK)
    pub game_session_id: Option<String>,
    /// Optional strike/swing label (e.g. men, kote, do)
    pub action_type: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CaptureSession {
    /// Whether the session has been finalized
    pub fn is_finalized(&self) -> bool {
        self.end_time.is_some()
    }
}

/// A registered blob belonging to a finalized session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFile {
    pub id: i64,
    pub session_id: i64,
    pub purpose: FilePurpose,
    /// Path within the backing store
    pub storage_url: String,
    pub content_type: Option<String>,
    pub bytes_size: i64,
    /// Client-claimed SHA-256, 64 hex chars; payload-identity aid only
    pub sha256_hex: Option<String>,
    pub num_samples: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Idempotency ledger row: at most one per (session, client upload id)
#[derive(Debug, Clone)]
pub struct ClientUploadRecord {
    pub session_id: i64,
    pub client_upload_id: String,
    pub created_at: DateTime<Utc>,
}

/// Optional per-session sampling quality summary
///
/// One row per session, inserted at most once and only when the client
/// supplied the data - absence is a valid, backward-compatible state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateStats {
    pub samples_total: i64,
    pub duration_ms: f64,
    pub mean_hz: f64,
    /// Median inter-sample interval (ms)
    pub dt_ms_p50: f64,
    /// 95th percentile inter-sample interval (ms)
    pub dt_ms_p95: f64,
    /// Worst inter-sample interval (ms)
    pub dt_ms_max: f64,
    /// Percentage of samples lost, derived from sequence gaps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dropped_seq_pct: Option<f64>,
}

/// Validate a client-claimed SHA-256 hex string
pub fn validate_sha256_hex(file: &str, hex: &str) -> Result<(), ModelError> {
    if hex.len() == 64 && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(ModelError::InvalidChecksum {
            file: file.to_string(),
        })
    }
}
