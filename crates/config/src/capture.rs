//! Capture client configuration

use serde::Deserialize;

/// Capture settings
///
/// Algorithm thresholds (energy weights, detection thresholds) live with
/// their engines; this covers the lifecycle knobs an operator tunes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Requested sample rate in Hz. A request to the platform timer, not
    /// a guarantee.
    /// Default: 100.0
    pub target_hz: f64,

    /// Samples buffered in memory before rotating into a chunk file
    /// Default: 10000 (~100 s at 100 Hz)
    pub buffer_limit: usize,

    /// Simultaneous chunk uploads
    /// Default: 2
    pub upload_concurrency: usize,

    /// First retry delay in seconds; doubles each attempt
    /// Default: 2
    pub retry_base_delay_secs: u64,

    /// Upload attempts before a chunk parks as queued
    /// Default: 5
    pub retry_max_attempts: u32,

    /// Journals older than this many days are discarded at resume
    /// Default: 7
    pub max_resume_age_days: i64,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            target_hz: 100.0,
            buffer_limit: 10_000,
            upload_concurrency: 2,
            retry_base_delay_secs: 2,
            retry_max_attempts: 5,
            max_resume_age_days: 7,
        }
    }
}
