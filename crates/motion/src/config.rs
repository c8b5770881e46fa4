//! Segmentation configuration

/// Tuning parameters for swing and ZUPT detection.
///
/// Defaults were tuned against handheld strike captures at ~100 Hz; every
/// threshold applies to the combined motion-energy signal.
#[derive(Debug, Clone)]
pub struct SegmentationConfig {
    /// Weight of acceleration magnitude in the energy signal.
    pub accel_weight: f32,

    /// Weight of angular-velocity magnitude in the energy signal.
    pub gyro_weight: f32,

    /// Energy above this enters the `swinging` state.
    pub swing_start_threshold: f32,

    /// Energy below this exits the `swinging` state. Kept well under the
    /// start threshold: the gap is the hysteresis band.
    pub swing_end_threshold: f32,

    /// Swings shorter than this are discarded silently (seconds).
    pub min_swing_duration_s: f32,

    /// How many samples past a swing's end to inspect for stillness.
    pub stillness_lookahead: usize,

    /// Fraction of look-ahead energies that must be below the ZUPT
    /// threshold to mark a swing as ended-in-stillness.
    pub stillness_fraction: f32,

    /// Energy below this is stillness.
    pub zupt_threshold: f32,

    /// Gate ZUPT entry on trailing-window energy variance.
    pub zupt_variance_check: bool,

    /// Trailing window length for the variance gate (samples).
    pub zupt_variance_window: usize,

    /// Population variance below this passes the gate.
    pub zupt_variance_threshold: f32,

    /// ZUPT periods shorter than this are dropped (seconds).
    pub min_zupt_duration_s: f32,

    /// Below this many samples both detectors return empty results.
    pub min_samples: usize,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            accel_weight: 1.0,
            gyro_weight: 0.8,
            swing_start_threshold: 8.0,
            swing_end_threshold: 3.0,
            min_swing_duration_s: 0.150,
            stillness_lookahead: 20,
            stillness_fraction: 0.7,
            zupt_threshold: 1.5,
            zupt_variance_check: true,
            zupt_variance_window: 10,
            zupt_variance_threshold: 0.5,
            min_zupt_duration_s: 0.100,
            min_samples: 10,
        }
    }
}
