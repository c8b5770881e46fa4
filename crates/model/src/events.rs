//! Derived motion events
//!
//! Outputs of the segmentation and integration engines. All three types are
//! immutable once produced: segments and ZUPT periods are emitted at
//! end-of-interval by the segmentation pass, kinematics points one per input
//! sample by the integrator.

use serde::{Deserialize, Serialize};

/// A detected high-energy interval (one swing/strike)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSegment {
    /// Index of the first sample in the segment
    pub start: usize,
    /// Index of the last sample in the segment (inclusive)
    pub end: usize,
    /// Peak motion energy observed inside the segment
    pub peak_energy: f32,
    /// Segment duration in seconds
    pub duration_s: f32,
    /// Whether the look-ahead window after the segment was mostly still
    pub ended_in_stillness: bool,
}

/// A detected low-motion interval usable as a zero-velocity anchor
///
/// Periods never overlap and each lasts at least the configured minimum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZuptPeriod {
    /// Index of the first sample in the period
    pub start: usize,
    /// Index of the last sample in the period (inclusive)
    pub end: usize,
    /// Mean motion energy over the period
    pub mean_energy: f32,
    /// Period duration in seconds
    pub duration_s: f32,
}

impl ZuptPeriod {
    /// Whether a sample index falls inside this period
    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index <= self.end
    }
}

/// One integrated kinematic state
///
/// Internal integration math is double precision; these are the published
/// values, ordered by timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KinematicsPoint {
    /// Seconds since session start
    pub t: f64,
    /// Position in meters
    pub position: [f64; 3],
    /// Velocity in m/s
    pub velocity: [f64; 3],
    /// Instantaneous acceleration in m/s²
    pub accel: [f64; 3],
}
