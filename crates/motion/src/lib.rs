//! Suburi Motion Segmentation
//!
//! Converts a raw inertial sample stream into a scalar motion-energy signal
//! and segments it into swings (high-energy strikes) and ZUPT periods
//! (stillness intervals usable as zero-velocity anchors).
//!
//! # Design
//!
//! Both detectors are single forward passes over a complete sample sequence:
//!
//! - [`detect_swings`] - 2-state hysteresis machine. Entry and exit use
//!   separate thresholds so energy hovering around a single crossing point
//!   cannot chatter segments on and off.
//! - [`detect_zupt`] - threshold test plus a population-variance gate over a
//!   trailing window, so brief dips in an otherwise active signal do not
//!   register as stillness.
//!
//! Degenerate input (fewer than [`SegmentationConfig::min_samples`] samples)
//! yields empty results, not errors.
//!
//! # Example
//!
//! ```
//! use suburi_motion::{detect_swings, detect_zupt, SegmentationConfig};
//!
//! let config = SegmentationConfig::default();
//! let samples = vec![];
//! assert!(detect_swings(&samples, &config).is_empty());
//! assert!(detect_zupt(&samples, &config).is_empty());
//! ```

mod config;
mod energy;
mod swing;
mod zupt;

#[cfg(test)]
mod swing_test;

pub use config::SegmentationConfig;
pub use energy::{energies, motion_energy};
pub use swing::detect_swings;
pub use zupt::detect_zupt;
