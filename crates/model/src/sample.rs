//! Raw inertial sample types
//!
//! One [`InertialSample`] per sensor callback. Timestamps are nanoseconds
//! from the platform's monotonic clock and strictly increase within one
//! capture session; `sequence` increases by exactly 1 per emitted sample,
//! so gaps indicate drops.

use serde::{Deserialize, Serialize};

/// A 3-component vector, stored at sensor precision
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean magnitude
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Normalized orientation quaternion (w, x, y, z)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// One inertial sensor reading
///
/// Required fields come first in serialized form; optional sensor channels
/// (magnetometer, orientation) are appended and omitted entirely when the
/// platform does not provide them - absent is distinct from zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InertialSample {
    /// Monotonic timestamp in nanoseconds, strictly increasing per session
    pub timestamp_ns: i64,

    /// Per-session sample counter, increments by exactly 1
    pub sequence: i64,

    /// Gravity-removed "user" acceleration (m/s²)
    pub accel: Vec3,

    /// Angular velocity (rad/s)
    pub gyro: Vec3,

    /// Raw acceleration including gravity (m/s²)
    pub raw_accel: Vec3,

    /// Magnetic field (µT), if the device has a magnetometer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mag: Option<Vec3>,

    /// Device orientation, if the platform fuses one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Quat>,
}

impl InertialSample {
    /// Build a minimal sample with only the required channels
    pub fn new(timestamp_ns: i64, sequence: i64, accel: Vec3, gyro: Vec3, raw_accel: Vec3) -> Self {
        Self {
            timestamp_ns,
            sequence,
            accel,
            gyro,
            raw_accel,
            mag: None,
            orientation: None,
        }
    }

    /// Timestamp in seconds relative to a session start timestamp
    pub fn seconds_since(&self, start_ns: i64) -> f64 {
        (self.timestamp_ns - start_ns) as f64 / 1e9
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_of_unit_axes() {
        assert_eq!(Vec3::new(3.0, 4.0, 0.0).magnitude(), 5.0);
        assert_eq!(Vec3::ZERO.magnitude(), 0.0);
    }

    #[test]
    fn optional_channels_omitted_from_json() {
        let s = InertialSample::new(10, 0, Vec3::ZERO, Vec3::ZERO, Vec3::ZERO);
        let json = serde_json::to_string(&s).unwrap();
        assert!(!json.contains("mag"));
        assert!(!json.contains("orientation"));
    }

    #[test]
    fn seconds_since_converts_nanoseconds() {
        let s = InertialSample::new(1_500_000_000, 0, Vec3::ZERO, Vec3::ZERO, Vec3::ZERO);
        assert!((s.seconds_since(500_000_000) - 1.0).abs() < 1e-12);
    }
}
