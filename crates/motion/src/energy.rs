//! Motion-energy signal
//!
//! A scalar combining acceleration and angular-velocity magnitude. Both
//! detectors operate on this signal rather than the raw channels, so a fast
//! wrist rotation and a linear punch register on the same scale.

use suburi_model::InertialSample;

use crate::config::SegmentationConfig;

/// Energy of a single sample: `w_a * |accel| + w_g * |gyro|`.
pub fn motion_energy(sample: &InertialSample, config: &SegmentationConfig) -> f32 {
    config.accel_weight * sample.accel.magnitude() + config.gyro_weight * sample.gyro.magnitude()
}

/// Precompute the energy series for a sample sequence.
pub fn energies(samples: &[InertialSample], config: &SegmentationConfig) -> Vec<f32> {
    samples.iter().map(|s| motion_energy(s, config)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use suburi_model::Vec3;

    #[test]
    fn energy_combines_weighted_magnitudes() {
        let config = SegmentationConfig::default();
        let s = InertialSample::new(
            0,
            0,
            Vec3::new(3.0, 4.0, 0.0),
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::ZERO,
        );
        // 1.0 * 5.0 + 0.8 * 2.0
        assert!((motion_energy(&s, &config) - 6.6).abs() < 1e-6);
    }

    #[test]
    fn still_sample_has_zero_energy() {
        let config = SegmentationConfig::default();
        let s = InertialSample::new(0, 0, Vec3::ZERO, Vec3::ZERO, Vec3::ZERO);
        assert_eq!(motion_energy(&s, &config), 0.0);
    }
}
