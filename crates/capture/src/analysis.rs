//! Post-capture analysis
//!
//! Runs the segmentation and integration engines over a finished session.
//! Called after recording stops, on a worker distinct from the sampling
//! thread - it never competes with live capture.

use suburi_kinematics::{Integration, IntegratorConfig, integrate, integrate_swing};
use suburi_model::{InertialSample, MotionSegment, ZuptPeriod};
use suburi_motion::{SegmentationConfig, detect_swings, detect_zupt};

/// Everything derived from one session's samples
#[derive(Debug)]
pub struct SessionAnalysis {
    pub swings: Vec<MotionSegment>,
    pub zupt_periods: Vec<ZuptPeriod>,
    /// Whole-session trajectory with ZUPT drift correction
    pub session_kinematics: Integration,
    /// Per-swing isolated integrations, index-aligned with `swings`
    pub swing_kinematics: Vec<Integration>,
}

/// Run segmentation and integration over a complete sample sequence
pub fn analyze(
    samples: &[InertialSample],
    segmentation: &SegmentationConfig,
    integrator: &IntegratorConfig,
) -> SessionAnalysis {
    let swings = detect_swings(samples, segmentation);
    let zupt_periods = detect_zupt(samples, segmentation);

    let session_kinematics = integrate(samples, &zupt_periods, integrator);
    let swing_kinematics = swings
        .iter()
        .map(|swing| integrate_swing(samples, swing, integrator))
        .collect();

    SessionAnalysis {
        swings,
        zupt_periods,
        session_kinematics,
        swing_kinematics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use suburi_model::Vec3;

    fn sample(i: usize, mag: f32) -> InertialSample {
        InertialSample::new(
            i as i64 * 10_000_000,
            i as i64,
            Vec3::new(mag, 0.0, 0.0),
            Vec3::ZERO,
            Vec3::new(mag, 0.0, 9.81),
        )
    }

    #[test]
    fn analysis_ties_engines_together() {
        // Stillness, one swing, stillness
        let mut samples: Vec<InertialSample> = (0..30).map(|i| sample(i, 0.3)).collect();
        samples.extend((30..60).map(|i| sample(i, 10.0)));
        samples.extend((60..120).map(|i| sample(i, 0.3)));

        let analysis = analyze(
            &samples,
            &SegmentationConfig::default(),
            &IntegratorConfig::default(),
        );

        assert_eq!(analysis.swings.len(), 1);
        assert!(analysis.swings[0].ended_in_stillness);
        assert_eq!(analysis.swing_kinematics.len(), analysis.swings.len());
        assert_eq!(analysis.session_kinematics.points.len(), samples.len());
        // The trailing stillness anchors at least one ZUPT reset
        assert!(!analysis.session_kinematics.zupt_resets.is_empty());
    }
}
