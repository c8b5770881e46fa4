//! Acceleration → velocity → position integration

use suburi_model::{InertialSample, KinematicsPoint, MotionSegment, ZuptPeriod};

/// Numerical integration scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegrationMethod {
    /// Average of consecutive sample values × Δt
    #[default]
    Trapezoidal,
    /// Current sample value × Δt
    Rectangular,
}

/// Integrator configuration
#[derive(Debug, Clone, Default)]
pub struct IntegratorConfig {
    pub method: IntegrationMethod,

    /// Also zero position at ZUPT resets. Off by default: resetting
    /// position discards legitimate net displacement between anchors.
    pub reset_position: bool,
}

/// Result of an integration run
#[derive(Debug, Clone)]
pub struct Integration {
    /// One point per input sample, ordered by timestamp
    pub points: Vec<KinematicsPoint>,
    /// Sample indices where a ZUPT reset was applied
    pub zupt_resets: Vec<usize>,
    /// Velocity immediately before the most recent reset - the drift the
    /// anchor removed
    pub drift_at_last_reset: [f64; 3],
}

impl Integration {
    fn empty() -> Self {
        Self {
            points: Vec::new(),
            zupt_resets: Vec::new(),
            drift_at_last_reset: [0.0; 3],
        }
    }
}

/// Integrate a full session.
///
/// Velocity is zeroed at the first sample of each ZUPT period; samples
/// inside the same period do not reset again. The published point at a
/// reset index carries the zeroed velocity.
pub fn integrate(
    samples: &[InertialSample],
    zupt_periods: &[ZuptPeriod],
    config: &IntegratorConfig,
) -> Integration {
    integrate_range(samples, zupt_periods, config)
}

/// Integrate one swing segment in isolation.
///
/// Fresh zero initial conditions; timestamps are measured from the
/// segment's first sample. ZUPT anchors are irrelevant at this scale.
pub fn integrate_swing(
    samples: &[InertialSample],
    segment: &MotionSegment,
    config: &IntegratorConfig,
) -> Integration {
    let end = segment.end.min(samples.len().saturating_sub(1));
    if segment.start > end {
        return Integration::empty();
    }
    integrate_range(&samples[segment.start..=end], &[], config)
}

fn integrate_range(
    samples: &[InertialSample],
    zupt_periods: &[ZuptPeriod],
    config: &IntegratorConfig,
) -> Integration {
    if samples.is_empty() {
        return Integration::empty();
    }

    let t0 = samples[0].timestamp_ns;
    let mut points = Vec::with_capacity(samples.len());
    let mut resets = Vec::new();
    let mut drift = [0.0f64; 3];

    let mut velocity = [0.0f64; 3];
    let mut position = [0.0f64; 3];
    let mut prev_accel = accel_f64(&samples[0]);

    for (i, sample) in samples.iter().enumerate() {
        let accel = accel_f64(sample);

        if i > 0 {
            let dt = (sample.timestamp_ns - samples[i - 1].timestamp_ns) as f64 / 1e9;
            let prev_velocity = velocity;

            match config.method {
                IntegrationMethod::Trapezoidal => {
                    for axis in 0..3 {
                        velocity[axis] += 0.5 * (prev_accel[axis] + accel[axis]) * dt;
                        position[axis] += 0.5 * (prev_velocity[axis] + velocity[axis]) * dt;
                    }
                }
                IntegrationMethod::Rectangular => {
                    for axis in 0..3 {
                        velocity[axis] += accel[axis] * dt;
                        position[axis] += velocity[axis] * dt;
                    }
                }
            }
        }

        // Only the start boundary of a period anchors; interior samples
        // must not reset repeatedly.
        if starts_period(zupt_periods, i) {
            drift = velocity;
            velocity = [0.0; 3];
            if config.reset_position {
                position = [0.0; 3];
            }
            resets.push(i);
        }

        points.push(KinematicsPoint {
            t: (sample.timestamp_ns - t0) as f64 / 1e9,
            position,
            velocity,
            accel,
        });

        prev_accel = accel;
    }

    Integration {
        points,
        zupt_resets: resets,
        drift_at_last_reset: drift,
    }
}

fn starts_period(periods: &[ZuptPeriod], index: usize) -> bool {
    periods.iter().any(|p| p.start == index)
}

fn accel_f64(sample: &InertialSample) -> [f64; 3] {
    [
        sample.accel.x as f64,
        sample.accel.y as f64,
        sample.accel.z as f64,
    ]
}
