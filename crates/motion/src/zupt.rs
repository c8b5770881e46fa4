//! ZUPT (zero-velocity update) period detection
//!
//! A period opens when energy drops below the stillness threshold and, when
//! the variance gate is enabled, the energy variance over the trailing
//! window is also low. It closes on the first sample failing either test.
//! Variance is population variance (divide by N) over the trailing window,
//! computed over however many samples exist early in the series.

use suburi_model::{InertialSample, ZuptPeriod};

use crate::config::SegmentationConfig;
use crate::energy::energies;

/// Detect stillness periods in a complete sample sequence.
///
/// Returned periods never overlap, each lasts at least
/// `min_zupt_duration_s`, and a period running to the end of the input is
/// emitted rather than truncated away.
pub fn detect_zupt(samples: &[InertialSample], config: &SegmentationConfig) -> Vec<ZuptPeriod> {
    if samples.len() < config.min_samples {
        return Vec::new();
    }

    let energy = energies(samples, config);
    let mut periods = Vec::new();
    let mut open: Option<usize> = None;

    for i in 0..samples.len() {
        let still = energy[i] < config.zupt_threshold
            && (!config.zupt_variance_check
                || trailing_variance(&energy, i, config.zupt_variance_window)
                    < config.zupt_variance_threshold);

        match (still, open) {
            (true, None) => open = Some(i),
            (false, Some(start)) => {
                push_if_long_enough(&mut periods, samples, &energy, start, i - 1, config);
                open = None;
            }
            _ => {}
        }
    }

    if let Some(start) = open {
        push_if_long_enough(&mut periods, samples, &energy, start, samples.len() - 1, config);
    }

    periods
}

fn push_if_long_enough(
    periods: &mut Vec<ZuptPeriod>,
    samples: &[InertialSample],
    energy: &[f32],
    start: usize,
    end: usize,
    config: &SegmentationConfig,
) {
    let duration_s = (samples[end].timestamp_ns - samples[start].timestamp_ns) as f32 / 1e9;
    if duration_s < config.min_zupt_duration_s {
        return;
    }

    let mean_energy = energy[start..=end].iter().sum::<f32>() / (end - start + 1) as f32;

    periods.push(ZuptPeriod {
        start,
        end,
        mean_energy,
        duration_s,
    });
}

/// Population variance of the trailing window ending at `i` (inclusive).
fn trailing_variance(energy: &[f32], i: usize, window: usize) -> f32 {
    let from = (i + 1).saturating_sub(window);
    let slice = &energy[from..=i];

    let n = slice.len() as f32;
    let mean = slice.iter().sum::<f32>() / n;
    slice.iter().map(|e| (e - mean) * (e - mean)).sum::<f32>() / n
}
