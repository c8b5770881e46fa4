//! Swing detection
//!
//! A 2-state machine (`idle`, `swinging`) over the motion-energy series.
//! Entry uses the start threshold, exit the lower end threshold; candidates
//! shorter than the minimum duration are transients and dropped without
//! comment. After each accepted exit, a bounded look-ahead window decides
//! whether the swing settled into stillness - the look-ahead reads past the
//! scan position but never moves it.

use suburi_model::{InertialSample, MotionSegment};

use crate::config::SegmentationConfig;
use crate::energy::energies;

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Idle,
    Swinging,
}

/// Detect swing segments in a complete sample sequence.
///
/// Runs once over the full series. Returns segments ordered by start index;
/// every returned segment lasts at least `min_swing_duration_s`.
pub fn detect_swings(samples: &[InertialSample], config: &SegmentationConfig) -> Vec<MotionSegment> {
    if samples.len() < config.min_samples {
        return Vec::new();
    }

    let energy = energies(samples, config);
    let mut segments = Vec::new();

    let mut state = State::Idle;
    let mut start = 0usize;
    let mut peak = 0.0f32;

    for i in 0..samples.len() {
        match state {
            State::Idle => {
                if energy[i] > config.swing_start_threshold {
                    state = State::Swinging;
                    start = i;
                    peak = energy[i];
                }
            }
            State::Swinging => {
                if energy[i] < config.swing_end_threshold {
                    // Swing ended at the previous sample
                    let end = i - 1;
                    push_if_long_enough(
                        &mut segments,
                        samples,
                        &energy,
                        start,
                        end,
                        peak,
                        i,
                        config,
                    );
                    state = State::Idle;
                } else {
                    peak = peak.max(energy[i]);
                }
            }
        }
    }

    // A swing still open at end-of-input closes on the last sample. There
    // is nothing to look ahead into, so it cannot be marked as ended in
    // stillness.
    if state == State::Swinging {
        let end = samples.len() - 1;
        push_if_long_enough(
            &mut segments,
            samples,
            &energy,
            start,
            end,
            peak,
            samples.len(),
            config,
        );
    }

    segments
}

#[allow(clippy::too_many_arguments)]
fn push_if_long_enough(
    segments: &mut Vec<MotionSegment>,
    samples: &[InertialSample],
    energy: &[f32],
    start: usize,
    end: usize,
    peak: f32,
    lookahead_from: usize,
    config: &SegmentationConfig,
) {
    let duration_s =
        (samples[end].timestamp_ns - samples[start].timestamp_ns) as f32 / 1e9;
    if duration_s < config.min_swing_duration_s {
        return;
    }

    segments.push(MotionSegment {
        start,
        end,
        peak_energy: peak,
        duration_s,
        ended_in_stillness: lookahead_is_still(energy, lookahead_from, config),
    });
}

/// Inspect up to `stillness_lookahead` samples starting at `from` without
/// consuming them. An empty window is not stillness.
fn lookahead_is_still(energy: &[f32], from: usize, config: &SegmentationConfig) -> bool {
    let window = &energy[from.min(energy.len())..(from + config.stillness_lookahead).min(energy.len())];
    if window.is_empty() {
        return false;
    }

    let still = window
        .iter()
        .filter(|&&e| e < config.zupt_threshold)
        .count();
    still as f32 / window.len() as f32 > config.stillness_fraction
}
