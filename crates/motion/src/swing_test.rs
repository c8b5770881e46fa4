//! Tests for swing detection

use suburi_model::{InertialSample, Vec3};

use crate::config::SegmentationConfig;
use crate::swing::detect_swings;

/// Build samples at 10 ms spacing whose energy equals the given magnitudes
/// (acceleration only, so with default weights energy == magnitude).
fn samples_with_energy(mags: &[f32]) -> Vec<InertialSample> {
    mags.iter()
        .enumerate()
        .map(|(i, &m)| {
            InertialSample::new(
                i as i64 * 10_000_000,
                i as i64,
                Vec3::new(m, 0.0, 0.0),
                Vec3::ZERO,
                Vec3::ZERO,
            )
        })
        .collect()
}

#[test]
fn test_degenerate_input_returns_empty() {
    let config = SegmentationConfig::default();
    let samples = samples_with_energy(&[10.0; 5]);
    assert!(detect_swings(&samples, &config).is_empty());
}

#[test]
fn test_short_transient_discarded() {
    let config = SegmentationConfig::default();
    // 5 hot samples span 40 ms, well under the 150 ms minimum
    let mut mags = vec![0.5; 20];
    mags.extend_from_slice(&[10.0; 5]);
    mags.extend(vec![0.5; 20]);

    assert!(detect_swings(&samples_with_energy(&mags), &config).is_empty());
}

#[test]
fn test_swing_detected_with_peak_and_stillness() {
    let config = SegmentationConfig::default();
    let mut mags = vec![0.5; 10];
    mags.extend_from_slice(&[9.0; 10]);
    mags.push(14.0);
    mags.extend_from_slice(&[9.0; 10]);
    mags.extend(vec![0.5; 30]);

    let swings = detect_swings(&samples_with_energy(&mags), &config);
    assert_eq!(swings.len(), 1);

    let swing = &swings[0];
    assert_eq!(swing.start, 10);
    assert_eq!(swing.end, 30);
    assert_eq!(swing.peak_energy, 14.0);
    assert!(swing.ended_in_stillness);
    assert!(swing.duration_s >= config.min_swing_duration_s);
}

#[test]
fn test_hysteresis_band_does_not_chatter() {
    let config = SegmentationConfig::default();
    // Energy dips into the band between end (3.0) and start (8.0)
    // thresholds mid-swing; the machine must stay in `swinging`.
    let mut mags = vec![0.5; 10];
    mags.extend_from_slice(&[10.0; 10]);
    mags.extend_from_slice(&[5.0; 10]);
    mags.extend_from_slice(&[10.0; 10]);
    mags.extend(vec![0.5; 30]);

    let swings = detect_swings(&samples_with_energy(&mags), &config);
    assert_eq!(swings.len(), 1);
    assert_eq!(swings[0].start, 10);
    assert_eq!(swings[0].end, 39);
}

#[test]
fn test_lookahead_does_not_consume_scan_position() {
    let config = SegmentationConfig::default();
    // Second swing starts 5 samples after the first ends - inside the first
    // swing's 20-sample look-ahead window. Both must still be found.
    let mut mags = vec![0.5; 10];
    mags.extend_from_slice(&[10.0; 20]);
    mags.extend_from_slice(&[0.5; 5]);
    mags.extend_from_slice(&[10.0; 20]);
    mags.extend(vec![0.5; 30]);

    let swings = detect_swings(&samples_with_energy(&mags), &config);
    assert_eq!(swings.len(), 2);
    assert_eq!(swings[0].start, 10);
    assert_eq!(swings[1].start, 35);
    // The gap is 5/20 still samples in a window that also sees the second
    // swing, so the first swing did not end in stillness.
    assert!(!swings[0].ended_in_stillness);
}

#[test]
fn test_trailing_swing_emitted_without_stillness_mark() {
    let config = SegmentationConfig::default();
    let mut mags = vec![0.5; 10];
    mags.extend_from_slice(&[10.0; 30]);

    let swings = detect_swings(&samples_with_energy(&mags), &config);
    assert_eq!(swings.len(), 1);
    assert_eq!(swings[0].end, 39);
    assert!(!swings[0].ended_in_stillness);
}

#[test]
fn test_no_segment_shorter_than_minimum() {
    let config = SegmentationConfig::default();
    // Mixed bursts of varying lengths; the invariant holds for all output
    let mut mags = Vec::new();
    for burst in [3usize, 8, 20, 2, 40] {
        mags.extend(vec![0.5; 15]);
        mags.extend(vec![12.0; burst]);
    }
    mags.extend(vec![0.5; 15]);

    for swing in detect_swings(&samples_with_energy(&mags), &config) {
        assert!(swing.duration_s >= config.min_swing_duration_s);
    }
}
