//! Tests for rate-quality statistics

use crate::stats::compute_rate_stats;

/// n timestamps spaced `dt_ms` apart, starting at zero
fn uniform_ns(n: usize, dt_ms: i64) -> Vec<i64> {
    (0..n as i64).map(|i| i * dt_ms * 1_000_000).collect()
}

#[test]
fn test_uniform_100hz_input() {
    let timestamps = uniform_ns(10_000, 10);
    let sequences: Vec<i64> = (0..10_000).collect();

    let stats = compute_rate_stats(&timestamps, &sequences).unwrap();
    assert_eq!(stats.samples_total, 10_000);
    // 10_000 samples over 99.99 s
    assert!((stats.mean_hz - 100.0).abs() < 0.02);
    assert!((stats.dt_ms_p50 - 10.0).abs() < 1e-9);
    assert!((stats.dt_ms_p95 - 10.0).abs() < 1e-9);
    assert!((stats.dt_ms_max - 10.0).abs() < 1e-9);
    assert_eq!(stats.dropped_seq_pct, Some(0.0));
}

#[test]
fn test_three_samples_exact_formula() {
    // t = 0, 10, 20 ms: duration 20 ms, and 3 samples over 0.020 s is
    // 150 Hz by the formula - not the nominal 100
    let timestamps = uniform_ns(3, 10);
    let sequences = vec![0, 1, 2];

    let stats = compute_rate_stats(&timestamps, &sequences).unwrap();
    assert_eq!(stats.samples_total, 3);
    assert!((stats.duration_ms - 20.0).abs() < 1e-9);
    assert!((stats.mean_hz - 150.0).abs() < 1e-9);
    assert!((stats.dt_ms_p50 - 10.0).abs() < 1e-9);
}

#[test]
fn test_degenerate_inputs_yield_none() {
    // No samples
    assert!(compute_rate_stats(&[], &[]).is_none());
    // One sample: zero duration
    assert!(compute_rate_stats(&[5_000_000], &[0]).is_none());
    // All identical timestamps: zero duration
    assert!(compute_rate_stats(&[7, 7, 7], &[0, 1, 2]).is_none());
}

#[test]
fn test_unsorted_input_is_sorted_first() {
    let timestamps = vec![20_000_000, 0, 10_000_000];
    let stats = compute_rate_stats(&timestamps, &[0, 1, 2]).unwrap();
    assert!((stats.duration_ms - 20.0).abs() < 1e-9);
    assert!((stats.dt_ms_max - 10.0).abs() < 1e-9);
}

#[test]
fn test_jitter_percentiles() {
    // Mostly 10 ms deltas with one 50 ms stall
    let mut timestamps = uniform_ns(100, 10);
    for t in timestamps.iter_mut().skip(50) {
        *t += 40_000_000;
    }

    let stats = compute_rate_stats(&timestamps, &(0..100).collect::<Vec<_>>()).unwrap();
    assert!((stats.dt_ms_p50 - 10.0).abs() < 1e-9);
    assert!((stats.dt_ms_max - 50.0).abs() < 1e-9);
}

#[test]
fn test_dropped_sequence_percentage() {
    // Sequences 0..=9 with 2 missing: 20% dropped
    let sequences = vec![0, 1, 2, 3, 5, 6, 8, 9];
    let timestamps = uniform_ns(8, 10);

    let stats = compute_rate_stats(&timestamps, &sequences).unwrap();
    assert!((stats.dropped_seq_pct.unwrap() - 20.0).abs() < 1e-9);
}
