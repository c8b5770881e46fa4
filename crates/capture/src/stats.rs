//! Rate-quality statistics
//!
//! Computed once per session, synchronously, before upload. Degenerate
//! inputs (no samples, zero duration) yield `None` rather than NaN or
//! infinity - the protocol's documented backward-compatible optional path.

use suburi_model::RateStats;

/// Compute per-session rate statistics from all sample timestamps.
///
/// `timestamps_ns` need not arrive sorted (chunks may be scanned in any
/// order); `sequences` are the per-sample counters used to derive the
/// dropped-sample percentage.
pub fn compute_rate_stats(timestamps_ns: &[i64], sequences: &[i64]) -> Option<RateStats> {
    if timestamps_ns.is_empty() {
        return None;
    }

    let mut sorted = timestamps_ns.to_vec();
    sorted.sort_unstable();

    let first = *sorted.first()?;
    let last = *sorted.last()?;
    let duration_ms = (last - first) as f64 / 1e6;
    if duration_ms <= 0.0 {
        return None;
    }

    let samples_total = sorted.len() as i64;
    let mean_hz = samples_total as f64 / (duration_ms / 1000.0);

    let mut deltas_ms: Vec<f64> = sorted
        .windows(2)
        .map(|pair| (pair[1] - pair[0]) as f64 / 1e6)
        .collect();
    deltas_ms.sort_by(|a, b| a.partial_cmp(b).expect("deltas are finite"));

    Some(RateStats {
        samples_total,
        duration_ms,
        mean_hz,
        dt_ms_p50: percentile(&deltas_ms, 50.0),
        dt_ms_p95: percentile(&deltas_ms, 95.0),
        dt_ms_max: *deltas_ms.last().expect("at least one delta"),
        dropped_seq_pct: dropped_pct(sequences),
    })
}

/// Nearest-rank percentile over a sorted slice
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = ((sorted.len() - 1) as f64 * p / 100.0).round() as usize;
    sorted[rank]
}

/// Percentage of samples lost, from gaps in the sequence counter
fn dropped_pct(sequences: &[i64]) -> Option<f64> {
    if sequences.len() < 2 {
        return None;
    }

    let first = *sequences.iter().min()?;
    let last = *sequences.iter().max()?;
    let expected = last - first + 1;
    if expected <= 0 {
        return None;
    }

    let dropped = expected - sequences.len() as i64;
    Some(dropped.max(0) as f64 / expected as f64 * 100.0)
}
