//! Small statistics helpers shared by band normalization and the
//! threshold/metrics engine.

/// Percentile of a sample via linear interpolation between closest ranks.
///
/// `q` is in percent (0..=100). Matches numpy's default `percentile`
/// behavior so normalization and thresholds reproduce values computed with
/// the common scientific stacks. Returns 0.0 for an empty sample.
pub fn percentile(values: &[f32], q: f64) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted: Vec<f32> = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = (q / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = (rank - lo as f64) as f32;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Mean of a sample, 0.0 when empty.
pub fn mean(values: &[f32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
}
