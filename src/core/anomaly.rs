use crate::core::composite::luminance;
use crate::params::DetectionParams;
use crate::types::{AnomalyScoreMap, ChangeError, ChangeResult, RgbComposite};
use ndarray::{Array2, Zip};

// SSIM stabilization constants for data_range = 1.0
const SSIM_K1: f32 = 0.01;
const SSIM_K2: f32 = 0.03;

/// Fused per-pixel anomaly score between two aligned composites.
///
/// Combines the mean absolute intensity difference with structural
/// dissimilarity (1 - SSIM over the luminance channels) at the configured
/// weights, then renormalizes the fused map to [0,1] by its own min/max.
/// A constant fused map (e.g. identical captures) collapses to all-zero
/// through the epsilon guard instead of dividing by zero.
pub fn anomaly_map(
    t0: &RgbComposite,
    t1: &RgbComposite,
    params: &DetectionParams,
) -> ChangeResult<AnomalyScoreMap> {
    let (h0, w0, c0) = t0.dim();
    let (h1, w1, c1) = t1.dim();
    if (h0, w0) != (h1, w1) || c0 != c1 {
        return Err(ChangeError::ShapeMismatch {
            context: "RGB composites",
            left: (h0, w0),
            right: (h1, w1),
        });
    }

    log::debug!("Scoring change over {}x{} composites", h0, w0);

    // mean absolute difference across the three channels
    let diff = Array2::from_shape_fn((h0, w0), |(i, j)| {
        let mut acc = 0.0;
        for c in 0..3 {
            acc += (t1[[i, j, c]] - t0[[i, j, c]]).abs();
        }
        acc / 3.0
    });

    let g0 = luminance(t0);
    let g1 = luminance(t1);
    let ssim = ssim_map(&g0, &g1, params.ssim_window);

    let mut score = Array2::zeros((h0, w0));
    Zip::from(&mut score)
        .and(&diff)
        .and(&ssim)
        .for_each(|s, &d, &sim| {
            *s = params.diff_weight * d + params.ssim_weight * (1.0 - sim);
        });

    // global renormalization to [0,1]
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in score.iter() {
        min = min.min(v);
        max = max.max(v);
    }
    if max - min < params.epsilon {
        log::warn!("Fused score map has zero dynamic range, output collapses to zero");
    }
    let denom = max - min + params.epsilon;
    score.mapv_inplace(|v| (v - min) / denom);

    Ok(score)
}

/// Full structural-similarity map between two luminance images.
///
/// Uniform window (clamped at the borders), unbiased variance/covariance,
/// data range fixed to 1.0 since inputs are normalized reflectances.
/// Values are in [-1, 1] per pixel.
pub fn ssim_map(g0: &Array2<f32>, g1: &Array2<f32>, window: usize) -> Array2<f32> {
    let (height, width) = g0.dim();
    let half = window / 2;
    let c1 = SSIM_K1 * SSIM_K1;
    let c2 = SSIM_K2 * SSIM_K2;

    let mut out = Array2::zeros((height, width));

    #[cfg(feature = "parallel")]
    Zip::indexed(&mut out).par_for_each(|(i, j), v| {
        *v = ssim_at(g0, g1, i, j, half, c1, c2);
    });

    #[cfg(not(feature = "parallel"))]
    Zip::indexed(&mut out).for_each(|(i, j), v| {
        *v = ssim_at(g0, g1, i, j, half, c1, c2);
    });

    out
}

fn ssim_at(
    g0: &Array2<f32>,
    g1: &Array2<f32>,
    i: usize,
    j: usize,
    half: usize,
    c1: f32,
    c2: f32,
) -> f32 {
    let (height, width) = g0.dim();
    let i0 = i.saturating_sub(half);
    let i1 = (i + half + 1).min(height);
    let j0 = j.saturating_sub(half);
    let j1 = (j + half + 1).min(width);

    let mut sum_x = 0.0f64;
    let mut sum_y = 0.0f64;
    let mut sum_xx = 0.0f64;
    let mut sum_yy = 0.0f64;
    let mut sum_xy = 0.0f64;
    let n = ((i1 - i0) * (j1 - j0)) as f64;

    for wi in i0..i1 {
        for wj in j0..j1 {
            let x = g0[[wi, wj]] as f64;
            let y = g1[[wi, wj]] as f64;
            sum_x += x;
            sum_y += y;
            sum_xx += x * x;
            sum_yy += y * y;
            sum_xy += x * y;
        }
    }

    let mean_x = sum_x / n;
    let mean_y = sum_y / n;
    // unbiased (sample) estimates, like the reference SSIM formulation
    let (var_x, var_y, cov) = if n > 1.0 {
        (
            (sum_xx - n * mean_x * mean_x) / (n - 1.0),
            (sum_yy - n * mean_y * mean_y) / (n - 1.0),
            (sum_xy - n * mean_x * mean_y) / (n - 1.0),
        )
    } else {
        (0.0, 0.0, 0.0)
    };

    let c1 = c1 as f64;
    let c2 = c2 as f64;
    let num = (2.0 * mean_x * mean_y + c1) * (2.0 * cov + c2);
    let den = (mean_x * mean_x + mean_y * mean_y + c1) * (var_x + var_y + c2);
    (num / den) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    fn uniform_rgb(h: usize, w: usize, value: f32) -> RgbComposite {
        Array3::from_elem((h, w, 3), value)
    }

    #[test]
    fn test_identical_inputs_collapse_to_zero() {
        let t0 = Array3::from_shape_fn((20, 20, 3), |(i, j, c)| {
            ((i * 31 + j * 17 + c * 7) % 10) as f32 / 10.0
        });
        let score = anomaly_map(&t0, &t0.clone(), &DetectionParams::default()).unwrap();
        for &v in score.iter() {
            assert_relative_eq!(v, 0.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_score_spans_unit_range() {
        let t0 = uniform_rgb(16, 16, 0.2);
        let mut t1 = uniform_rgb(16, 16, 0.2);
        // change one corner region
        for i in 0..4 {
            for j in 0..4 {
                t1[[i, j, 0]] = 1.0;
            }
        }
        let score = anomaly_map(&t0, &t1, &DetectionParams::default()).unwrap();
        let min = score.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = score.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        assert_relative_eq!(min, 0.0, epsilon = 1e-5);
        assert_relative_eq!(max, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_changed_region_scores_higher() {
        let t0 = uniform_rgb(30, 30, 0.3);
        let mut t1 = uniform_rgb(30, 30, 0.3);
        for i in 10..20 {
            for j in 10..20 {
                t1[[i, j, 0]] = 1.0;
            }
        }
        let score = anomaly_map(&t0, &t1, &DetectionParams::default()).unwrap();
        // interior of the changed block vs a pixel far outside it
        assert!(score[[15, 15]] > score[[2, 2]]);
        assert!(score[[2, 2]] < 1e-3);
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let t0 = uniform_rgb(10, 10, 0.5);
        let t1 = uniform_rgb(10, 12, 0.5);
        let err = anomaly_map(&t0, &t1, &DetectionParams::default()).unwrap_err();
        assert!(matches!(err, ChangeError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_ssim_is_one_for_identical_structured_input() {
        let g = Array2::from_shape_fn((12, 12), |(i, j)| ((i + j) % 5) as f32 / 5.0);
        let sim = ssim_map(&g, &g.clone(), 7);
        for &v in sim.iter() {
            assert_relative_eq!(v, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_ssim_penalizes_mean_shift() {
        let g0 = Array2::from_elem((12, 12), 0.2);
        let g1 = Array2::from_elem((12, 12), 0.8);
        let sim = ssim_map(&g0, &g1, 7);
        assert!(sim[[6, 6]] < 0.9);
    }
}
