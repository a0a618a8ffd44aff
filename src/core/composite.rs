use crate::params::DetectionParams;
use crate::types::{MultiBandImage, RgbComposite};
use ndarray::Array3;

/// Derive a true-color composite from a full band stack.
///
/// With enough bands the configured (R, G, B) indices are selected
/// (Sentinel-2 convention: B4/B3/B2 at 0-based 3/2/1). A 3-band stack is
/// taken in order, and a 1-2 band stack is replicated into grayscale.
/// Output is clipped to [0,1].
pub fn rgb_composite(img: &MultiBandImage, params: &DetectionParams) -> RgbComposite {
    let (height, width, bands) = img.dim();
    let (r, g, b) = params.rgb_bands;

    let channels: [usize; 3] = if bands > r.max(g).max(b) {
        [r, g, b]
    } else if bands >= 3 {
        [0, 1, 2]
    } else {
        log::debug!("Only {} band(s) available, replicating band 0 as grayscale", bands);
        [0, 0, 0]
    };

    let mut rgb = Array3::zeros((height, width, 3));
    for (out_c, &src_c) in channels.iter().enumerate() {
        for i in 0..height {
            for j in 0..width {
                rgb[[i, j, out_c]] = img[[i, j, src_c]].clamp(0.0, 1.0);
            }
        }
    }
    rgb
}

/// Collapse an RGB composite to a single-channel luminance proxy
/// (per-pixel channel mean).
pub fn luminance(rgb: &RgbComposite) -> ndarray::Array2<f32> {
    let (height, width, _) = rgb.dim();
    ndarray::Array2::from_shape_fn((height, width), |(i, j)| {
        (rgb[[i, j, 0]] + rgb[[i, j, 1]] + rgb[[i, j, 2]]) / 3.0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    fn stack_with_band_values(bands: usize, values: &[f32]) -> MultiBandImage {
        Array3::from_shape_fn((4, 5, bands), |(_, _, c)| values[c])
    }

    #[test]
    fn test_sentinel2_band_selection() {
        let img = stack_with_band_values(8, &[0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7]);
        let rgb = rgb_composite(&img, &DetectionParams::default());
        assert_eq!(rgb.dim(), (4, 5, 3));
        // R,G,B = bands 3,2,1
        assert_relative_eq!(rgb[[0, 0, 0]], 0.3);
        assert_relative_eq!(rgb[[0, 0, 1]], 0.2);
        assert_relative_eq!(rgb[[0, 0, 2]], 0.1);
    }

    #[test]
    fn test_three_band_stack_taken_in_order() {
        let img = stack_with_band_values(3, &[0.1, 0.2, 0.3]);
        let rgb = rgb_composite(&img, &DetectionParams::default());
        assert_relative_eq!(rgb[[1, 1, 0]], 0.1);
        assert_relative_eq!(rgb[[1, 1, 1]], 0.2);
        assert_relative_eq!(rgb[[1, 1, 2]], 0.3);
    }

    #[test]
    fn test_grayscale_fallback() {
        let img = stack_with_band_values(1, &[0.42]);
        let rgb = rgb_composite(&img, &DetectionParams::default());
        for c in 0..3 {
            assert_relative_eq!(rgb[[2, 3, c]], 0.42);
        }
    }

    #[test]
    fn test_output_is_clipped() {
        let img = stack_with_band_values(3, &[-0.5, 1.5, 0.5]);
        let rgb = rgb_composite(&img, &DetectionParams::default());
        assert_relative_eq!(rgb[[0, 0, 0]], 0.0);
        assert_relative_eq!(rgb[[0, 0, 1]], 1.0);
        assert_relative_eq!(rgb[[0, 0, 2]], 0.5);
    }

    #[test]
    fn test_luminance_is_channel_mean() {
        let img = stack_with_band_values(3, &[0.3, 0.6, 0.9]);
        let rgb = rgb_composite(&img, &DetectionParams::default());
        let lum = luminance(&rgb);
        assert_eq!(lum.dim(), (4, 5));
        assert_relative_eq!(lum[[0, 0]], 0.6, epsilon = 1e-6);
    }
}
