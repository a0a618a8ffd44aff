use crate::core::stats::percentile;
use crate::types::{ChangeError, ChangeResult, MultiBandImage};
use gdal::raster::ResampleAlg;
use gdal::Dataset;
use ndarray::{s, Array2, Array3};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::path::Path;

/// Multi-band raster reader
///
/// Reads every band of a geospatial raster, brings all bands onto the
/// finest grid present in the file, and robust-normalizes each band
/// independently so downstream stages see reflectance-like [0,1] data.
pub struct RasterReader;

impl RasterReader {
    /// Read a multi-band raster into an H x W x C stack in [0,1].
    ///
    /// The target grid is the maximum band width/height in the file (for a
    /// Sentinel-2 stack, the 10 m grid); coarser bands are upsampled onto
    /// it with bilinear interpolation at read time.
    pub fn read_multiband<P: AsRef<Path>>(path: P) -> ChangeResult<MultiBandImage> {
        log::info!("Reading raster: {}", path.as_ref().display());

        let dataset = Dataset::open(path.as_ref())?;
        let band_count = dataset.raster_count();
        if band_count == 0 {
            return Err(ChangeError::InvalidFormat(format!(
                "raster {} contains no bands",
                path.as_ref().display()
            )));
        }

        // Finest grid across the file; band sizes can differ from the
        // dataset size in some multi-resolution containers.
        let (mut max_w, mut max_h) = dataset.raster_size();
        for b in 1..=band_count {
            let (w, h) = dataset.rasterband(b)?.size();
            max_w = max_w.max(w);
            max_h = max_h.max(h);
        }
        log::debug!("Target grid: {}x{} over {} band(s)", max_w, max_h, band_count);

        let mut stack = Array3::<f32>::zeros((max_h, max_w, band_count as usize));
        for b in 1..=band_count {
            let band = dataset.rasterband(b)?;
            let (w, h) = band.size();
            let resample = if (w, h) != (max_w, max_h) {
                log::debug!("Resampling band {} from {}x{} to {}x{}", b, w, h, max_w, max_h);
                Some(ResampleAlg::Bilinear)
            } else {
                None
            };
            let buffer = band.read_as::<f32>((0, 0), (w, h), (max_w, max_h), resample)?;
            let band_arr = Array2::from_shape_vec((max_h, max_w), buffer.data)
                .map_err(|e| ChangeError::Processing(format!("Failed to reshape band {}: {}", b, e)))?;
            stack
                .slice_mut(s![.., .., (b - 1) as usize])
                .assign(&band_arr);
        }

        Ok(Self::normalize_bands(stack, 1e-6))
    }

    /// Robust per-band normalization: the 2nd percentile maps to 0 and the
    /// 98th to 1, with an epsilon-guarded denominator and a final clip to
    /// [0,1]. A constant band has zero spread and comes out all-zero
    /// through the guard; that is deliberate, not an error.
    pub fn normalize_bands(stack: Array3<f32>, epsilon: f32) -> MultiBandImage {
        let (height, width, bands) = stack.dim();

        #[cfg(feature = "parallel")]
        let normalized: Vec<Array2<f32>> = (0..bands)
            .into_par_iter()
            .map(|c| Self::normalize_band(&stack, c, epsilon))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let normalized: Vec<Array2<f32>> = (0..bands)
            .map(|c| Self::normalize_band(&stack, c, epsilon))
            .collect();

        let mut out = Array3::<f32>::zeros((height, width, bands));
        for (c, band) in normalized.into_iter().enumerate() {
            out.slice_mut(s![.., .., c]).assign(&band);
        }
        out
    }

    fn normalize_band(stack: &Array3<f32>, c: usize, epsilon: f32) -> Array2<f32> {
        let band = stack.slice(s![.., .., c]);
        let values: Vec<f32> = band.iter().cloned().collect();
        let lo = percentile(&values, 2.0);
        let hi = percentile(&values, 98.0);
        if hi - lo < epsilon {
            log::warn!("Band {} has zero dynamic range (p2 == p98 == {:.4})", c, lo);
        }
        let denom = hi - lo + epsilon;
        band.mapv(|v| ((v - lo) / denom).clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    #[test]
    fn test_normalize_stretches_to_unit_interval() {
        let stack = Array3::from_shape_fn((10, 10, 2), |(i, j, c)| {
            (i * 10 + j) as f32 * (c + 1) as f32
        });
        let out = RasterReader::normalize_bands(stack, 1e-6);
        for &v in out.iter() {
            assert!((0.0..=1.0).contains(&v));
        }
        // values below p2 clip to zero, above p98 clip to one
        assert_relative_eq!(out[[0, 0, 0]], 0.0);
        assert_relative_eq!(out[[9, 9, 0]], 1.0);
    }

    #[test]
    fn test_normalize_bands_independently() {
        let mut stack = Array3::zeros((4, 4, 2));
        for i in 0..4 {
            for j in 0..4 {
                stack[[i, j, 0]] = (i * 4 + j) as f32; // 0..15
                stack[[i, j, 1]] = (i * 4 + j) as f32 * 1000.0; // 0..15000
            }
        }
        let out = RasterReader::normalize_bands(stack, 1e-6);
        // both bands end up on the same relative scale
        assert_relative_eq!(out[[2, 0, 0]], out[[2, 0, 1]], epsilon = 1e-4);
    }

    #[test]
    fn test_constant_band_collapses_to_zero() {
        let stack = Array3::from_elem((6, 6, 1), 42.0);
        let out = RasterReader::normalize_bands(stack, 1e-6);
        for &v in out.iter() {
            assert_relative_eq!(v, 0.0);
        }
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let result = RasterReader::read_multiband("/nonexistent/scene.tif");
        assert!(matches!(result, Err(ChangeError::Gdal(_))));
    }
}
