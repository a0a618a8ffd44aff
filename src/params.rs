//! Fixed heuristics of the detection pipeline, grouped in one place.
//!
//! Every tunable constant (band conventions, spectral-index thresholds,
//! fusion weights, threshold clamp, render ratios) lives here so the
//! heuristic surface is explicit and testable in isolation. Band indices
//! follow the Sentinel-2 stack ordering by default but are plain fields;
//! callers working with a different sensor convention override them
//! instead of patching the stages.

/// Parameters controlling every stage of the detection pipeline
#[derive(Debug, Clone)]
pub struct DetectionParams {
    /// 0-based band indices selected as (R, G, B) when the stack has
    /// at least `rgb_bands.0 + 1` bands (Sentinel-2: B4, B3, B2)
    pub rgb_bands: (usize, usize, usize),
    /// 0-based NIR band index for NDVI/NDWI (Sentinel-2: B8)
    pub nir_band: usize,
    /// 0-based red band index for NDVI (Sentinel-2: B4)
    pub red_band: usize,
    /// 0-based green band index for NDWI (Sentinel-2: B3)
    pub green_band: usize,
    /// Minimum band count for the land-cover heuristic; below this the
    /// whole scene falls back to urban/other
    pub landcover_min_bands: usize,
    /// NDWI above this is water
    pub ndwi_water: f32,
    /// NDVI above this (and not water) is forest
    pub ndvi_forest: f32,
    /// NDVI above this (and not water or forest) is agriculture
    pub ndvi_agriculture: f32,
    /// Weight of the mean absolute intensity difference in the fused score
    pub diff_weight: f32,
    /// Weight of the structural dissimilarity in the fused score
    pub ssim_weight: f32,
    /// Side length of the SSIM window (odd)
    pub ssim_window: usize,
    /// Score percentile used for the threshold suggestion
    pub threshold_percentile: f64,
    /// Closed clamp interval for the suggested threshold
    pub threshold_clamp: (f32, f32),
    /// Blend of (base, red) applied to anomalous pixels in the overlay
    pub overlay_blend: (f32, f32),
    /// Epsilon guarding every normalization denominator
    pub epsilon: f32,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            rgb_bands: (3, 2, 1),        // B4, B3, B2
            nir_band: 7,                 // B8
            red_band: 3,                 // B4
            green_band: 2,               // B3
            landcover_min_bands: 8,
            ndwi_water: 0.20,
            ndvi_forest: 0.60,
            ndvi_agriculture: 0.30,
            diff_weight: 0.6,
            ssim_weight: 0.4,
            ssim_window: 7,
            threshold_percentile: 90.0,  // p95 flags too little
            threshold_clamp: (0.35, 0.85),
            overlay_blend: (0.65, 0.35),
            epsilon: 1e-6,
        }
    }
}
