use crate::params::DetectionParams;
use crate::types::{LandCoverClass, LandCoverMap, MultiBandImage};
use ndarray::Array2;

/// Training-free land-cover heuristic over NDVI and NDWI.
///
/// This is intentionally coarse routing, not a substitute for supervised
/// classification: fixed spectral-index thresholds assign each pixel to
/// water, forest, agriculture, or the urban/other remainder. The stack must
/// carry at least `landcover_min_bands` bands (NIR is expected at the
/// configured index, Sentinel-2's B8 by default); a shallower stack falls
/// back to an all-urban map rather than failing, so a 7-band scene behaves
/// completely differently from an 8-band one. That discontinuity is part of
/// the heuristic's contract.
pub fn classify_landcover(img: &MultiBandImage, params: &DetectionParams) -> LandCoverMap {
    let (height, width, bands) = img.dim();
    let mut lc = Array2::<u8>::zeros((height, width));

    if bands < params.landcover_min_bands {
        log::warn!(
            "Land-cover heuristic needs >= {} bands, got {}; labeling whole scene urban/other",
            params.landcover_min_bands,
            bands
        );
        return lc;
    }

    log::debug!(
        "Classifying land cover: NIR=band {}, red=band {}, green=band {}",
        params.nir_band,
        params.red_band,
        params.green_band
    );

    let eps = params.epsilon;
    for i in 0..height {
        for j in 0..width {
            let red = img[[i, j, params.red_band]];
            let green = img[[i, j, params.green_band]];
            let nir = img[[i, j, params.nir_band]];

            let ndvi = (nir - red) / (nir + red + eps);
            let ndwi = (green - nir) / (green + nir + eps);

            // water claims first, then forest, then agriculture
            lc[[i, j]] = if ndwi > params.ndwi_water {
                LandCoverClass::Water.label()
            } else if ndvi > params.ndvi_forest {
                LandCoverClass::Forest.label()
            } else if ndvi > params.ndvi_agriculture {
                LandCoverClass::Agriculture.label()
            } else {
                LandCoverClass::Urban.label()
            };
        }
    }

    lc
}
