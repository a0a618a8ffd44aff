use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Full band stack of one capture, height x width x band-count, in [0,1]
pub type MultiBandImage = Array3<f32>;

/// True-color composite, height x width x 3, in [0,1]
pub type RgbComposite = Array3<f32>;

/// Per-pixel land-cover labels (see [`LandCoverClass`])
pub type LandCoverMap = Array2<u8>;

/// Fused, globally renormalized change intensity in [0,1]
pub type AnomalyScoreMap = Array2<f32>;

/// Heuristic land-cover categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LandCoverClass {
    Urban,
    Agriculture,
    Forest,
    Water,
}

impl LandCoverClass {
    /// All classes in label order
    pub const ALL: [LandCoverClass; 4] = [
        LandCoverClass::Urban,
        LandCoverClass::Agriculture,
        LandCoverClass::Forest,
        LandCoverClass::Water,
    ];

    /// Integer label stored in a [`LandCoverMap`]
    pub fn label(&self) -> u8 {
        match self {
            LandCoverClass::Urban => 0,
            LandCoverClass::Agriculture => 1,
            LandCoverClass::Forest => 2,
            LandCoverClass::Water => 3,
        }
    }

    /// Key used in metrics and the output record
    pub fn name(&self) -> &'static str {
        match self {
            LandCoverClass::Urban => "urban",
            LandCoverClass::Agriculture => "agriculture",
            LandCoverClass::Forest => "forest",
            LandCoverClass::Water => "water",
        }
    }

    /// RGB color used in the rendered land-cover map
    pub fn color(&self) -> [u8; 3] {
        match self {
            LandCoverClass::Urban => [160, 160, 160],      // gray
            LandCoverClass::Agriculture => [255, 215, 0],  // gold
            LandCoverClass::Forest => [34, 139, 34],       // green
            LandCoverClass::Water => [30, 144, 255],       // blue
        }
    }

    /// Fixed label mapping reported in every [`DetectionRecord`]
    pub fn label_mapping() -> BTreeMap<String, u8> {
        Self::ALL
            .iter()
            .map(|c| (c.name().to_string(), c.label()))
            .collect()
    }
}

impl std::fmt::Display for LandCoverClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Scene-wide change statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalMetrics {
    /// Percentage of pixels at or above the threshold
    pub anomaly_pixels_pct: f64,
    pub score_mean: f64,
    pub score_p95: f64,
}

/// Change statistics restricted to one land-cover category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMetrics {
    /// Percentage of within-category pixels at or above the threshold
    pub anomaly_pixels_pct: f64,
    /// Number of pixels carrying this category's label
    pub pixels: u64,
}

/// Global and per-category change statistics for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeMetrics {
    pub global: GlobalMetrics,
    pub by_category: BTreeMap<String, CategoryMetrics>,
}

/// The structured result document produced once per run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub run_id: String,
    /// Output extent as [width, height]
    pub size: [u32; 2],
    /// Artifact name -> storage location (relative to the run directory)
    pub assets: BTreeMap<String, String>,
    pub metrics: ChangeMetrics,
    pub threshold_suggestion: f32,
    /// Fixed mapping {urban:0, agriculture:1, forest:2, water:3}
    pub landcover_labels: BTreeMap<String, u8>,
}

/// Error types for change detection
#[derive(Debug, thiserror::Error)]
pub enum ChangeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster format: {0}")]
    InvalidFormat(String),

    #[error("Shape mismatch: {context} ({left:?} vs {right:?})")]
    ShapeMismatch {
        context: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for change-detection operations
pub type ChangeResult<T> = Result<T, ChangeError>;
