//! terradiff: A Fast Bi-Temporal Satellite Change & Anomaly Detection Pipeline
//!
//! Ingests two multi-band captures of the same area taken at different times
//! and produces a registered analysis: true-color composites, a heuristic
//! land-cover classification, a fused per-pixel anomaly score, an adaptive
//! binarization threshold, category-stratified change statistics, and a set
//! of rendered PNG artifacts.
//!
//! The captures are assumed pre-aligned; the only geometric work done here
//! is bringing each file's bands onto its own finest grid. The entry point
//! is [`pipeline::detect`], with [`pipeline::analyze`] exposing the pure
//! in-memory computation.

pub mod core;
pub mod io;
pub mod params;
pub mod pipeline;
pub mod types;

// Re-export main types and functions for easier access
pub use params::DetectionParams;
pub use pipeline::{analyze, detect, Analysis};
pub use types::{
    AnomalyScoreMap, CategoryMetrics, ChangeError, ChangeMetrics, ChangeResult, DetectionRecord,
    GlobalMetrics, LandCoverClass, LandCoverMap, MultiBandImage, RgbComposite,
};

pub use io::{AssetWriter, RasterReader};
