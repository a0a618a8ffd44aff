//! Analytic stages of the change-detection pipeline

pub mod anomaly;
pub mod composite;
pub mod landcover;
pub mod metrics;
pub mod stats;

// Re-export the stage entry points
pub use anomaly::{anomaly_map, ssim_map};
pub use composite::{luminance, rgb_composite};
pub use landcover::classify_landcover;
pub use metrics::{compute_metrics, suggest_threshold};
