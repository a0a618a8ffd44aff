use crate::core::anomaly::anomaly_map;
use crate::core::composite::rgb_composite;
use crate::core::landcover::classify_landcover;
use crate::core::metrics::{compute_metrics, suggest_threshold};
use crate::io::assets::AssetWriter;
use crate::io::raster::RasterReader;
use crate::params::DetectionParams;
use crate::types::{
    AnomalyScoreMap, ChangeMetrics, ChangeResult, DetectionRecord, LandCoverClass, LandCoverMap,
    MultiBandImage, RgbComposite, ChangeError,
};
use std::path::Path;

/// Every numeric intermediate of one detection run.
///
/// Produced by [`analyze`] without touching the filesystem, so callers can
/// render, persist, or re-threshold without recomputing anything.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub t0_rgb: RgbComposite,
    pub t1_rgb: RgbComposite,
    pub landcover: LandCoverMap,
    pub score: AnomalyScoreMap,
    pub threshold: f32,
    pub metrics: ChangeMetrics,
}

impl Analysis {
    /// Output extent as (width, height).
    pub fn size(&self) -> (usize, usize) {
        let (h, w) = self.score.dim();
        (w, h)
    }
}

/// Run the straight-line analysis over two aligned band stacks.
///
/// Composites both captures, classifies land cover on the later capture's
/// full stack, scores change between the composites, and derives the
/// threshold suggestion and metrics. Pure and deterministic: the same
/// inputs always produce bit-identical metrics and threshold.
pub fn analyze(
    t0_all: &MultiBandImage,
    t1_all: &MultiBandImage,
    params: &DetectionParams,
) -> ChangeResult<Analysis> {
    let (h0, w0, _) = t0_all.dim();
    let (h1, w1, _) = t1_all.dim();
    if (h0, w0) != (h1, w1) {
        return Err(ChangeError::ShapeMismatch {
            context: "t0 vs t1 band stacks",
            left: (h0, w0),
            right: (h1, w1),
        });
    }

    log::info!("Analyzing {}x{} scene pair", h0, w0);

    let t0_rgb = rgb_composite(t0_all, params);
    let t1_rgb = rgb_composite(t1_all, params);
    let landcover = classify_landcover(t1_all, params);
    let score = anomaly_map(&t0_rgb, &t1_rgb, params)?;
    let threshold = suggest_threshold(&score, params);
    let metrics = compute_metrics(&score, &landcover, threshold)?;

    log::info!(
        "Scene analysis complete: {:.2}% anomalous at threshold {:.3}",
        metrics.global.anomaly_pixels_pct,
        threshold
    );

    Ok(Analysis {
        t0_rgb,
        t1_rgb,
        landcover,
        score,
        threshold,
        metrics,
    })
}

/// Full detection entry point: load both rasters, analyze, write artifacts
/// and the `result.json` snapshot into the run directory, and return the
/// structured record.
///
/// Idempotent: re-invocation with the same inputs regenerates all derived
/// state. The computation fails atomically before the first artifact write;
/// artifact persistence failures surface as I/O errors but never corrupt
/// the analysis itself.
pub fn detect(
    t0_path: impl AsRef<Path>,
    t1_path: impl AsRef<Path>,
    run_dir: impl AsRef<Path>,
    run_id: &str,
    params: &DetectionParams,
) -> ChangeResult<DetectionRecord> {
    log::info!("Starting detection run {}", run_id);

    let t0_all = RasterReader::read_multiband(t0_path)?;
    let t1_all = RasterReader::read_multiband(t1_path)?;

    let analysis = analyze(&t0_all, &t1_all, params)?;

    let writer = AssetWriter::new(run_dir)?;
    let assets = writer.write_all(
        &analysis.t0_rgb,
        &analysis.t1_rgb,
        &analysis.score,
        &analysis.landcover,
        analysis.threshold,
        params,
    )?;

    let (width, height) = analysis.size();
    let record = DetectionRecord {
        run_id: run_id.to_string(),
        size: [width as u32, height as u32],
        assets,
        metrics: analysis.metrics,
        threshold_suggestion: analysis.threshold,
        landcover_labels: LandCoverClass::label_mapping(),
    };

    let snapshot = serde_json::to_string_pretty(&record)?;
    std::fs::write(writer.run_dir().join("result.json"), snapshot)?;

    log::info!("Detection run {} complete", run_id);
    Ok(record)
}
