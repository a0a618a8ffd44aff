use crate::params::DetectionParams;
use crate::types::{AnomalyScoreMap, ChangeResult, LandCoverClass, LandCoverMap, RgbComposite};
use image::{GrayImage, RgbImage};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Renders the numeric intermediates of a run into 8-bit PNG artifacts.
///
/// The writer fixes the visual contract of the pipeline: scaling, palettes,
/// and blend ratios live here, the analytic stages never touch pixels.
pub struct AssetWriter {
    run_dir: PathBuf,
}

impl AssetWriter {
    /// Create a writer rooted at a run directory, creating it if needed.
    pub fn new<P: AsRef<Path>>(run_dir: P) -> ChangeResult<Self> {
        std::fs::create_dir_all(run_dir.as_ref())?;
        Ok(Self {
            run_dir: run_dir.as_ref().to_path_buf(),
        })
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Write all seven artifacts for a run, returning the asset-name ->
    /// relative-filename map recorded in the output document.
    pub fn write_all(
        &self,
        t0_rgb: &RgbComposite,
        t1_rgb: &RgbComposite,
        score: &AnomalyScoreMap,
        landcover: &LandCoverMap,
        threshold: f32,
        params: &DetectionParams,
    ) -> ChangeResult<BTreeMap<String, String>> {
        log::info!("Writing artifacts to {}", self.run_dir.display());

        self.write_rgb(t0_rgb, "t0.png")?;
        self.write_rgb(t1_rgb, "t1.png")?;
        self.write_diff(t0_rgb, t1_rgb, "diff.png")?;
        self.write_heatmap(score, "heatmap.png")?;
        self.write_overlay(t1_rgb, score, threshold, params, "overlay.png")?;
        self.write_anomaly_u8(score, "anomaly_u8.png")?;
        self.write_landcover(landcover, "landcover.png")?;

        let assets = [
            ("t0_rgb", "t0.png"),
            ("t1_rgb", "t1.png"),
            ("diff_rgb", "diff.png"),
            ("heatmap", "heatmap.png"),
            ("overlay", "overlay.png"),
            ("anomaly_u8", "anomaly_u8.png"),
            ("landcover", "landcover.png"),
        ];
        Ok(assets
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect())
    }

    /// Direct [0,1] -> [0,255] true-color render.
    pub fn write_rgb(&self, rgb: &RgbComposite, name: &str) -> ChangeResult<()> {
        let (height, width, _) = rgb.dim();
        let img = RgbImage::from_fn(width as u32, height as u32, |x, y| {
            let (i, j) = (y as usize, x as usize);
            image::Rgb([
                to_u8(rgb[[i, j, 0]]),
                to_u8(rgb[[i, j, 1]]),
                to_u8(rgb[[i, j, 2]]),
            ])
        });
        img.save(self.run_dir.join(name))?;
        Ok(())
    }

    /// Per-pixel absolute RGB difference.
    pub fn write_diff(
        &self,
        t0_rgb: &RgbComposite,
        t1_rgb: &RgbComposite,
        name: &str,
    ) -> ChangeResult<()> {
        let (height, width, _) = t0_rgb.dim();
        let img = RgbImage::from_fn(width as u32, height as u32, |x, y| {
            let (i, j) = (y as usize, x as usize);
            image::Rgb([
                to_u8((t1_rgb[[i, j, 0]] - t0_rgb[[i, j, 0]]).abs()),
                to_u8((t1_rgb[[i, j, 1]] - t0_rgb[[i, j, 1]]).abs()),
                to_u8((t1_rgb[[i, j, 2]] - t0_rgb[[i, j, 2]]).abs()),
            ])
        });
        img.save(self.run_dir.join(name))?;
        Ok(())
    }

    /// Anomaly score through the hot color ramp (dark -> red -> yellow ->
    /// white, monotonic in score).
    pub fn write_heatmap(&self, score: &AnomalyScoreMap, name: &str) -> ChangeResult<()> {
        let (height, width) = score.dim();
        let img = RgbImage::from_fn(width as u32, height as u32, |x, y| {
            image::Rgb(hot_ramp(score[[y as usize, x as usize]]))
        });
        img.save(self.run_dir.join(name))?;
        Ok(())
    }

    /// Later capture with anomalous pixels blended toward pure red.
    pub fn write_overlay(
        &self,
        t1_rgb: &RgbComposite,
        score: &AnomalyScoreMap,
        threshold: f32,
        params: &DetectionParams,
        name: &str,
    ) -> ChangeResult<()> {
        let (height, width, _) = t1_rgb.dim();
        let (base_w, red_w) = params.overlay_blend;
        let img = RgbImage::from_fn(width as u32, height as u32, |x, y| {
            let (i, j) = (y as usize, x as usize);
            let base = [
                to_u8(t1_rgb[[i, j, 0]]),
                to_u8(t1_rgb[[i, j, 1]]),
                to_u8(t1_rgb[[i, j, 2]]),
            ];
            if score[[i, j]] >= threshold {
                image::Rgb([
                    (base_w * base[0] as f32 + red_w * 255.0) as u8,
                    (base_w * base[1] as f32) as u8,
                    (base_w * base[2] as f32) as u8,
                ])
            } else {
                image::Rgb(base)
            }
        });
        img.save(self.run_dir.join(name))?;
        Ok(())
    }

    /// Raw score map as 8-bit grayscale, so a consumer can re-threshold
    /// interactively without recomputation.
    pub fn write_anomaly_u8(&self, score: &AnomalyScoreMap, name: &str) -> ChangeResult<()> {
        let (height, width) = score.dim();
        let img = GrayImage::from_fn(width as u32, height as u32, |x, y| {
            image::Luma([to_u8(score[[y as usize, x as usize]])])
        });
        img.save(self.run_dir.join(name))?;
        Ok(())
    }

    /// Categorical land-cover render with the fixed class palette.
    pub fn write_landcover(&self, landcover: &LandCoverMap, name: &str) -> ChangeResult<()> {
        let (height, width) = landcover.dim();
        let img = RgbImage::from_fn(width as u32, height as u32, |x, y| {
            let label = landcover[[y as usize, x as usize]];
            let color = LandCoverClass::ALL
                .iter()
                .find(|c| c.label() == label)
                .map(|c| c.color())
                .unwrap_or([0, 0, 0]);
            image::Rgb(color)
        });
        img.save(self.run_dir.join(name))?;
        Ok(())
    }
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0) as u8
}

/// Piecewise-linear hot ramp: red rises over the first third of the range,
/// then green, then blue, so low scores render dark and high scores bright.
fn hot_ramp(t: f32) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    let r = (3.0 * t).clamp(0.0, 1.0);
    let g = (3.0 * t - 1.0).clamp(0.0, 1.0);
    let b = (3.0 * t - 2.0).clamp(0.0, 1.0);
    [to_u8(r), to_u8(g), to_u8(b)]
}
