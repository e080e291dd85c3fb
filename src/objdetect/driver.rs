//! Sliding-window / scale-pyramid driver: orchestrates the pyramid,
//! descriptor engine, linear scorer, and mean-shift NMS into `detect`,
//! `detect_objects`, and the batch-parallel `detect_batch`.

use tracing::trace;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::core::Mat;
use crate::error::{Error, Result};
use crate::objdetect::detection::{FinalDetection, RawDetection};
use crate::objdetect::engine::DescriptorEngine;
use crate::objdetect::gradient::Preprocessor;
use crate::objdetect::model::LinearModel;
use crate::objdetect::nms::{mean_shift_nms, NmsConfig};
use crate::objdetect::pyramid::{Pyramid, PyramidConfig};
use crate::objdetect::window::WindowSpec;

/// Full configuration for one detection run: how the pyramid is built, how
/// blocks are laid out and cached, how windows are scored, and how raw
/// detections are fused.
pub struct DetectConfig {
    pub window_spec: WindowSpec,
    pub pyramid_config: PyramidConfig,
    pub model: LinearModel,
    pub nms_config: NmsConfig,
    /// Window stride, in pyramid-level pixels, for the sliding-window scan.
    pub window_stride_x: usize,
    pub window_stride_y: usize,
    /// Raw detections scoring below this are discarded before NMS.
    pub score_threshold: f32,
    pub cache_budget_mb: usize,
    pub preprocessor: Preprocessor,
    pub sigma_g: f32,
    pub semicircular: bool,
}

impl DetectConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window_stride_x == 0 || self.window_stride_y == 0 {
            return Err(Error::InvalidConfiguration(
                "window stride must be positive".to_string(),
            ));
        }
        if self.model.len() != self.window_spec.descriptor_length() {
            return Err(Error::DimensionMismatch {
                expected: self.window_spec.descriptor_length(),
                actual: self.model.len(),
            });
        }
        self.nms_config.validate()
    }
}

/// Enumerates every (x, y, scale) sub-window in `img`'s scale pyramid,
/// scores it with `config.model`, and returns every detection scoring
/// strictly above `config.score_threshold`, in `(outer = pyramid level,
/// outer = y, inner = x)` enumeration order, with coordinates already
/// translated back to `img`'s own frame.
pub fn detect(img: &Mat, config: &DetectConfig) -> Result<Vec<RawDetection>> {
    config.validate()?;

    let pyramid = Pyramid::build(img, &config.pyramid_config)?;
    let win_w = config.window_spec.width();
    let win_h = config.window_spec.height();

    let mut engine =
        DescriptorEngine::new(config.window_spec.clone(), config.cache_budget_mb)?;

    let mut raw = Vec::new();
    for (level_idx, level) in pyramid.levels().iter().enumerate() {
        engine.load_image(
            &level.image,
            config.preprocessor,
            config.sigma_g,
            config.semicircular,
        )?;
        let lw = level.image.cols();
        let lh = level.image.rows();
        if lw < win_w || lh < win_h {
            continue;
        }
        let mut y = 0;
        while y + win_h <= lh {
            let mut x = 0;
            while x + win_w <= lw {
                let descriptor = engine.window_descriptor(x, y)?;
                let score = config.model.score(descriptor.as_slice())?;
                if score > config.score_threshold {
                    let (cx_src, cy_src) = pyramid.unpad_coordinate(
                        level_idx,
                        x as f32 + win_w as f32 / 2.0,
                        y as f32 + win_h as f32 / 2.0,
                    );
                    raw.push(RawDetection::new(
                        cx_src,
                        cy_src,
                        win_w as f32 * level.scale,
                        win_h as f32 * level.scale,
                        level.scale,
                        score,
                    ));
                }
                x += config.window_stride_x;
            }
            y += config.window_stride_y;
        }
    }
    trace!(count = raw.len(), "raw detections scored");
    Ok(raw)
}

/// `detect` followed by mean-shift mode-finding NMS.
pub fn detect_objects(img: &Mat, config: &DetectConfig) -> Result<Vec<FinalDetection>> {
    let raw = detect(img, config)?;
    mean_shift_nms(&raw, &config.nms_config)
}

/// Runs `detect_objects` independently over every image in `images`. Each
/// image gets its own `DescriptorEngine`; this is the one place in the
/// crate where cross-image parallelism is sanctioned.
#[cfg(feature = "rayon")]
pub fn detect_batch(images: &[Mat], config: &DetectConfig) -> Result<Vec<Vec<FinalDetection>>> {
    images
        .par_iter()
        .map(|img| detect_objects(img, config))
        .collect()
}

/// Sequential fallback when the `rayon` feature is disabled.
#[cfg(not(feature = "rayon"))]
pub fn detect_batch(images: &[Mat], config: &DetectConfig) -> Result<Vec<Vec<FinalDetection>>> {
    images.iter().map(|img| detect_objects(img, config)).collect()
}
