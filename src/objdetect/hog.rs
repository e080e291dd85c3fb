//! Classic person-detector facade over the block/window/pyramid/driver
//! machinery: the 64x128 window, 16x16 block, 8x8 stride, 8x8 cell, 9-bin
//! configuration described throughout `lear/cvision`'s `rhogdense.h` and
//! `app/trainhog.cpp` defaults.

use std::sync::Arc;

use crate::core::Mat;
use crate::error::{Error, Result};
use crate::objdetect::block::BlockSpec;
use crate::objdetect::detection::{FinalDetection, RawDetection};
use crate::objdetect::driver::{detect, detect_objects, DetectConfig};
use crate::objdetect::gradient::Preprocessor;
use crate::objdetect::model::LinearModel;
use crate::objdetect::nms::NmsConfig;
use crate::objdetect::normalizer::Normalizer;
use crate::objdetect::pyramid::PyramidConfig;
use crate::objdetect::window::WindowSpec;

const WIN_WIDTH: usize = 64;
const WIN_HEIGHT: usize = 128;
const CELL_SIZE: usize = 8;
const BLOCK_CELLS: usize = 2;
const BLOCK_STRIDE: usize = 8;
const NUM_BINS: usize = 9;

// `windetect.h`'s `WinDetectClassify` defaults: avsize_x(0) (x term
// disabled), avsize_y(96) (a 128-tall window holds a ~96px-tall person),
// margin_x(4), margin_y(4).
const MARGIN_X: f32 = 4.0;
const MARGIN_Y: f32 = 4.0;
const AVG_SIZE_X: f32 = 0.0;
const AVG_SIZE_Y: f32 = 96.0;

/// HOG (Histogram of Oriented Gradients) person detector, wired to the
/// classic windowing geometry with a pluggable linear model.
pub struct HOGDescriptor {
    window_spec: WindowSpec,
    pyramid_config: PyramidConfig,
    nms_config: NmsConfig,
    model: Option<LinearModel>,
}

impl HOGDescriptor {
    /// Builds the classic 64x128 detector geometry with no model loaded yet.
    pub fn new() -> Result<Self> {
        let block = Arc::new(BlockSpec::new(
            CELL_SIZE,
            CELL_SIZE,
            BLOCK_CELLS,
            BLOCK_CELLS,
            NUM_BINS,
            true,
            0.0,
            Normalizer::L2Hys,
            Preprocessor::RgbGrad,
            0.0,
        )?);
        let window_spec = WindowSpec::new(
            WIN_WIDTH,
            WIN_HEIGHT,
            vec![(block, BLOCK_STRIDE, BLOCK_STRIDE)],
        )?;
        let pyramid_config = PyramidConfig::with_average_size_margin(
            1.05,
            WIN_WIDTH,
            WIN_HEIGHT,
            WIN_WIDTH as f32,
            WIN_HEIGHT as f32,
            MARGIN_X,
            MARGIN_Y,
            AVG_SIZE_X,
            AVG_SIZE_Y,
        )?;
        let nms_config = NmsConfig {
            window_width: WIN_WIDTH as f32,
            window_height: WIN_HEIGHT as f32,
            ..NmsConfig::default()
        };
        Ok(Self {
            window_spec,
            pyramid_config,
            nms_config,
            model: None,
        })
    }

    /// Descriptor length of one window, for validating a model before load.
    pub fn descriptor_length(&self) -> usize {
        self.window_spec.descriptor_length()
    }

    /// Loads a linear SVM model from the original binary model-file format.
    pub fn load_model(&mut self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let model = LinearModel::load_file(path)?;
        if model.len() != self.descriptor_length() {
            return Err(Error::DimensionMismatch {
                expected: self.descriptor_length(),
                actual: model.len(),
            });
        }
        self.model = Some(model);
        Ok(())
    }

    /// Installs an in-memory linear model (for detectors whose weights are
    /// computed or held in process rather than loaded from disk).
    pub fn set_model(&mut self, model: LinearModel) -> Result<()> {
        if model.len() != self.descriptor_length() {
            return Err(Error::DimensionMismatch {
                expected: self.descriptor_length(),
                actual: model.len(),
            });
        }
        self.model = Some(model);
        Ok(())
    }

    fn config(&self, score_threshold: f32) -> Result<DetectConfig> {
        let model = self
            .model
            .clone()
            .ok_or_else(|| Error::InvalidConfiguration("no model loaded".to_string()))?;
        Ok(DetectConfig {
            window_spec: self.window_spec.clone(),
            pyramid_config: self.pyramid_config,
            model,
            nms_config: self.nms_config,
            window_stride_x: BLOCK_STRIDE,
            window_stride_y: BLOCK_STRIDE,
            score_threshold,
            cache_budget_mb: 16,
            preprocessor: Preprocessor::RgbGrad,
            sigma_g: 0.0,
            semicircular: true,
        })
    }

    /// Every sliding-window evaluation scoring strictly above `hit_threshold`,
    /// before non-maximum suppression.
    pub fn detect(&self, img: &Mat, hit_threshold: f32) -> Result<Vec<RawDetection>> {
        detect(img, &self.config(hit_threshold)?)
    }

    /// `detect` followed by scale-space mean-shift mode-finding NMS.
    pub fn detect_multi_scale(&self, img: &Mat, hit_threshold: f32) -> Result<Vec<FinalDetection>> {
        detect_objects(img, &self.config(hit_threshold)?)
    }
}

impl Default for HOGDescriptor {
    fn default() -> Self {
        Self::new().expect("classic HOG geometry is always valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{types::Scalar, MatDepth};

    #[test]
    fn test_classic_descriptor_length() {
        let hog = HOGDescriptor::new().unwrap();
        // 7 blocks wide * 15 blocks tall * 2*2 cells * 9 bins
        assert_eq!(hog.descriptor_length(), 7 * 15 * 2 * 2 * 9);
    }

    #[test]
    fn test_detect_without_model_errors() {
        let hog = HOGDescriptor::new().unwrap();
        let img = Mat::new_with_default(128, 64, 1, MatDepth::U8, Scalar::all(128.0)).unwrap();
        assert!(hog.detect(&img, 0.0).is_err());
    }

    #[test]
    fn test_set_model_rejects_wrong_length() {
        let mut hog = HOGDescriptor::new().unwrap();
        let bad_model = LinearModel::new(vec![0.0; 3], 0.0).unwrap();
        assert!(hog.set_model(bad_model).is_err());
    }

    #[test]
    fn test_set_model_and_detect_end_to_end() {
        let mut hog = HOGDescriptor::new().unwrap();
        let len = hog.descriptor_length();
        let model = LinearModel::new(vec![0.0; len], -1.0).unwrap();
        hog.set_model(model).unwrap();
        let img = Mat::new_with_default(128, 64, 1, MatDepth::U8, Scalar::all(128.0)).unwrap();
        let detections = hog.detect_multi_scale(&img, -10.0).unwrap();
        assert!(!detections.is_empty());
    }
}
