//! Scale-space image pyramid: border padding, geometric scale progression,
//! and separable resampling.
//!
//! The scale progression is grounded on `lear/cvision/scalepyramid.h`'s
//! `ScalePyramid`: levels run `scale(i) = start_scale * scale_ratio^i` for
//! `i` in `0..size`, where `size` is the largest count such that the window
//! still fits inside `extent / scale(i)`. The resampling filter is grounded
//! on `lear/image/rescale.h`'s `WeightTable`: a bilinear (triangle) filter
//! whose support widens by `1 / min(dst/src, 1)` when downsampling, keeping
//! its base width when upsampling, with source-side clamping giving the
//! edge-replicate boundary behavior at the frame edges.

use tracing::debug;

use crate::core::{Mat, MatDepth};
use crate::error::{Error, Result};

/// Border margins added to the source image before the pyramid is built, and
/// the geometric scale progression used to build it.
#[derive(Debug, Clone, Copy)]
pub struct PyramidConfig {
    scale_ratio: f32,
    window_width: usize,
    window_height: usize,
    margin_left: usize,
    margin_top: usize,
    margin_right: usize,
    margin_bottom: usize,
}

impl PyramidConfig {
    pub fn new(
        scale_ratio: f32,
        window_width: usize,
        window_height: usize,
        margin_left: usize,
        margin_top: usize,
        margin_right: usize,
        margin_bottom: usize,
    ) -> Result<Self> {
        if scale_ratio <= 1.0 {
            return Err(Error::InvalidConfiguration(
                "scale ratio must be greater than 1".to_string(),
            ));
        }
        if window_width == 0 || window_height == 0 {
            return Err(Error::InvalidConfiguration(
                "window dimensions must be positive".to_string(),
            ));
        }
        Ok(Self {
            scale_ratio,
            window_width,
            window_height,
            margin_left,
            margin_top,
            margin_right,
            margin_bottom,
        })
    }

    /// Derives a uniform border margin from a margin-vs-average-object-size
    /// ratio pair and builds the pyramid config around it, applying the same
    /// margin to all four sides.
    ///
    /// `extent_x`/`extent_y` are the reference width/height the ratios are
    /// expressed against, `margin_x`/`margin_y` the margin coefficients, and
    /// `avg_size_x`/`avg_size_y` the average object size along each axis. A
    /// zero average size disables that axis's term, matching
    /// `windetect.h`'s `avsize_x(0)` convention ("0 imply do not use average
    /// size").
    #[allow(clippy::too_many_arguments)]
    pub fn with_average_size_margin(
        scale_ratio: f32,
        window_width: usize,
        window_height: usize,
        extent_x: f32,
        extent_y: f32,
        margin_x: f32,
        margin_y: f32,
        avg_size_x: f32,
        avg_size_y: f32,
    ) -> Result<Self> {
        let margin = derive_average_size_margin(
            extent_x, extent_y, margin_x, margin_y, avg_size_x, avg_size_y,
        );
        let margin_px = margin.round().max(0.0) as usize;
        Self::new(
            scale_ratio,
            window_width,
            window_height,
            margin_px,
            margin_px,
            margin_px,
            margin_px,
        )
    }
}

/// `max(margin_x/avg_size_x * extent_x, margin_y/avg_size_y * extent_y)`,
/// per `windetect.h`'s "Formula of extension is
/// max(margin_x/avsize_x*width, margin_y/avsize_y*height) on each side."
fn derive_average_size_margin(
    extent_x: f32,
    extent_y: f32,
    margin_x: f32,
    margin_y: f32,
    avg_size_x: f32,
    avg_size_y: f32,
) -> f32 {
    let x_term = if avg_size_x > 0.0 {
        margin_x * extent_x / avg_size_x
    } else {
        0.0
    };
    let y_term = if avg_size_y > 0.0 {
        margin_y * extent_y / avg_size_y
    } else {
        0.0
    };
    x_term.max(y_term)
}

/// One level of the pyramid: the resampled padded image and the scale factor
/// that maps its pixel coordinates back to the padded source frame.
#[derive(Debug, Clone)]
pub struct PyramidLevel {
    pub image: Mat,
    pub scale: f32,
}

/// A built scale-space pyramid over one padded source image.
#[derive(Debug, Clone)]
pub struct Pyramid {
    config: PyramidConfig,
    levels: Vec<PyramidLevel>,
}

impl Pyramid {
    /// Pads `img` by the config's margins (edge-replicate) then builds the
    /// geometric scale sequence and resamples each level.
    pub fn build(img: &Mat, config: &PyramidConfig) -> Result<Self> {
        let padded = pad_replicate(
            img,
            config.margin_left,
            config.margin_top,
            config.margin_right,
            config.margin_bottom,
        )?;
        let padded_w = padded.cols();
        let padded_h = padded.rows();

        let end_scale = ((padded_w as f32 / config.window_width as f32)
            .min(padded_h as f32 / config.window_height as f32))
        .max(1.0);
        let start_scale = 1.0f32;

        let size = ((end_scale / start_scale).ln() / config.scale_ratio.ln()).floor() as i64 + 1;
        if size <= 0 {
            return Err(Error::InvalidDimensions(
                "image too small to fit even one pyramid level for this window".to_string(),
            ));
        }

        let mut levels = Vec::with_capacity(size as usize);
        for i in 0..size {
            let scale = start_scale * config.scale_ratio.powi(i as i32);
            let target_w = ((padded_w as f32 / scale).floor() as usize).max(1);
            let target_h = ((padded_h as f32 / scale).floor() as usize).max(1);
            let resampled = resize_bilinear_separable(&padded, target_w, target_h)?;
            debug!(level = i, scale, target_w, target_h, "pyramid level built");
            levels.push(PyramidLevel {
                image: resampled,
                scale,
            });
        }

        Ok(Self {
            config: *config,
            levels,
        })
    }

    #[must_use]
    pub fn levels(&self) -> &[PyramidLevel] {
        &self.levels
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Translates a pixel position `(px, py)` in level `level_idx`'s
    /// resampled image back to the unpadded source image's coordinate frame.
    #[must_use]
    pub fn unpad_coordinate(&self, level_idx: usize, px: f32, py: f32) -> (f32, f32) {
        let scale = self.levels[level_idx].scale;
        let padded_x = px * scale;
        let padded_y = py * scale;
        (
            padded_x - self.config.margin_left as f32,
            padded_y - self.config.margin_top as f32,
        )
    }
}

/// Replicate-pads `img` by the given per-side margins.
fn pad_replicate(
    img: &Mat,
    left: usize,
    top: usize,
    right: usize,
    bottom: usize,
) -> Result<Mat> {
    let src_w = img.cols();
    let src_h = img.rows();
    let channels = img.channels();
    let dst_w = src_w + left + right;
    let dst_h = src_h + top + bottom;

    let mut dst = Mat::new(dst_h, dst_w, channels, img.depth())?;
    for y in 0..dst_h {
        let sy = (y as i64 - top as i64).clamp(0, src_h as i64 - 1) as usize;
        for x in 0..dst_w {
            let sx = (x as i64 - left as i64).clamp(0, src_w as i64 - 1) as usize;
            let pixel = img.at(sy, sx)?.to_vec();
            dst.at_mut(y, x)?.copy_from_slice(&pixel);
        }
    }
    Ok(dst)
}

/// Separable bilinear (triangle-filter) resampling matching
/// `lear/image/rescale.h`'s `WeightTable` scheme.
fn resize_bilinear_separable(src: &Mat, dst_w: usize, dst_h: usize) -> Result<Mat> {
    if src.depth() != MatDepth::U8 {
        return Err(Error::UnsupportedOperation(
            "pyramid resampling only supports U8 depth".to_string(),
        ));
    }
    let channels = src.channels();
    let src_w = src.cols();
    let src_h = src.rows();

    // Horizontal pass.
    let mut horiz = vec![0.0f32; dst_w * src_h * channels];
    let x_weights = weight_table(dst_w, src_w);
    for y in 0..src_h {
        for x in 0..dst_w {
            let (lo, hi) = x_weights.bounds[x];
            for ch in 0..channels {
                let mut acc = 0.0f32;
                let mut wsum = 0.0f32;
                for sx in lo..=hi {
                    let w = x_weights.weight(x, sx);
                    let p = src.at(y, sx)?;
                    acc += w * f32::from(p[ch]);
                    wsum += w;
                }
                horiz[(y * dst_w + x) * channels + ch] = if wsum > 0.0 { acc / wsum } else { 0.0 };
            }
        }
    }

    // Vertical pass.
    let mut dst = Mat::new(dst_h, dst_w, channels, MatDepth::U8)?;
    let y_weights = weight_table(dst_h, src_h);
    for y in 0..dst_h {
        let (lo, hi) = y_weights.bounds[y];
        for x in 0..dst_w {
            for ch in 0..channels {
                let mut acc = 0.0f32;
                let mut wsum = 0.0f32;
                for sy in lo..=hi {
                    let w = y_weights.weight(y, sy);
                    acc += w * horiz[(sy * dst_w + x) * channels + ch];
                    wsum += w;
                }
                let v = if wsum > 0.0 { acc / wsum } else { 0.0 };
                dst.at_mut(y, x)?[ch] = v.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    Ok(dst)
}

struct WeightTable {
    bounds: Vec<(usize, usize)>,
    weights: Vec<Vec<f32>>,
}

impl WeightTable {
    fn weight(&self, dst_pos: usize, src_pos: usize) -> f32 {
        let (lo, _) = self.bounds[dst_pos];
        self.weights[dst_pos][src_pos - lo]
    }
}

fn weight_table(dst_size: usize, src_size: usize) -> WeightTable {
    let scale = dst_size as f32 / src_size as f32;
    let base_width = 1.0f32;
    let width = if scale < 1.0 {
        base_width / scale
    } else {
        base_width
    };
    let filter_scale = if scale < 1.0 { scale } else { 1.0 };

    let mut bounds = Vec::with_capacity(dst_size);
    let mut weights = Vec::with_capacity(dst_size);

    for u in 0..dst_size {
        let center = u as f32 / scale;
        let lo = ((center - width).ceil().max(0.0)) as usize;
        let hi = ((center + width).floor() as i64).min(src_size as i64 - 1).max(0) as usize;
        let mut row = Vec::with_capacity(hi.saturating_sub(lo) + 1);
        for s in lo..=hi {
            let t = filter_scale * (center - s as f32);
            let w = filter_scale * bilinear_filter(t, width);
            row.push(w);
        }
        bounds.push((lo, hi));
        weights.push(row);
    }

    WeightTable { bounds, weights }
}

/// Triangle filter of support `width`: `width - |t|` clamped to 0.
fn bilinear_filter(t: f32, width: f32) -> f32 {
    let a = t.abs();
    if a < width {
        width - a
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Scalar;

    #[test]
    fn test_pyramid_levels_shrink_geometrically() {
        let img = Mat::new_with_default(256, 256, 1, MatDepth::U8, Scalar::all(10.0)).unwrap();
        let config = PyramidConfig::new(1.2, 64, 128, 0, 0, 0, 0).unwrap();
        let pyramid = Pyramid::build(&img, &config).unwrap();
        assert!(!pyramid.is_empty());
        for level in pyramid.levels() {
            assert!(level.image.cols() >= 64);
            assert!(level.image.rows() >= 128);
        }
    }

    #[test]
    fn test_pad_replicate_extends_border() {
        let mut img = Mat::new(4, 4, 1, MatDepth::U8).unwrap();
        for y in 0..4 {
            for x in 0..4 {
                img.at_mut(y, x).unwrap()[0] = 200;
            }
        }
        let padded = pad_replicate(&img, 2, 2, 2, 2).unwrap();
        assert_eq!(padded.cols(), 8);
        assert_eq!(padded.rows(), 8);
        assert_eq!(padded.at(0, 0).unwrap()[0], 200);
    }

    #[test]
    fn test_unpad_coordinate_reverses_padding() {
        let img = Mat::new_with_default(128, 128, 1, MatDepth::U8, Scalar::all(0.0)).unwrap();
        let config = PyramidConfig::new(1.2, 32, 32, 10, 5, 10, 5).unwrap();
        let pyramid = Pyramid::build(&img, &config).unwrap();
        let (x, y) = pyramid.unpad_coordinate(0, 10.0, 5.0);
        assert!((x - 0.0).abs() < 1e-3);
        assert!((y - 0.0).abs() < 1e-3);
    }

    #[test]
    fn test_rejects_invalid_scale_ratio() {
        assert!(PyramidConfig::new(1.0, 32, 32, 0, 0, 0, 0).is_err());
    }

    #[test]
    fn test_average_size_margin_disabled_axis_is_ignored() {
        // avg_size_x = 0 disables the x term entirely.
        let margin = derive_average_size_margin(64.0, 128.0, 4.0, 4.0, 0.0, 96.0);
        assert!((margin - 4.0 * 128.0 / 96.0).abs() < 1e-3);
    }

    #[test]
    fn test_average_size_margin_picks_larger_term() {
        let margin = derive_average_size_margin(64.0, 128.0, 4.0, 1.0, 16.0, 96.0);
        let x_term = 4.0 * 64.0 / 16.0;
        let y_term = 1.0 * 128.0 / 96.0;
        assert!(margin > y_term);
        assert!((margin - x_term).abs() < 1e-3);
    }

    #[test]
    fn test_with_average_size_margin_pads_pyramid_config() {
        let config =
            PyramidConfig::with_average_size_margin(1.05, 64, 128, 64.0, 128.0, 4.0, 4.0, 0.0, 96.0)
                .unwrap();
        assert_eq!(config.margin_left, 5); // round(4*128/96) = round(5.33)
        assert_eq!(config.margin_top, 5);
        assert_eq!(config.margin_right, 5);
        assert_eq!(config.margin_bottom, 5);
    }
}
