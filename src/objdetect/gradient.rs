//! Dense gradient field computation: the first stage of the descriptor engine.
//!
//! Converts a raw pixel `Mat` into a per-pixel (magnitude, orientation) field
//! under one of five configurable preprocessors.

use crate::core::{Mat, MatDepth};
use crate::error::{Error, Result};
use crate::imgproc::color::rgb_to_lab_f32;

/// Selects the pixel remapping applied before gradient estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preprocessor {
    /// Derivative of raw RGB (or grayscale) pixel values.
    RgbGrad,
    /// Pixel values replaced by their square root before differentiation.
    RgbSqrtGrad,
    /// Pixels replaced by log(1 + v) before differentiation.
    RgbLogGrad,
    /// Convert RGB to CIE L*a*b*, rescale each channel to [0, 255], differentiate.
    LabGrad,
    /// As `LabGrad`, then square-root applied to the final magnitude.
    LabSqrtGrad,
}

/// Dense per-pixel (magnitude, orientation) field with the same extent as its
/// source image. Orientation is stored as an integer degree, either in
/// [0, 360) or, when folded semicircular, [0, 180).
#[derive(Debug, Clone)]
pub struct GradientField {
    width: usize,
    height: usize,
    magnitude: Vec<f32>,
    orientation: Vec<u16>,
}

impl GradientField {
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// (magnitude, orientation-in-degrees) at a pixel. Panics if out of bounds;
    /// callers in this crate only ever query positions the window slider has
    /// already validated against the field extent.
    #[inline]
    #[must_use]
    pub fn at(&self, x: usize, y: usize) -> (f32, u16) {
        let idx = y * self.width + x;
        (self.magnitude[idx], self.orientation[idx])
    }

    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            magnitude: vec![0.0; width * height],
            orientation: vec![0; width * height],
        }
    }
}

/// Computes a [`GradientField`] from `img` under the given preprocessor.
///
/// `sigma_g` is the standard deviation of the Gaussian pre-smoothing kernel
/// (0 disables smoothing). `semicircular` folds orientation into [0, 180).
pub fn compute_gradient_field(
    img: &Mat,
    preprocessor: Preprocessor,
    sigma_g: f32,
    semicircular: bool,
) -> Result<GradientField> {
    if img.depth() != MatDepth::U8 {
        return Err(Error::UnsupportedOperation(
            "gradient computation only supports U8 depth".to_string(),
        ));
    }
    let (w, h) = (img.cols(), img.rows());
    if w < 2 || h < 2 {
        return Err(Error::InvalidDimensions(
            "image must be at least 2x2 to compute gradients".to_string(),
        ));
    }

    let channel_planes = remap_channels(img, preprocessor)?;
    let kernel = if sigma_g > 0.0 {
        Some(gaussian_kernel(sigma_g))
    } else {
        None
    };

    let mut field = GradientField::new(w, h);
    let mut best_mag = vec![-1.0f32; w * h];

    for plane in &channel_planes {
        let smoothed = match &kernel {
            Some(k) => convolve_separable(plane, w, h, k),
            None => plane.clone(),
        };
        let dx = central_diff_x(&smoothed, w, h);
        let dy = central_diff_y(&smoothed, w, h);

        for i in 0..w * h {
            let mag = (dx[i] * dx[i] + dy[i] * dy[i]).sqrt();
            if mag > best_mag[i] {
                best_mag[i] = mag;
                let mut deg = dy[i].atan2(dx[i]).to_degrees();
                if deg < 0.0 {
                    deg += 360.0;
                }
                let mut deg_u = deg.round() as i32 % 360;
                if deg_u < 0 {
                    deg_u += 360;
                }
                field.orientation[i] = deg_u as u16;
                field.magnitude[i] = mag;
            }
        }
    }

    if matches!(preprocessor, Preprocessor::LabSqrtGrad) {
        for m in &mut field.magnitude {
            *m = m.sqrt();
        }
    }

    if semicircular {
        for o in &mut field.orientation {
            *o %= 180;
        }
    }

    Ok(field)
}

/// Extracts one continuous-valued plane per channel, applying the
/// preprocessor's pixel remap (but not the gradient-stage magnitude sqrt,
/// which applies later for `LabSqrtGrad`).
fn remap_channels(img: &Mat, preprocessor: Preprocessor) -> Result<Vec<Vec<f32>>> {
    let (w, h) = (img.cols(), img.rows());
    let channels = img.channels();
    if channels != 1 && channels != 3 {
        return Err(Error::InvalidParameter(
            "gradient preprocessor requires 1 or 3 channel images".to_string(),
        ));
    }

    match preprocessor {
        Preprocessor::RgbGrad => extract_planes(img, |v| v),
        Preprocessor::RgbSqrtGrad => extract_planes(img, f32::sqrt),
        Preprocessor::RgbLogGrad => extract_planes(img, |v| (1.0 + v).ln()),
        Preprocessor::LabGrad | Preprocessor::LabSqrtGrad => {
            if channels != 3 {
                return Err(Error::InvalidParameter(
                    "Lab preprocessors require a 3-channel image".to_string(),
                ));
            }
            let mut l = vec![0.0f32; w * h];
            let mut a = vec![0.0f32; w * h];
            let mut b = vec![0.0f32; w * h];
            for y in 0..h {
                for x in 0..w {
                    let p = img.at(y, x)?;
                    let (ll, aa, bb) = rgb_to_lab_f32(p[0], p[1], p[2]);
                    let idx = y * w + x;
                    l[idx] = ll * 255.0 / 100.0;
                    a[idx] = aa + 128.0;
                    b[idx] = bb + 128.0;
                }
            }
            Ok(vec![l, a, b])
        }
    }
}

fn extract_planes(img: &Mat, remap: impl Fn(f32) -> f32) -> Result<Vec<Vec<f32>>> {
    let (w, h) = (img.cols(), img.rows());
    let channels = img.channels();
    let mut planes = vec![vec![0.0f32; w * h]; channels];
    for y in 0..h {
        for x in 0..w {
            let p = img.at(y, x)?;
            for (ch, plane) in planes.iter_mut().enumerate() {
                plane[y * w + x] = remap(f32::from(p[ch]));
            }
        }
    }
    Ok(planes)
}

/// Discrete 1-D Gaussian kernel with support `3*sigma` on each side.
fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (3.0 * sigma).ceil().max(1.0) as i32;
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|i| {
            let x = i as f32;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= sum;
    }
    kernel
}

fn clamp_index(i: i32, len: usize) -> usize {
    i.clamp(0, len as i32 - 1) as usize
}

/// Separable convolution (horizontal pass then vertical pass) with edge-replicate
/// boundary handling.
fn convolve_separable(plane: &[f32], w: usize, h: usize, kernel: &[f32]) -> Vec<f32> {
    let radius = (kernel.len() / 2) as i32;

    let mut horiz = vec![0.0f32; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0f32;
            for (k, &kv) in kernel.iter().enumerate() {
                let dx = k as i32 - radius;
                let sx = clamp_index(x as i32 + dx, w);
                acc += kv * plane[y * w + sx];
            }
            horiz[y * w + x] = acc;
        }
    }

    let mut vert = vec![0.0f32; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0f32;
            for (k, &kv) in kernel.iter().enumerate() {
                let dy = k as i32 - radius;
                let sy = clamp_index(y as i32 + dy, h);
                acc += kv * horiz[sy * w + x];
            }
            vert[y * w + x] = acc;
        }
    }
    vert
}

/// Centered first-difference stencil [-1, 0, +1] along x, edge-replicate boundary.
fn central_diff_x(plane: &[f32], w: usize, h: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; w * h];
    for y in 0..h {
        for x in 0..w {
            let xm = clamp_index(x as i32 - 1, w);
            let xp = clamp_index(x as i32 + 1, w);
            out[y * w + x] = plane[y * w + xp] - plane[y * w + xm];
        }
    }
    out
}

/// Centered first-difference stencil [-1, 0, +1] along y, edge-replicate boundary.
fn central_diff_y(plane: &[f32], w: usize, h: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; w * h];
    for y in 0..h {
        for x in 0..w {
            let ym = clamp_index(y as i32 - 1, h);
            let yp = clamp_index(y as i32 + 1, h);
            out[y * w + x] = plane[yp * w + x] - plane[ym * w + x];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Scalar;

    #[test]
    fn test_uniform_image_has_zero_gradient() {
        let img = Mat::new_with_default(32, 32, 3, MatDepth::U8, Scalar::all(128.0)).unwrap();
        let field = compute_gradient_field(&img, Preprocessor::RgbGrad, 0.0, false).unwrap();
        for y in 0..32 {
            for x in 0..32 {
                let (mag, _) = field.at(x, y);
                assert!(mag.abs() < 1e-3);
            }
        }
    }

    #[test]
    fn test_vertical_edge_is_horizontal_gradient() {
        let mut img = Mat::new(16, 16, 1, MatDepth::U8).unwrap();
        for y in 0..16 {
            for x in 0..16 {
                img.at_mut(y, x).unwrap()[0] = if x < 8 { 0 } else { 255 };
            }
        }
        let field = compute_gradient_field(&img, Preprocessor::RgbGrad, 0.0, false).unwrap();
        let (mag, ori) = field.at(8, 8);
        assert!(mag > 100.0);
        assert!(ori < 5 || (355..360).contains(&ori));
    }

    #[test]
    fn test_semicircular_folds_orientation() {
        let mut img = Mat::new(16, 16, 1, MatDepth::U8).unwrap();
        for y in 0..16 {
            for x in 0..16 {
                img.at_mut(y, x).unwrap()[0] = ((x + y) * 8) as u8;
            }
        }
        let field = compute_gradient_field(&img, Preprocessor::RgbGrad, 0.0, true).unwrap();
        assert!(field.orientation.iter().all(|&o| o < 180));
    }
}
