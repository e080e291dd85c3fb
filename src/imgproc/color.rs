use crate::core::{Mat, MatDepth};
use crate::core::types::ColorConversionCode;
use crate::error::{Error, Result};

/// Convert color space of an image
pub fn cvt_color(src: &Mat, dst: &mut Mat, code: ColorConversionCode) -> Result<()> {
    if src.depth() != MatDepth::U8 {
        return Err(Error::UnsupportedOperation(
            "cvt_color only supports U8 depth".to_string(),
        ));
    }

    match code {
        ColorConversionCode::BgrToGray | ColorConversionCode::RgbToGray => {
            bgr_to_gray(src, dst, code == ColorConversionCode::BgrToGray)
        }
        ColorConversionCode::GrayToBgr | ColorConversionCode::GrayToRgb => {
            gray_to_bgr(src, dst)
        }
        ColorConversionCode::BgrToRgb | ColorConversionCode::RgbToBgr => {
            swap_rb_channels(src, dst)
        }
        ColorConversionCode::BgrToHsv | ColorConversionCode::RgbToHsv => {
            rgb_to_hsv(src, dst, code == ColorConversionCode::BgrToHsv)
        }
        ColorConversionCode::HsvToBgr | ColorConversionCode::HsvToRgb => {
            hsv_to_rgb(src, dst, code == ColorConversionCode::HsvToBgr)
        }
        ColorConversionCode::BgraToGray | ColorConversionCode::RgbaToGray => {
            bgra_to_gray(src, dst, code == ColorConversionCode::BgraToGray)
        }
        ColorConversionCode::BgrToLab | ColorConversionCode::RgbToLab => {
            rgb_to_lab(src, dst, code == ColorConversionCode::BgrToLab)
        }
        ColorConversionCode::LabToBgr | ColorConversionCode::LabToRgb => {
            lab_to_rgb(src, dst, code == ColorConversionCode::LabToBgr)
        }
        ColorConversionCode::BgrToYCrCb | ColorConversionCode::RgbToYCrCb => {
            rgb_to_ycrcb(src, dst, code == ColorConversionCode::BgrToYCrCb)
        }
        ColorConversionCode::YCrCbToBgr | ColorConversionCode::YCrCbToRgb => {
            ycrcb_to_rgb(src, dst, code == ColorConversionCode::YCrCbToBgr)
        }
    }
}

/// Convert BGRA/RGBA to grayscale, dropping the alpha channel
fn bgra_to_gray(src: &Mat, dst: &mut Mat, is_bgra: bool) -> Result<()> {
    if src.channels() != 4 {
        return Err(Error::InvalidParameter(
            "Source must have 4 channels".to_string(),
        ));
    }

    *dst = Mat::new(src.rows(), src.cols(), 1, MatDepth::U8)?;

    for row in 0..src.rows() {
        for col in 0..src.cols() {
            let pixel = src.at(row, col)?;
            let (r, g, b) = if is_bgra {
                (pixel[2], pixel[1], pixel[0])
            } else {
                (pixel[0], pixel[1], pixel[2])
            };

            let gray = (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32) as u8;
            dst.at_mut(row, col)?[0] = gray;
        }
    }

    Ok(())
}

/// sRGB companding inverse: maps an 8-bit channel value to linear light in [0, 1]
fn srgb_to_linear(c: f32) -> f32 {
    let c = c / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// sRGB companding forward: maps linear light in [0, 1] back to an 8-bit channel value
fn linear_to_srgb(c: f32) -> f32 {
    let c = c.clamp(0.0, 1.0);
    let v = if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    v * 255.0
}

// D65 reference white, CIE 1931 2-degree observer
const LAB_WHITE_X: f32 = 0.950_456;
const LAB_WHITE_Y: f32 = 1.0;
const LAB_WHITE_Z: f32 = 1.088_754;

fn lab_f(t: f32) -> f32 {
    const DELTA: f32 = 6.0 / 29.0;
    if t > DELTA.powi(3) {
        t.cbrt()
    } else {
        t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
    }
}

fn lab_f_inv(t: f32) -> f32 {
    const DELTA: f32 = 6.0 / 29.0;
    if t > DELTA {
        t * t * t
    } else {
        3.0 * DELTA * DELTA * (t - 4.0 / 29.0)
    }
}

/// Convert an sRGB triple to CIE L*a*b*, with L in [0, 100], a/b roughly in [-128, 127]
#[must_use]
pub fn rgb_to_lab_f32(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let rl = srgb_to_linear(f32::from(r));
    let gl = srgb_to_linear(f32::from(g));
    let bl = srgb_to_linear(f32::from(b));

    let x = (0.4124_564 * rl + 0.3575_761 * gl + 0.1804_375 * bl) / LAB_WHITE_X;
    let y = (0.2126_729 * rl + 0.7151_522 * gl + 0.0721_750 * bl) / LAB_WHITE_Y;
    let z = (0.0193_339 * rl + 0.1191_920 * gl + 0.9503_041 * bl) / LAB_WHITE_Z;

    let fx = lab_f(x);
    let fy = lab_f(y);
    let fz = lab_f(z);

    let l = 116.0 * fy - 16.0;
    let a = 500.0 * (fx - fy);
    let bb = 200.0 * (fy - fz);
    (l, a, bb)
}

/// Convert a CIE L*a*b* triple back to sRGB
#[must_use]
pub fn lab_to_rgb_f32(l: f32, a: f32, b: f32) -> (u8, u8, u8) {
    let fy = (l + 16.0) / 116.0;
    let fx = fy + a / 500.0;
    let fz = fy - b / 200.0;

    let x = lab_f_inv(fx) * LAB_WHITE_X;
    let y = lab_f_inv(fy) * LAB_WHITE_Y;
    let z = lab_f_inv(fz) * LAB_WHITE_Z;

    let rl = 3.2404_542 * x - 1.5371_385 * y - 0.4985_314 * z;
    let gl = -0.9692_660 * x + 1.8760_108 * y + 0.0415_560 * z;
    let bl = 0.0556_434 * x - 0.2040_259 * y + 1.0572_252 * z;

    (
        linear_to_srgb(rl).round() as u8,
        linear_to_srgb(gl).round() as u8,
        linear_to_srgb(bl).round() as u8,
    )
}

/// Convert RGB/BGR to CIE L*a*b*, channels rescaled to [0, 255] for 8-bit storage:
/// L -> L*255/100, a/b -> value+128 clamped to [0,255] (OpenCV convention)
fn rgb_to_lab(src: &Mat, dst: &mut Mat, is_bgr: bool) -> Result<()> {
    if src.channels() != 3 {
        return Err(Error::InvalidParameter(
            "Source must have 3 channels".to_string(),
        ));
    }

    *dst = Mat::new(src.rows(), src.cols(), 3, MatDepth::U8)?;

    for row in 0..src.rows() {
        for col in 0..src.cols() {
            let pixel = src.at(row, col)?;
            let (r, g, b) = if is_bgr {
                (pixel[2], pixel[1], pixel[0])
            } else {
                (pixel[0], pixel[1], pixel[2])
            };

            let (l, a, bb) = rgb_to_lab_f32(r, g, b);
            let dst_pixel = dst.at_mut(row, col)?;
            dst_pixel[0] = (l * 255.0 / 100.0).round().clamp(0.0, 255.0) as u8;
            dst_pixel[1] = (a + 128.0).round().clamp(0.0, 255.0) as u8;
            dst_pixel[2] = (bb + 128.0).round().clamp(0.0, 255.0) as u8;
        }
    }

    Ok(())
}

/// Convert CIE L*a*b* (stored as above) back to RGB/BGR
fn lab_to_rgb(src: &Mat, dst: &mut Mat, is_bgr: bool) -> Result<()> {
    if src.channels() != 3 {
        return Err(Error::InvalidParameter(
            "Source must have 3 channels".to_string(),
        ));
    }

    *dst = Mat::new(src.rows(), src.cols(), 3, MatDepth::U8)?;

    for row in 0..src.rows() {
        for col in 0..src.cols() {
            let pixel = src.at(row, col)?;
            let l = f32::from(pixel[0]) * 100.0 / 255.0;
            let a = f32::from(pixel[1]) - 128.0;
            let bb = f32::from(pixel[2]) - 128.0;

            let (r, g, b) = lab_to_rgb_f32(l, a, bb);
            let dst_pixel = dst.at_mut(row, col)?;
            if is_bgr {
                dst_pixel[0] = b;
                dst_pixel[1] = g;
                dst_pixel[2] = r;
            } else {
                dst_pixel[0] = r;
                dst_pixel[1] = g;
                dst_pixel[2] = b;
            }
        }
    }

    Ok(())
}

/// Convert RGB/BGR to YCrCb
fn rgb_to_ycrcb(src: &Mat, dst: &mut Mat, is_bgr: bool) -> Result<()> {
    if src.channels() != 3 {
        return Err(Error::InvalidParameter(
            "Source must have 3 channels".to_string(),
        ));
    }

    *dst = Mat::new(src.rows(), src.cols(), 3, MatDepth::U8)?;

    for row in 0..src.rows() {
        for col in 0..src.cols() {
            let pixel = src.at(row, col)?;
            let (r, g, b) = if is_bgr {
                (pixel[2], pixel[1], pixel[0])
            } else {
                (pixel[0], pixel[1], pixel[2])
            };
            let (r, g, b) = (f32::from(r), f32::from(g), f32::from(b));

            let y = 0.299 * r + 0.587 * g + 0.114 * b;
            let cr = (r - y) * 0.713 + 128.0;
            let cb = (b - y) * 0.564 + 128.0;

            let dst_pixel = dst.at_mut(row, col)?;
            dst_pixel[0] = y.round().clamp(0.0, 255.0) as u8;
            dst_pixel[1] = cr.round().clamp(0.0, 255.0) as u8;
            dst_pixel[2] = cb.round().clamp(0.0, 255.0) as u8;
        }
    }

    Ok(())
}

/// Convert YCrCb back to RGB/BGR
fn ycrcb_to_rgb(src: &Mat, dst: &mut Mat, is_bgr: bool) -> Result<()> {
    if src.channels() != 3 {
        return Err(Error::InvalidParameter(
            "Source must have 3 channels".to_string(),
        ));
    }

    *dst = Mat::new(src.rows(), src.cols(), 3, MatDepth::U8)?;

    for row in 0..src.rows() {
        for col in 0..src.cols() {
            let pixel = src.at(row, col)?;
            let y = f32::from(pixel[0]);
            let cr = f32::from(pixel[1]) - 128.0;
            let cb = f32::from(pixel[2]) - 128.0;

            let r = y + 1.403 * cr;
            let g = y - 0.714 * cr - 0.344 * cb;
            let b = y + 1.773 * cb;

            let dst_pixel = dst.at_mut(row, col)?;
            if is_bgr {
                dst_pixel[0] = b.round().clamp(0.0, 255.0) as u8;
                dst_pixel[1] = g.round().clamp(0.0, 255.0) as u8;
                dst_pixel[2] = r.round().clamp(0.0, 255.0) as u8;
            } else {
                dst_pixel[0] = r.round().clamp(0.0, 255.0) as u8;
                dst_pixel[1] = g.round().clamp(0.0, 255.0) as u8;
                dst_pixel[2] = b.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    Ok(())
}

/// Convert BGR/RGB to grayscale
fn bgr_to_gray(src: &Mat, dst: &mut Mat, is_bgr: bool) -> Result<()> {
    if src.channels() != 3 {
        return Err(Error::InvalidParameter(
            "Source must have 3 channels".to_string(),
        ));
    }

    *dst = Mat::new(src.rows(), src.cols(), 1, MatDepth::U8)?;

    for row in 0..src.rows() {
        for col in 0..src.cols() {
            let pixel = src.at(row, col)?;
            let (r, g, b) = if is_bgr {
                (pixel[2], pixel[1], pixel[0])
            } else {
                (pixel[0], pixel[1], pixel[2])
            };

            // Using standard RGB to grayscale conversion weights
            let gray = (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32) as u8;

            let dst_pixel = dst.at_mut(row, col)?;
            dst_pixel[0] = gray;
        }
    }

    Ok(())
}

/// Convert grayscale to BGR/RGB
fn gray_to_bgr(src: &Mat, dst: &mut Mat) -> Result<()> {
    if src.channels() != 1 {
        return Err(Error::InvalidParameter(
            "Source must have 1 channel".to_string(),
        ));
    }

    *dst = Mat::new(src.rows(), src.cols(), 3, MatDepth::U8)?;

    for row in 0..src.rows() {
        for col in 0..src.cols() {
            let pixel = src.at(row, col)?;
            let gray = pixel[0];

            let dst_pixel = dst.at_mut(row, col)?;
            dst_pixel[0] = gray;
            dst_pixel[1] = gray;
            dst_pixel[2] = gray;
        }
    }

    Ok(())
}

/// Swap R and B channels (BGR <-> RGB)
fn swap_rb_channels(src: &Mat, dst: &mut Mat) -> Result<()> {
    if src.channels() != 3 {
        return Err(Error::InvalidParameter(
            "Source must have 3 channels".to_string(),
        ));
    }

    *dst = Mat::new(src.rows(), src.cols(), 3, MatDepth::U8)?;

    for row in 0..src.rows() {
        for col in 0..src.cols() {
            let pixel = src.at(row, col)?;
            let dst_pixel = dst.at_mut(row, col)?;

            dst_pixel[0] = pixel[2];
            dst_pixel[1] = pixel[1];
            dst_pixel[2] = pixel[0];
        }
    }

    Ok(())
}

/// Convert RGB/BGR to HSV
fn rgb_to_hsv(src: &Mat, dst: &mut Mat, is_bgr: bool) -> Result<()> {
    if src.channels() != 3 {
        return Err(Error::InvalidParameter(
            "Source must have 3 channels".to_string(),
        ));
    }

    *dst = Mat::new(src.rows(), src.cols(), 3, MatDepth::U8)?;

    for row in 0..src.rows() {
        for col in 0..src.cols() {
            let pixel = src.at(row, col)?;
            let (r, g, b) = if is_bgr {
                (pixel[2] as f32 / 255.0, pixel[1] as f32 / 255.0, pixel[0] as f32 / 255.0)
            } else {
                (pixel[0] as f32 / 255.0, pixel[1] as f32 / 255.0, pixel[2] as f32 / 255.0)
            };

            let max = r.max(g).max(b);
            let min = r.min(g).min(b);
            let delta = max - min;

            // Hue calculation
            let h = if delta == 0.0 {
                0.0
            } else if max == r {
                60.0 * (((g - b) / delta) % 6.0)
            } else if max == g {
                60.0 * (((b - r) / delta) + 2.0)
            } else {
                60.0 * (((r - g) / delta) + 4.0)
            };

            let h = if h < 0.0 { h + 360.0 } else { h };

            // Saturation calculation
            let s = if max == 0.0 { 0.0 } else { delta / max };

            // Value
            let v = max;

            let dst_pixel = dst.at_mut(row, col)?;
            dst_pixel[0] = (h / 2.0) as u8; // OpenCV stores H in range [0, 180]
            dst_pixel[1] = (s * 255.0) as u8;
            dst_pixel[2] = (v * 255.0) as u8;
        }
    }

    Ok(())
}

/// Convert HSV to RGB/BGR
fn hsv_to_rgb(src: &Mat, dst: &mut Mat, is_bgr: bool) -> Result<()> {
    if src.channels() != 3 {
        return Err(Error::InvalidParameter(
            "Source must have 3 channels".to_string(),
        ));
    }

    *dst = Mat::new(src.rows(), src.cols(), 3, MatDepth::U8)?;

    for row in 0..src.rows() {
        for col in 0..src.cols() {
            let pixel = src.at(row, col)?;
            let h = pixel[0] as f32 * 2.0; // Convert back from [0, 180] to [0, 360]
            let s = pixel[1] as f32 / 255.0;
            let v = pixel[2] as f32 / 255.0;

            let c = v * s;
            let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
            let m = v - c;

            let (r, g, b) = if h < 60.0 {
                (c, x, 0.0)
            } else if h < 120.0 {
                (x, c, 0.0)
            } else if h < 180.0 {
                (0.0, c, x)
            } else if h < 240.0 {
                (0.0, x, c)
            } else if h < 300.0 {
                (x, 0.0, c)
            } else {
                (c, 0.0, x)
            };

            let r = ((r + m) * 255.0) as u8;
            let g = ((g + m) * 255.0) as u8;
            let b = ((b + m) * 255.0) as u8;

            let dst_pixel = dst.at_mut(row, col)?;
            if is_bgr {
                dst_pixel[0] = b;
                dst_pixel[1] = g;
                dst_pixel[2] = r;
            } else {
                dst_pixel[0] = r;
                dst_pixel[1] = g;
                dst_pixel[2] = b;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_to_gray() {
        let mut src = Mat::new(10, 10, 3, MatDepth::U8).unwrap();
        // Set a red pixel
        let pixel = src.at_mut(5, 5).unwrap();
        pixel[0] = 255;
        pixel[1] = 0;
        pixel[2] = 0;

        let mut dst = Mat::new(1, 1, 1, MatDepth::U8).unwrap();
        cvt_color(&src, &mut dst, ColorConversionCode::RgbToGray).unwrap();

        assert_eq!(dst.channels(), 1);
    }

    #[test]
    fn test_bgr_to_rgb() {
        let mut src = Mat::new(10, 10, 3, MatDepth::U8).unwrap();
        let pixel = src.at_mut(5, 5).unwrap();
        pixel[0] = 100;
        pixel[1] = 150;
        pixel[2] = 200;

        let mut dst = Mat::new(1, 1, 1, MatDepth::U8).unwrap();
        cvt_color(&src, &mut dst, ColorConversionCode::BgrToRgb).unwrap();

        let result = dst.at(5, 5).unwrap();
        assert_eq!(result[0], 200);
        assert_eq!(result[1], 150);
        assert_eq!(result[2], 100);
    }

    #[test]
    fn test_rgb_lab_roundtrip() {
        for &(r, g, b) in &[(255u8, 0u8, 0u8), (0, 255, 0), (12, 200, 64), (128, 128, 128)] {
            let (l, a, bb) = rgb_to_lab_f32(r, g, b);
            let (r2, g2, b2) = lab_to_rgb_f32(l, a, bb);
            assert!((i32::from(r) - i32::from(r2)).abs() <= 2);
            assert!((i32::from(g) - i32::from(g2)).abs() <= 2);
            assert!((i32::from(b) - i32::from(b2)).abs() <= 2);
        }
    }

    #[test]
    fn test_gray_is_achromatic_in_lab() {
        let (_l, a, b) = rgb_to_lab_f32(128, 128, 128);
        assert!(a.abs() < 0.5);
        assert!(b.abs() < 0.5);
    }
}
