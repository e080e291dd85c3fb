//! Single-block descriptor computation: tri-linear histogram accumulation
//! plus normalization.
//!
//! The interpolation scheme is grounded on
//! `lear/cvision/phistogram.h`'s `PrecisionHistogram::push`: each pixel casts
//! a vote that is tri-linearly split across its 8 neighboring (cell_x,
//! cell_y, bin) corners. The orientation axis is circular ("warped" in the
//! original): the vote wraps around bin 0/num_bins. The two spatial axes are
//! not: a corner outside [0, cells) contributes nothing rather than
//! wrapping, matching the original's `lowervalid`/`uppervalid` gating.

use crate::error::{Error, Result};
use crate::objdetect::block::BlockSpec;
use crate::objdetect::gradient::GradientField;

/// Computes the flattened `(cells_y, cells_x, num_bins)`-ordered, normalized
/// descriptor for the block whose top-left pixel in `field` is `(x0, y0)`.
pub fn compute_block_descriptor(
    field: &GradientField,
    spec: &BlockSpec,
    x0: usize,
    y0: usize,
) -> Result<Vec<f32>> {
    let (block_w, block_h) = spec.block_extent();
    if x0 + block_w > field.width() || y0 + block_h > field.height() {
        return Err(Error::OutOfRange(format!(
            "block at ({x0}, {y0}) with extent {block_w}x{block_h} exceeds field extent {}x{}",
            field.width(),
            field.height()
        )));
    }

    let cells_x = spec.cells_x();
    let cells_y = spec.cells_y();
    let num_bins = spec.num_bins();
    let bin_width = spec.bin_width_degrees();
    let cell_w = spec.cell_width() as f32;
    let cell_h = spec.cell_height() as f32;

    let mut hist = vec![0.0f32; cells_x * cells_y * num_bins];

    let gaussian = spatial_gaussian(spec);

    for py in 0..block_h {
        for px in 0..block_w {
            let (mag, ori) = field.at(x0 + px, y0 + py);
            if mag <= 0.0 {
                continue;
            }
            let weight = match &gaussian {
                Some(w) => w[py * block_w + px],
                None => 1.0,
            };
            let vote = mag * weight;

            let cx_f = (px as f32 + 0.5) / cell_w - 0.5;
            let cy_f = (py as f32 + 0.5) / cell_h - 0.5;
            let bin_f = ori as f32 / bin_width - 0.5;

            accumulate_trilinear(
                &mut hist, cells_x, cells_y, num_bins, cx_f, cy_f, bin_f, vote,
            );
        }
    }

    spec.normalizer().apply(&mut hist)?;
    Ok(hist)
}

/// Splits one pixel's vote across the 8 (cell_x, cell_y, bin) corners that
/// bracket the continuous coordinate `(cx_f, cy_f, bin_f)`.
#[allow(clippy::too_many_arguments)]
fn accumulate_trilinear(
    hist: &mut [f32],
    cells_x: usize,
    cells_y: usize,
    num_bins: usize,
    cx_f: f32,
    cy_f: f32,
    bin_f: f32,
    vote: f32,
) {
    let cx_lo = cx_f.floor();
    let cx_frac = cx_f - cx_lo;
    let cx_lo_i = cx_lo as i32;

    let cy_lo = cy_f.floor();
    let cy_frac = cy_f - cy_lo;
    let cy_lo_i = cy_lo as i32;

    let bin_lo = bin_f.floor();
    let bin_frac = bin_f - bin_lo;
    let bin_lo_i = bin_lo as i32;

    let x_corners = [(cx_lo_i, 1.0 - cx_frac), (cx_lo_i + 1, cx_frac)];
    let y_corners = [(cy_lo_i, 1.0 - cy_frac), (cy_lo_i + 1, cy_frac)];
    let b_corners = [(bin_lo_i, 1.0 - bin_frac), (bin_lo_i + 1, bin_frac)];

    for &(cxi, xw) in &x_corners {
        if cxi < 0 || cxi >= cells_x as i32 {
            continue;
        }
        for &(cyi, yw) in &y_corners {
            if cyi < 0 || cyi >= cells_y as i32 {
                continue;
            }
            for &(bi, bw) in &b_corners {
                let w = xw * yw * bw;
                if w <= 0.0 {
                    continue;
                }
                let wrapped = bi.rem_euclid(num_bins as i32) as usize;
                let idx = (cyi as usize * cells_x + cxi as usize) * num_bins + wrapped;
                hist[idx] += w * vote;
            }
        }
    }
}

/// Centered anisotropic Gaussian weight over the block's pixel extent, or
/// `None` if `sigma_w` is below the activation threshold.
fn spatial_gaussian(spec: &BlockSpec) -> Option<Vec<f32>> {
    if spec.sigma_w() < 1e-3 {
        return None;
    }
    let (block_w, block_h) = spec.block_extent();
    let std_x = block_w as f32 / (2.0 * spec.sigma_w());
    let std_y = block_h as f32 / (2.0 * spec.sigma_w());
    let center_x = (block_w as f32 - 1.0) / 2.0;
    let center_y = (block_h as f32 - 1.0) / 2.0;

    let mut weights = vec![0.0f32; block_w * block_h];
    for py in 0..block_h {
        for px in 0..block_w {
            let dx = px as f32 - center_x;
            let dy = py as f32 - center_y;
            let e = dx * dx / (2.0 * std_x * std_x) + dy * dy / (2.0 * std_y * std_y);
            weights[py * block_w + px] = (-e).exp();
        }
    }
    Some(weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Mat, MatDepth};
    use crate::objdetect::gradient::{compute_gradient_field, Preprocessor};
    use crate::objdetect::normalizer::Normalizer;

    fn spec(normalizer: Normalizer) -> BlockSpec {
        BlockSpec::new(8, 8, 2, 2, 9, true, 0.0, normalizer, Preprocessor::RgbGrad, 0.0).unwrap()
    }

    #[test]
    fn test_descriptor_length_matches_spec() {
        let mut img = Mat::new(16, 16, 1, MatDepth::U8).unwrap();
        for y in 0..16 {
            for x in 0..16 {
                img.at_mut(y, x).unwrap()[0] = ((x * 16) % 256) as u8;
            }
        }
        let field = compute_gradient_field(&img, Preprocessor::RgbGrad, 0.0, true).unwrap();
        let s = spec(Normalizer::L2Hys);
        let d = compute_block_descriptor(&field, &s, 0, 0).unwrap();
        assert_eq!(d.len(), s.descriptor_length());
    }

    #[test]
    fn test_flat_field_yields_zero_descriptor() {
        let img = Mat::new_with_default(
            16,
            16,
            1,
            MatDepth::U8,
            crate::core::types::Scalar::all(100.0),
        )
        .unwrap();
        let field = compute_gradient_field(&img, Preprocessor::RgbGrad, 0.0, true).unwrap();
        let s = spec(Normalizer::None);
        let d = compute_block_descriptor(&field, &s, 0, 0).unwrap();
        assert!(d.iter().all(|&v| v.abs() < 1e-6));
    }

    #[test]
    fn test_out_of_range_block_rejected() {
        let img = Mat::new(16, 16, 1, MatDepth::U8).unwrap();
        let field = compute_gradient_field(&img, Preprocessor::RgbGrad, 0.0, true).unwrap();
        let s = spec(Normalizer::L2);
        assert!(compute_block_descriptor(&field, &s, 10, 10).is_err());
    }

    #[test]
    fn test_trilinear_conserves_total_vote_mass_near_center() {
        // A single corner-aligned vote with integer coordinates should land
        // entirely in one (cell, bin) triple.
        let mut hist = vec![0.0f32; 2 * 2 * 4];
        accumulate_trilinear(&mut hist, 2, 2, 4, 0.0, 0.0, 0.0, 1.0);
        let total: f32 = hist.iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert!((hist[0] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_orientation_wraps_circularly() {
        let mut hist = vec![0.0f32; 1 * 1 * 4];
        // bin_f = -0.5 sits exactly between bin 3 (wrap of -1) and bin 0.
        accumulate_trilinear(&mut hist, 1, 1, 4, 0.0, 0.0, -0.5, 1.0);
        assert!(hist[3] > 0.0);
        assert!(hist[0] > 0.0);
    }
}
