//! Mode-finding non-maximum suppression: scale-space mean-shift.
//!
//! Grounded on `lear/cvision/meanshift.h`'s `Meanshift`/`BasicWtMeanshift`
//! (weighted mean-shift with an anisotropic Gaussian kernel, iterate to a
//! fixed-point "mode" with a squared-distance convergence test and an
//! iteration cap) and `lear/cvision/transfunc.h`'s `TransFunc`/`Sigmoid`/
//! `SoftMax`/`HardMax` (raw-score-to-mean-shift-weight transfer functions).
//! Points live in `(center_x, center_y, ln(scale))` scale-space so a single
//! isotropic-per-axis kernel can merge detections across both space and
//! scale.

use tracing::debug;

use crate::error::{Error, Result};
use crate::objdetect::detection::{FinalDetection, RawDetection};

/// Maps a raw classifier score to a non-negative mean-shift weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransferFunction {
    /// `t(w) = w` (no reshaping; caller is responsible for non-negativity).
    Identity,
    /// `t(w) = 1 / (1 + exp(scale*w + center))`.
    Sigmoid { scale: f32, center: f32 },
    /// `t(w) = log(1 + exp(scale*(w - center))) / scale` — a smooth, always
    /// non-negative soft-clip.
    SoftMax { scale: f32, center: f32 },
    /// `t(w) = max(scale*(w - center), 0)` — a hard clip at `center`.
    HardMax { scale: f32, center: f32 },
}

impl TransferFunction {
    #[must_use]
    pub fn apply(self, score: f32) -> f32 {
        match self {
            TransferFunction::Identity => score,
            TransferFunction::Sigmoid { scale, center } => {
                1.0 / (1.0 + (scale * score + center).exp())
            }
            TransferFunction::SoftMax { scale, center } => {
                (1.0 + (scale * (score - center)).exp()).ln() / scale
            }
            TransferFunction::HardMax { scale, center } => {
                (scale * (score - center)).max(0.0)
            }
        }
    }
}

/// Configuration for scale-space mean-shift mode finding.
#[derive(Debug, Clone, Copy)]
pub struct NmsConfig {
    /// Kernel bandwidth along the x axis, in source-image pixels.
    pub sigma_cx: f32,
    /// Kernel bandwidth along the y axis, in source-image pixels.
    pub sigma_cy: f32,
    /// Kernel bandwidth along the `ln(scale)` axis.
    pub sigma_log_scale: f32,
    /// Squared-distance convergence threshold in kernel-normalized units.
    pub mode_epsilon: f32,
    /// Iteration cap for `shift_to_mode`.
    pub max_iterations: u32,
    /// Modes whose kernel-normalized distance is below this are merged.
    pub mode_dedup_epsilon: f32,
    /// Minimum accumulated density for a mode to be emitted.
    pub density_threshold: f32,
    /// Detection window extent at scale 1, used to reconstruct a final
    /// bounding box from a converged `(cx, cy, ln(scale))` mode.
    pub window_width: f32,
    pub window_height: f32,
    pub transfer: TransferFunction,
}

impl Default for NmsConfig {
    fn default() -> Self {
        Self {
            sigma_cx: 8.0,
            sigma_cy: 16.0,
            sigma_log_scale: 0.5,
            mode_epsilon: 1e-5,
            max_iterations: 100,
            mode_dedup_epsilon: 1.0,
            density_threshold: 0.0,
            window_width: 64.0,
            window_height: 128.0,
            transfer: TransferFunction::Identity,
        }
    }
}

impl NmsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sigma_cx <= 0.0 || self.sigma_cy <= 0.0 || self.sigma_log_scale <= 0.0 {
            return Err(Error::InvalidConfiguration(
                "mean-shift bandwidths must be positive".to_string(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(Error::InvalidConfiguration(
                "max_iterations must be positive".to_string(),
            ));
        }
        if self.window_width <= 0.0 || self.window_height <= 0.0 {
            return Err(Error::InvalidConfiguration(
                "window extent must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct Point3 {
    cx: f32,
    cy: f32,
    log_scale: f32,
}

/// The kernel bandwidth effective at `p`: `(sigma_cx, sigma_cy)` widen with
/// `p`'s scale (`sigma * exp(log_scale)`), `sigma_log_scale` does not, per
/// `DensityKernel::nvalue`'s `ns[0] *= exp(x[2]); ns[1] *= exp(x[2]);`.
fn effective_sigma(p: Point3, cfg: &NmsConfig) -> (f32, f32, f32) {
    let s = p.log_scale.exp();
    (cfg.sigma_cx * s, cfg.sigma_cy * s, cfg.sigma_log_scale)
}

/// Squared Mahalanobis distance between `a` and `b`, using the bandwidth
/// effective at `b` (the data point in every call site below), matching
/// `DensityKernel::distsq(a, b)`'s `ns` scaled by `b`'s scale.
fn normalized_distsq(a: Point3, b: Point3, cfg: &NmsConfig) -> f32 {
    let (sx, sy, sz) = effective_sigma(b, cfg);
    let dx = (a.cx - b.cx) / sx;
    let dy = (a.cy - b.cy) / sy;
    let ds = (a.log_scale - b.log_scale) / sz;
    dx * dx + dy * dy + ds * ds
}

fn kernel_weight(a: Point3, b: Point3, wt: f32, cfg: &NmsConfig) -> f32 {
    wt * (-normalized_distsq(a, b, cfg) / 2.0).exp()
}

/// Weighted mean of `points` around `at`, using the anisotropic Gaussian
/// kernel: `nvalue` in the original. Each axis accumulates its own
/// reciprocal-bandwidth-weighted numerator and denominator (`numer += w*x;
/// denom += w/ns;`, per-axis, in `DensityKernel::nvalue`) rather than a
/// single kernel-weight sum shared across axes, so points with a wider
/// local kernel (larger scale) contribute proportionally less to the x/y
/// mean.
fn nvalue(at: Point3, points: &[Point3], weights: &[f32], cfg: &NmsConfig) -> Point3 {
    let mut num_cx = 0.0f32;
    let mut denom_cx = 0.0f32;
    let mut num_cy = 0.0f32;
    let mut denom_cy = 0.0f32;
    let mut num_ls = 0.0f32;
    let mut denom_ls = 0.0f32;
    for (p, &w) in points.iter().zip(weights.iter()) {
        let k = kernel_weight(at, *p, w, cfg);
        let (sx, sy, sz) = effective_sigma(*p, cfg);
        let wcx = k / sx;
        let wcy = k / sy;
        let wls = k / sz;
        num_cx += wcx * p.cx;
        denom_cx += wcx;
        num_cy += wcy * p.cy;
        denom_cy += wcy;
        num_ls += wls * p.log_scale;
        denom_ls += wls;
    }
    if denom_cx <= 0.0 || denom_cy <= 0.0 || denom_ls <= 0.0 {
        return at;
    }
    Point3 {
        cx: num_cx / denom_cx,
        cy: num_cy / denom_cy,
        log_scale: num_ls / denom_ls,
    }
}

/// Accumulated kernel density at `at`: `fvalue` in the original.
fn fvalue(at: Point3, points: &[Point3], weights: &[f32], cfg: &NmsConfig) -> f32 {
    points
        .iter()
        .zip(weights.iter())
        .map(|(p, &w)| kernel_weight(at, *p, w, cfg))
        .sum()
}

fn shift_to_mode(start: Point3, points: &[Point3], weights: &[f32], cfg: &NmsConfig) -> Point3 {
    let mut current = start;
    let mut count = 0;
    loop {
        let next = nvalue(current, points, weights, cfg);
        count += 1;
        let converged = normalized_distsq(next, current, cfg) <= cfg.mode_epsilon;
        current = next;
        if converged || count >= cfg.max_iterations {
            break;
        }
    }
    current
}

/// Clusters `raw` detections into final object hypotheses via scale-space
/// mean-shift mode finding.
pub fn mean_shift_nms(raw: &[RawDetection], cfg: &NmsConfig) -> Result<Vec<FinalDetection>> {
    cfg.validate()?;

    let mut points = Vec::with_capacity(raw.len());
    let mut weights = Vec::with_capacity(raw.len());
    for r in raw {
        let w = cfg.transfer.apply(r.score);
        if w > 0.0 {
            points.push(Point3 {
                cx: r.cx,
                cy: r.cy,
                log_scale: r.scale.ln(),
            });
            weights.push(w);
        }
    }

    if points.is_empty() {
        debug!("mean-shift received no positively-weighted detections");
        return Ok(Vec::new());
    }

    let converged: Vec<Point3> = points
        .iter()
        .map(|&p| shift_to_mode(p, &points, &weights, cfg))
        .collect();

    let mut modes: Vec<Point3> = Vec::new();
    let dedup_epsilon_sq = cfg.mode_dedup_epsilon * cfg.mode_dedup_epsilon;
    for &m in &converged {
        let duplicate = modes
            .iter()
            .any(|&existing| normalized_distsq(m, existing, cfg) < dedup_epsilon_sq);
        if !duplicate {
            modes.push(m);
        }
    }
    debug!(raw = raw.len(), modes = modes.len(), "mean-shift converged");

    let mut out = Vec::new();
    for m in modes {
        let density = fvalue(m, &points, &weights, cfg);
        if density < cfg.density_threshold {
            continue;
        }
        let scale = m.log_scale.exp();
        out.push(FinalDetection {
            cx: m.cx,
            cy: m.cy,
            width: cfg.window_width * scale,
            height: cfg.window_height * scale,
            scale,
            density,
        });
    }
    Ok(out)
}
