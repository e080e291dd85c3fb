//! Block-descriptor normalizers, grounded on `lear/cvision/dnormalizer.h`.
//!
//! Nine variants are kept: the three modern epsilon-stabilized norms (L1,
//! L1Sqrt, L2) plus the hysteresis-clipped L2Hys, and four "traditional"
//! counterparts that force the divisor to 1 whenever the natural norm falls
//! below `eps * vec.len()` (rather than adding the epsilon term in).

use crate::error::{Error, Result};

/// Selects how a raw block histogram is normalized before it enters a
/// `WindowDescriptor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalizer {
    /// No normalization; raw histogram values pass through unchanged.
    None,
    /// `v / (||v||_1 + eps*len)`.
    L1,
    /// `sqrt(v / (||v||_1 + eps*len))`.
    L1Sqrt,
    /// `v / (||v||_2 + eps*len)`.
    L2,
    /// L2 followed by clipping each component to 0.2 and renormalizing.
    L2Hys,
    /// `v / ||v||_1`, divisor forced to 1 when `||v||_1 < eps*len`.
    L1Trad,
    /// `v / ||v||_2`, divisor forced to 1 when `||v||_2 < eps*len`.
    L2Trad,
    /// `L2Trad` followed by clipping to 0.2 and renormalizing with the same
    /// divisor-forced-to-1 rule.
    L2TradHys,
    /// `sqrt(v / ||v||_1)`, divisor forced to 1 when `||v||_1 < eps*len`.
    L1TradSqrt,
}

const EPS: f32 = 1e-3;
const HYS_CLIP: f32 = 0.2;

impl Normalizer {
    /// Normalizes `v` in place.
    pub fn apply(self, v: &mut [f32]) -> Result<()> {
        if v.is_empty() {
            return Err(Error::InvalidParameter(
                "cannot normalize an empty block descriptor".to_string(),
            ));
        }
        match self {
            Normalizer::None => {}
            Normalizer::L1 => {
                let norm = l1_norm(v) + EPS * v.len() as f32;
                scale(v, 1.0 / norm);
            }
            Normalizer::L1Sqrt => {
                let norm = l1_norm(v) + EPS * v.len() as f32;
                scale(v, 1.0 / norm);
                for x in v.iter_mut() {
                    *x = x.max(0.0).sqrt();
                }
            }
            Normalizer::L2 => {
                let norm = l2_norm_sq(v).sqrt() + EPS * v.len() as f32;
                scale(v, 1.0 / norm);
            }
            Normalizer::L2Hys => {
                let norm = l2_norm_sq(v).sqrt() + EPS * v.len() as f32;
                scale(v, 1.0 / norm);
                clip(v, HYS_CLIP);
                let norm2 = l2_norm_sq(v).sqrt() + EPS * v.len() as f32;
                scale(v, 1.0 / norm2);
            }
            Normalizer::L1Trad => {
                let norm = trad_norm(l1_norm(v), v.len());
                scale(v, 1.0 / norm);
            }
            Normalizer::L2Trad => {
                let norm = trad_norm(l2_norm_sq(v).sqrt(), v.len());
                scale(v, 1.0 / norm);
            }
            Normalizer::L2TradHys => {
                let norm = trad_norm(l2_norm_sq(v).sqrt(), v.len());
                scale(v, 1.0 / norm);
                clip(v, HYS_CLIP);
                let norm2 = trad_norm(l2_norm_sq(v).sqrt(), v.len());
                scale(v, 1.0 / norm2);
            }
            Normalizer::L1TradSqrt => {
                let norm = trad_norm(l1_norm(v), v.len());
                scale(v, 1.0 / norm);
                for x in v.iter_mut() {
                    *x = x.max(0.0).sqrt();
                }
            }
        }
        Ok(())
    }
}

/// Forces the divisor to 1 once the raw norm falls below `eps * vec.size()`,
/// matching `L1TradNormalizer`/`L2TradNormalizer::doit`'s `if (norm <
/// epsilon*vec.size()) norm = 1;`.
fn trad_norm(norm: f32, len: usize) -> f32 {
    if norm < EPS * len as f32 {
        1.0
    } else {
        norm
    }
}

fn l1_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x.abs()).sum()
}

fn l2_norm_sq(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum()
}

fn scale(v: &mut [f32], factor: f32) {
    for x in v.iter_mut() {
        *x *= factor;
    }
}

fn clip(v: &mut [f32], bound: f32) {
    for x in v.iter_mut() {
        *x = x.min(bound);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_unit_norm() {
        let mut v = vec![3.0, 4.0];
        Normalizer::L2.apply(&mut v).unwrap();
        let norm = (v[0] * v[0] + v[1] * v[1]).sqrt();
        assert!((norm - 1.0).abs() < 1e-2);
    }

    #[test]
    fn test_l1_sums_to_one() {
        let mut v = vec![1.0, 2.0, 3.0, 4.0];
        Normalizer::L1.apply(&mut v).unwrap();
        let sum: f32 = v.iter().sum();
        assert!((sum - 1.0).abs() < 1e-2);
    }

    #[test]
    fn test_none_is_identity() {
        let mut v = vec![5.0, -2.0, 0.5];
        let orig = v.clone();
        Normalizer::None.apply(&mut v).unwrap();
        assert_eq!(v, orig);
    }

    #[test]
    fn test_hys_clips_large_components() {
        let mut v = vec![100.0, 0.001, 0.001, 0.001];
        Normalizer::L2Hys.apply(&mut v).unwrap();
        assert!(v[0] <= HYS_CLIP + 1e-6);
    }

    #[test]
    fn test_trad_divisor_forced_to_one_for_small_vectors() {
        // ||v||_2 ~ 1.4e-4, well under eps*len = 1e-3*2 = 2e-3.
        let mut v = vec![1e-4, 1e-4];
        let orig = v.clone();
        Normalizer::L2Trad.apply(&mut v).unwrap();
        assert_eq!(v, orig);
    }

    #[test]
    fn test_trad_divisor_is_raw_norm_above_threshold() {
        let mut v = vec![3.0, 4.0];
        Normalizer::L2Trad.apply(&mut v).unwrap();
        assert!((v[0] - 0.6).abs() < 1e-5);
        assert!((v[1] - 0.8).abs() < 1e-5);
    }

    #[test]
    fn test_empty_descriptor_rejected() {
        let mut v: Vec<f32> = vec![];
        assert!(Normalizer::L2.apply(&mut v).is_err());
    }
}
