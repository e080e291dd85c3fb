//! Linear SVM model loading and scoring.
//!
//! The file layout is grounded on `lib/windetect.cpp`'s `LinearClassify`
//! constructor: a 10-byte version tag, an `i32` version number, then the
//! SVM-light model header (kernel type, kernel hyperparameters ignored for a
//! linear kernel, the custom-kernel string, corpus statistics), the bias,
//! and finally `totwords + 1` `f64` weights (index 0 is a legacy SVM-light
//! placeholder and is dropped; indices `1..=totwords` are the descriptor
//! weights actually used by `score`).

use std::io::{Read, Seek};

use binrw::BinRead;

use crate::error::{Error, Result};

const VERSION_TAG: &[u8; 10] = b"V6.01\0\0\0\0\0";
const MIN_VERSION: i32 = 200;
const LINEAR_KERNEL: i64 = 0;

#[derive(BinRead)]
#[br(little)]
struct RawModelHeader {
    version_tag: [u8; 10],
    version: i32,
    kernel_type: i64,
    _poly_degree: i64,
    _rbf_gamma: f64,
    _coef_lin: f64,
    _coef_const: f64,
    custom_len: i64,
    #[br(count = custom_len)]
    _custom: Vec<u8>,
    totwords: i64,
    _totdoc: i64,
    _sv_num: i64,
    bias: f64,
    #[br(count = totwords + 1)]
    weights_raw: Vec<f64>,
}

/// A trained linear classifier: `score(d) = <weights, d> - bias`.
#[derive(Debug, Clone)]
pub struct LinearModel {
    weights: Vec<f32>,
    bias: f32,
}

impl LinearModel {
    /// Builds a model directly from weights and bias, validating non-emptiness.
    pub fn new(weights: Vec<f32>, bias: f32) -> Result<Self> {
        if weights.is_empty() {
            return Err(Error::InvalidConfiguration(
                "linear model must have at least one weight".to_string(),
            ));
        }
        Ok(Self { weights, bias })
    }

    /// Parses a `V6.01` SVM-light-format model file from `reader`.
    pub fn load_reader<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let raw = RawModelHeader::read(reader)
            .map_err(|e| Error::InvalidFormat(format!("malformed model file: {e}")))?;

        if &raw.version_tag[..6] != &VERSION_TAG[..6] {
            return Err(Error::FormatMismatch {
                expected: "V6.01".to_string(),
                actual: String::from_utf8_lossy(&raw.version_tag).trim_end_matches('\0').to_string(),
            });
        }
        if raw.version < MIN_VERSION {
            return Err(Error::InvalidFormat(format!(
                "model file version {} predates minimum supported version {MIN_VERSION}",
                raw.version
            )));
        }
        if raw.kernel_type != LINEAR_KERNEL {
            return Err(Error::UnsupportedOperation(
                "only linear-kernel model files are supported".to_string(),
            ));
        }
        if raw.totwords <= 0 {
            return Err(Error::InvalidFormat(
                "model file declares zero descriptor weights".to_string(),
            ));
        }

        let weights: Vec<f32> = raw.weights_raw[1..].iter().map(|&w| w as f32).collect();
        Self::new(weights, raw.bias as f32)
    }

    /// Parses a `V6.01` model file from disk.
    pub fn load_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let mut f = std::fs::File::open(path)?;
        Self::load_reader(&mut f)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// `<weights, descriptor> - bias`.
    pub fn score(&self, descriptor: &[f32]) -> Result<f32> {
        if descriptor.len() != self.weights.len() {
            return Err(Error::DimensionMismatch {
                expected: self.weights.len(),
                actual: descriptor.len(),
            });
        }
        let dot: f32 = self
            .weights
            .iter()
            .zip(descriptor.iter())
            .map(|(w, d)| w * d)
            .sum();
        Ok(dot - self.bias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode_model(weights: &[f64], bias: f64) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"V6.01\0\0\0\0\0");
        buf.extend_from_slice(&200i32.to_le_bytes());
        buf.extend_from_slice(&0i64.to_le_bytes()); // kernel_type
        buf.extend_from_slice(&0i64.to_le_bytes()); // poly_degree
        buf.extend_from_slice(&0f64.to_le_bytes()); // rbf_gamma
        buf.extend_from_slice(&0f64.to_le_bytes()); // coef_lin
        buf.extend_from_slice(&0f64.to_le_bytes()); // coef_const
        buf.extend_from_slice(&0i64.to_le_bytes()); // custom_len
        buf.extend_from_slice(&(weights.len() as i64).to_le_bytes()); // totwords
        buf.extend_from_slice(&0i64.to_le_bytes()); // totdoc
        buf.extend_from_slice(&0i64.to_le_bytes()); // sv_num
        buf.extend_from_slice(&bias.to_le_bytes());
        buf.extend_from_slice(&0f64.to_le_bytes()); // weights_raw[0], unused placeholder
        for w in weights {
            buf.extend_from_slice(&w.to_le_bytes());
        }
        buf
    }

    #[test]
    fn test_load_valid_model() {
        let bytes = encode_model(&[1.0, 2.0, 3.0], 0.5);
        let mut cursor = Cursor::new(bytes);
        let model = LinearModel::load_reader(&mut cursor).unwrap();
        assert_eq!(model.len(), 3);
        let score = model.score(&[1.0, 1.0, 1.0]).unwrap();
        assert!((score - 5.5).abs() < 1e-5);
    }

    #[test]
    fn test_rejects_bad_version_tag() {
        let mut bytes = encode_model(&[1.0], 0.0);
        bytes[0] = b'X';
        let mut cursor = Cursor::new(bytes);
        assert!(LinearModel::load_reader(&mut cursor).is_err());
    }

    #[test]
    fn test_score_dimension_mismatch() {
        let model = LinearModel::new(vec![1.0, 2.0], 0.0).unwrap();
        assert!(model.score(&[1.0]).is_err());
    }

    #[test]
    fn test_rejects_empty_weights() {
        assert!(LinearModel::new(vec![], 0.0).is_err());
    }
}
