//! Frozen descriptor recipe for a single HOG block, grounded on
//! `lear/cvision/rhogdense.h`'s fixed construction parameters.

use crate::error::{Error, Result};
use crate::objdetect::gradient::Preprocessor;
use crate::objdetect::normalizer::Normalizer;

/// Immutable configuration describing how one block's descriptor is computed.
///
/// Constructed once per detector configuration and shared (via `Arc`) between
/// the `WindowSpec` that lays blocks out spatially and the `DescriptorEngine`
/// that evaluates them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockSpec {
    cell_width: usize,
    cell_height: usize,
    cells_x: usize,
    cells_y: usize,
    num_bins: usize,
    semicircular: bool,
    sigma_w: f32,
    normalizer: Normalizer,
    preprocessor: Preprocessor,
    sigma_g: f32,
}

impl BlockSpec {
    /// Builds a validated block specification.
    ///
    /// `cell_width`/`cell_height` are pixel dimensions of one cell.
    /// `cells_x`/`cells_y` is the block extent in cells. `num_bins` is the
    /// orientation resolution. `sigma_w` < 1e-3 disables the spatial Gaussian
    /// weighting window.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cell_width: usize,
        cell_height: usize,
        cells_x: usize,
        cells_y: usize,
        num_bins: usize,
        semicircular: bool,
        sigma_w: f32,
        normalizer: Normalizer,
        preprocessor: Preprocessor,
        sigma_g: f32,
    ) -> Result<Self> {
        if cell_width == 0 || cell_height == 0 {
            return Err(Error::InvalidConfiguration(
                "cell dimensions must be positive".to_string(),
            ));
        }
        if cells_x == 0 || cells_y == 0 {
            return Err(Error::InvalidConfiguration(
                "block must span at least one cell in each axis".to_string(),
            ));
        }
        if num_bins == 0 {
            return Err(Error::InvalidConfiguration(
                "bin count must be positive".to_string(),
            ));
        }
        if sigma_g < 0.0 || sigma_w < 0.0 {
            return Err(Error::InvalidConfiguration(
                "sigma parameters must be non-negative".to_string(),
            ));
        }
        Ok(Self {
            cell_width,
            cell_height,
            cells_x,
            cells_y,
            num_bins,
            semicircular,
            sigma_w,
            normalizer,
            preprocessor,
            sigma_g,
        })
    }

    #[must_use]
    pub fn cell_width(&self) -> usize {
        self.cell_width
    }

    #[must_use]
    pub fn cell_height(&self) -> usize {
        self.cell_height
    }

    #[must_use]
    pub fn cells_x(&self) -> usize {
        self.cells_x
    }

    #[must_use]
    pub fn cells_y(&self) -> usize {
        self.cells_y
    }

    #[must_use]
    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    #[must_use]
    pub fn semicircular(&self) -> bool {
        self.semicircular
    }

    #[must_use]
    pub fn sigma_w(&self) -> f32 {
        self.sigma_w
    }

    #[must_use]
    pub fn normalizer(&self) -> Normalizer {
        self.normalizer
    }

    #[must_use]
    pub fn preprocessor(&self) -> Preprocessor {
        self.preprocessor
    }

    #[must_use]
    pub fn sigma_g(&self) -> f32 {
        self.sigma_g
    }

    /// Block extent in pixels: `(cells_x * cell_width, cells_y * cell_height)`.
    #[must_use]
    pub fn block_extent(&self) -> (usize, usize) {
        (self.cells_x * self.cell_width, self.cells_y * self.cell_height)
    }

    /// Length of the flattened descriptor this block produces: `cells_x * cells_y * num_bins`.
    #[must_use]
    pub fn descriptor_length(&self) -> usize {
        self.cells_x * self.cells_y * self.num_bins
    }

    /// Degrees spanned by one orientation bin (180/num_bins if semicircular, else 360/num_bins).
    #[must_use]
    pub fn bin_width_degrees(&self) -> f32 {
        let span = if self.semicircular { 180.0 } else { 360.0 };
        span / self.num_bins as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_spec() -> BlockSpec {
        BlockSpec::new(
            8,
            8,
            2,
            2,
            9,
            true,
            0.0,
            Normalizer::L2Hys,
            Preprocessor::RgbGrad,
            0.0,
        )
        .unwrap()
    }

    #[test]
    fn test_block_extent_and_length() {
        let spec = default_spec();
        assert_eq!(spec.block_extent(), (16, 16));
        assert_eq!(spec.descriptor_length(), 2 * 2 * 9);
    }

    #[test]
    fn test_bin_width_semicircular_vs_full() {
        let spec = default_spec();
        assert!((spec.bin_width_degrees() - 20.0).abs() < 1e-6);

        let full = BlockSpec::new(
            8,
            8,
            2,
            2,
            9,
            false,
            0.0,
            Normalizer::L2Hys,
            Preprocessor::RgbGrad,
            0.0,
        )
        .unwrap();
        assert!((full.bin_width_degrees() - 40.0).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_zero_cell_size() {
        assert!(BlockSpec::new(
            0,
            8,
            2,
            2,
            9,
            true,
            0.0,
            Normalizer::L2Hys,
            Preprocessor::RgbGrad,
            0.0
        )
        .is_err());
    }

    #[test]
    fn test_rejects_zero_bins() {
        assert!(BlockSpec::new(
            8,
            8,
            2,
            2,
            0,
            true,
            0.0,
            Normalizer::L2Hys,
            Preprocessor::RgbGrad,
            0.0
        )
        .is_err());
    }
}
