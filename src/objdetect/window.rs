//! Detection window layout: which blocks, at which offsets, make up one
//! window descriptor.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::objdetect::block::BlockSpec;

/// One block recipe placed on a regular grid inside the detection window.
#[derive(Debug, Clone)]
struct BlockLayout {
    spec: Arc<BlockSpec>,
    stride_x: usize,
    stride_y: usize,
    offsets: Vec<(usize, usize)>,
}

/// Detection window extent, stride, and the ordered set of block layouts
/// that together produce one `WindowDescriptor`.
#[derive(Debug, Clone)]
pub struct WindowSpec {
    width: usize,
    height: usize,
    layouts: Vec<BlockLayout>,
}

impl WindowSpec {
    /// Builds a window spec from `width`x`height` and a list of
    /// `(block spec, block stride x, block stride y)` triples. Blocks are
    /// laid out on a row-major grid of offsets `(0, stride_y, 2*stride_y, ...)`
    /// x `(0, stride_x, 2*stride_x, ...)` clipped to fit inside the window.
    pub fn new(
        width: usize,
        height: usize,
        blocks: Vec<(Arc<BlockSpec>, usize, usize)>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidConfiguration(
                "window dimensions must be positive".to_string(),
            ));
        }
        if blocks.is_empty() {
            return Err(Error::InvalidConfiguration(
                "window must contain at least one block".to_string(),
            ));
        }

        let mut layouts = Vec::with_capacity(blocks.len());
        for (spec, stride_x, stride_y) in blocks {
            if stride_x == 0 || stride_y == 0 {
                return Err(Error::InvalidConfiguration(
                    "block stride must be positive".to_string(),
                ));
            }
            let (block_w, block_h) = spec.block_extent();
            if block_w > width || block_h > height {
                return Err(Error::InvalidConfiguration(
                    "block extent exceeds window extent".to_string(),
                ));
            }
            let mut offsets = Vec::new();
            let mut y = 0;
            while y + block_h <= height {
                let mut x = 0;
                while x + block_w <= width {
                    offsets.push((x, y));
                    x += stride_x;
                }
                y += stride_y;
            }
            layouts.push(BlockLayout {
                spec,
                stride_x,
                stride_y,
                offsets,
            });
        }

        Ok(Self {
            width,
            height,
            layouts,
        })
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Total length of the concatenated window descriptor.
    #[must_use]
    pub fn descriptor_length(&self) -> usize {
        self.layouts
            .iter()
            .map(|l| l.offsets.len() * l.spec.descriptor_length())
            .sum()
    }

    /// Iterates `(block spec, block top-left offset within the window)` in
    /// the stable order used to assemble a `WindowDescriptor`.
    pub fn iter_blocks(&self) -> impl Iterator<Item = (&Arc<BlockSpec>, (usize, usize))> + '_ {
        self.layouts
            .iter()
            .flat_map(|l| l.offsets.iter().map(move |&off| (&l.spec, off)))
    }

    /// Number of distinct block layout groups (one per `(spec, stride)` entry
    /// passed to [`WindowSpec::new`]).
    #[must_use]
    pub fn num_layouts(&self) -> usize {
        self.layouts.len()
    }

    /// The block spec shared by every offset in layout group `i`.
    #[must_use]
    pub fn layout_spec(&self, i: usize) -> &Arc<BlockSpec> {
        &self.layouts[i].spec
    }

    /// The offset grid (window-relative top-left pixels) for layout group `i`.
    #[must_use]
    pub fn layout_offsets(&self, i: usize) -> &[(usize, usize)] {
        &self.layouts[i].offsets
    }
}

/// The assembled, normalized feature vector for one detection window:
/// deterministic concatenation of every block's descriptor across the
/// `WindowSpec`'s block list and offset grids.
#[derive(Debug, Clone)]
pub struct WindowDescriptor(Vec<f32>);

impl WindowDescriptor {
    #[must_use]
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objdetect::gradient::Preprocessor;
    use crate::objdetect::normalizer::Normalizer;

    fn block(cell: usize, cells: usize) -> Arc<BlockSpec> {
        Arc::new(
            BlockSpec::new(
                cell,
                cell,
                cells,
                cells,
                9,
                true,
                0.0,
                Normalizer::L2Hys,
                Preprocessor::RgbGrad,
                0.0,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_classic_person_detector_block_count() {
        // 64x128 window, 16x16 blocks, 8px stride -> 7x15 = 105 blocks.
        let spec = block(8, 2);
        let window = WindowSpec::new(64, 128, vec![(spec, 8, 8)]).unwrap();
        let count = window.iter_blocks().count();
        assert_eq!(count, 7 * 15);
        assert_eq!(window.descriptor_length(), count * 36);
    }

    #[test]
    fn test_rejects_block_larger_than_window() {
        let spec = block(32, 4);
        assert!(WindowSpec::new(64, 64, vec![(spec, 8, 8)]).is_err());
    }

    #[test]
    fn test_offsets_are_row_major() {
        let spec = block(8, 2);
        let window = WindowSpec::new(32, 32, vec![(spec, 8, 8)]).unwrap();
        let offsets: Vec<_> = window.iter_blocks().map(|(_, off)| off).collect();
        assert_eq!(offsets[0], (0, 0));
        assert_eq!(offsets[1], (8, 0));
    }
}
