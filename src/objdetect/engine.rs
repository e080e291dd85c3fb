//! Owns the per-image gradient field, the per-`BlockSpec` descriptor caches,
//! and assembles `WindowDescriptor`s at arbitrary window positions.

use tracing::trace;

use crate::core::Mat;
use crate::error::{Error, Result};
use crate::objdetect::cache::DescriptorCache;
use crate::objdetect::descriptor::compute_block_descriptor;
use crate::objdetect::gradient::{compute_gradient_field, GradientField};
use crate::objdetect::window::{WindowDescriptor, WindowSpec};

/// Default descriptor-cache budget per layout group, in megabytes.
const DEFAULT_CACHE_BUDGET_MB: usize = 16;

/// Computes `WindowDescriptor`s for a single image at a single pyramid
/// level. Exclusively owned and mutated by its caller: no interior
/// mutability, no shared state across images, matching the single-threaded-
/// per-pass contract. A fresh `DescriptorEngine` (or [`DescriptorEngine::reset`])
/// is required for each new image or pyramid level.
pub struct DescriptorEngine {
    window_spec: WindowSpec,
    field: Option<GradientField>,
    caches: Vec<DescriptorCache>,
}

impl DescriptorEngine {
    /// Builds an engine for `window_spec`, with one FIFO cache per block
    /// layout group sized to `cache_budget_mb` megabytes.
    pub fn new(window_spec: WindowSpec, cache_budget_mb: usize) -> Result<Self> {
        let mut caches = Vec::with_capacity(window_spec.num_layouts());
        for i in 0..window_spec.num_layouts() {
            let len = window_spec.layout_spec(i).descriptor_length();
            caches.push(DescriptorCache::new(cache_budget_mb, len)?);
        }
        Ok(Self {
            window_spec,
            field: None,
            caches,
        })
    }

    /// Convenience constructor using the default cache budget.
    pub fn with_default_budget(window_spec: WindowSpec) -> Result<Self> {
        Self::new(window_spec, DEFAULT_CACHE_BUDGET_MB)
    }

    #[must_use]
    pub fn window_spec(&self) -> &WindowSpec {
        &self.window_spec
    }

    /// Loads a new image (one pyramid level). All caches are cleared: block
    /// descriptors computed against the old gradient field are meaningless
    /// once the field changes.
    pub fn load_image(
        &mut self,
        img: &Mat,
        preprocessor: crate::objdetect::gradient::Preprocessor,
        sigma_g: f32,
        semicircular: bool,
    ) -> Result<()> {
        let field = compute_gradient_field(img, preprocessor, sigma_g, semicircular)?;
        trace!(width = field.width(), height = field.height(), "gradient field computed");
        self.field = Some(field);
        for cache in &mut self.caches {
            cache.clear();
        }
        Ok(())
    }

    /// Resets all caches without recomputing the gradient field; used when
    /// advancing within the same field but starting a logically independent
    /// scan (rare; `load_image` is the common path).
    pub fn reset_caches(&mut self) {
        for cache in &mut self.caches {
            cache.clear();
        }
    }

    /// Assembles the `WindowDescriptor` for the window whose top-left pixel
    /// in the current gradient field is `(x0, y0)`.
    pub fn window_descriptor(&mut self, x0: usize, y0: usize) -> Result<WindowDescriptor> {
        let field = self
            .field
            .as_ref()
            .ok_or_else(|| Error::InvalidParameter("no image loaded into engine".to_string()))?;

        let mut out = Vec::with_capacity(self.window_spec.descriptor_length());
        for i in 0..self.window_spec.num_layouts() {
            let spec = self.window_spec.layout_spec(i).clone();
            let offsets: Vec<(usize, usize)> =
                self.window_spec.layout_offsets(i).to_vec();
            for (ox, oy) in offsets {
                let bx = x0 + ox;
                let by = y0 + oy;
                if let Some(cached) = self.caches[i].get((bx, by)) {
                    out.extend_from_slice(cached);
                    continue;
                }
                let descriptor = compute_block_descriptor(field, &spec, bx, by)?;
                out.extend_from_slice(&descriptor);
                self.caches[i].insert((bx, by), descriptor);
            }
        }
        Ok(WindowDescriptor::new(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{types::Scalar, MatDepth};
    use crate::objdetect::block::BlockSpec;
    use crate::objdetect::gradient::Preprocessor;
    use crate::objdetect::normalizer::Normalizer;
    use std::sync::Arc;

    fn small_window_spec() -> WindowSpec {
        let spec = Arc::new(
            BlockSpec::new(8, 8, 2, 2, 9, true, 0.0, Normalizer::L2Hys, Preprocessor::RgbGrad, 0.0)
                .unwrap(),
        );
        WindowSpec::new(32, 32, vec![(spec, 8, 8)]).unwrap()
    }

    #[test]
    fn test_window_descriptor_length_matches_spec() {
        let ws = small_window_spec();
        let expected_len = ws.descriptor_length();
        let mut engine = DescriptorEngine::with_default_budget(ws).unwrap();
        let img = Mat::new_with_default(64, 64, 1, MatDepth::U8, Scalar::all(50.0)).unwrap();
        engine
            .load_image(&img, Preprocessor::RgbGrad, 0.0, true)
            .unwrap();
        let wd = engine.window_descriptor(0, 0).unwrap();
        assert_eq!(wd.len(), expected_len);
    }

    #[test]
    fn test_no_image_loaded_errors() {
        let ws = small_window_spec();
        let mut engine = DescriptorEngine::with_default_budget(ws).unwrap();
        assert!(engine.window_descriptor(0, 0).is_err());
    }

    #[test]
    fn test_cache_reused_for_overlapping_windows() {
        let ws = small_window_spec();
        let mut engine = DescriptorEngine::with_default_budget(ws).unwrap();
        let mut img = Mat::new(64, 64, 1, MatDepth::U8).unwrap();
        for y in 0..64 {
            for x in 0..64 {
                img.at_mut(y, x).unwrap()[0] = ((x * 4) % 256) as u8;
            }
        }
        engine
            .load_image(&img, Preprocessor::RgbGrad, 0.0, true)
            .unwrap();
        let a = engine.window_descriptor(0, 0).unwrap();
        let b = engine.window_descriptor(0, 0).unwrap();
        assert_eq!(a.as_slice(), b.as_slice());
    }
}
