//! Detection records, before and after mode-finding non-maximum suppression.

/// One scored sliding-window evaluation, in the unpadded source image's
/// coordinate frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDetection {
    /// Window center x, in source-image pixels.
    pub cx: f32,
    /// Window center y, in source-image pixels.
    pub cy: f32,
    /// Window width at this detection's scale, in source-image pixels.
    pub width: f32,
    /// Window height at this detection's scale, in source-image pixels.
    pub height: f32,
    /// Pyramid level scale factor.
    pub scale: f32,
    /// Linear classifier score.
    pub score: f32,
}

impl RawDetection {
    #[must_use]
    pub fn new(cx: f32, cy: f32, width: f32, height: f32, scale: f32, score: f32) -> Self {
        Self {
            cx,
            cy,
            width,
            height,
            scale,
            score,
        }
    }

    /// Top-left/bottom-right corners `(x0, y0, x1, y1)`.
    #[must_use]
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        (
            self.cx - self.width / 2.0,
            self.cy - self.height / 2.0,
            self.cx + self.width / 2.0,
            self.cy + self.height / 2.0,
        )
    }
}

/// A final object hypothesis produced by mode-finding NMS: the converged
/// mode location plus the density weight accumulated there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinalDetection {
    pub cx: f32,
    pub cy: f32,
    pub width: f32,
    pub height: f32,
    pub scale: f32,
    /// Accumulated kernel density at the converged mode.
    pub density: f32,
}

impl FinalDetection {
    #[must_use]
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        (
            self.cx - self.width / 2.0,
            self.cy - self.height / 2.0,
            self.cx + self.width / 2.0,
            self.cy + self.height / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_detection_bounds_centered() {
        let d = RawDetection::new(50.0, 60.0, 20.0, 40.0, 1.0, 2.0);
        let (x0, y0, x1, y1) = d.bounds();
        assert_eq!((x0, y0, x1, y1), (40.0, 40.0, 60.0, 80.0));
    }
}
