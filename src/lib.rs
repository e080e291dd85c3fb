//! # hog-detect
//!
//! A HOG (Histogram of Oriented Gradients) object detection pipeline,
//! implemented entirely in Rust: gradient computation, per-block
//! descriptors, a scale-pyramid sliding-window driver, linear SVM scoring,
//! and scale-space mean-shift non-maximum suppression.
//!
//! ## Features
//!
//! - **Core**: Basic data structures (Mat, Point, Size, Rect, Scalar)
//! - **Image I/O**: Reading and writing images in various formats
//! - **Image Processing**: Color conversion, filtering, geometric transformations
//! - **Object detection**: The HOG descriptor pipeline and detector (see [`objdetect`])
//!
//! ## Example
//!
//! ```rust,no_run
//! use hog_detect::prelude::*;
//! use hog_detect::imgcodecs::imread;
//! use hog_detect::objdetect::HOGDescriptor;
//!
//! # fn main() -> hog_detect::error::Result<()> {
//! let img = imread("pedestrians.jpg")?;
//!
//! let mut hog = HOGDescriptor::new()?;
//! hog.load_model("person.svm")?;
//! let detections = hog.detect_multi_scale(&img, 0.0)?;
//! println!("found {} people", detections.len());
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod error;
pub mod imgcodecs;
pub mod imgproc;
pub mod objdetect;

pub mod prelude {
    //! Convenience module that re-exports commonly used items
    pub use crate::core::{Mat, MatDepth, Point, Point2f, Size, Rect, Scalar};
    pub use crate::core::types::{Point3f, ColorConversionCode, InterpolationFlag, ThresholdType};
    pub use crate::error::{Error, Result};
}
