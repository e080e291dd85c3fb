//! Histogram-of-Oriented-Gradients object detection: gradient computation,
//! per-block descriptors with a FIFO cache, scale-pyramid sliding-window
//! scoring against a linear SVM, and scale-space mean-shift NMS.

pub mod block;
pub mod cache;
pub mod descriptor;
pub mod detection;
pub mod driver;
pub mod engine;
pub mod gradient;
pub mod hog;
pub mod io;
pub mod model;
pub mod nms;
pub mod normalizer;
pub mod pyramid;
pub mod window;

pub use block::BlockSpec;
pub use detection::{FinalDetection, RawDetection};
pub use driver::{detect, detect_batch, detect_objects, DetectConfig};
pub use gradient::{compute_gradient_field, GradientField, Preprocessor};
pub use hog::HOGDescriptor;
pub use model::LinearModel;
pub use nms::{mean_shift_nms, NmsConfig, TransferFunction};
pub use normalizer::Normalizer;
pub use pyramid::{Pyramid, PyramidConfig};
pub use window::{WindowDescriptor, WindowSpec};
