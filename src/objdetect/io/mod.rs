//! External file-format boundaries: the raw block-descriptor dump used by
//! an external trainer, and the annotation-file parser used to read
//! ground-truth bounding boxes.

pub mod annotation;
pub mod rawdesc;
