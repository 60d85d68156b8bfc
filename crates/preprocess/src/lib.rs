pub mod config;
pub mod cpu;
pub mod sanitize;
pub mod validate;

use ndarray::{Array, IxDyn};

pub use config::DEFAULT_INPUT_SIZE;
pub use cpu::CpuPreProcessor;
pub use sanitize::{SanitizedImage, sanitize, strip_metadata};
pub use validate::{ImageInfo, ImageValidator, Rejection, ValidatedImage, validate};

/// Result of preprocessing including transformation parameters
#[derive(Debug)]
pub struct PreprocessResult {
    /// NCHW tensor ready for host-side inference
    pub data: Array<f32, IxDyn>,
    /// Scale factor applied during letterboxing
    pub scale: f32,
    /// X offset from letterboxing (in pixels)
    pub offset_x: f32,
    /// Y offset from letterboxing (in pixels)
    pub offset_y: f32,
}
