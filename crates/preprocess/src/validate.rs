//! Upload validation: size, container format and pixel dimensions.

use crate::config::{DEFAULT_MAX_SIZE_MB, MAX_DIMENSION, MIN_DIMENSION};
use image::{ImageFormat, ImageReader};
use std::io::Cursor;
use thiserror::Error;

const BYTES_PER_MB: usize = 1024 * 1024;

/// Why an upload was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("Image too large: {size_bytes} bytes exceeds {max_size_mb}MB")]
    TooLarge { size_bytes: usize, max_size_mb: u32 },

    #[error("Invalid image: {0}")]
    Undecodable(String),

    #[error("Invalid format: {0:?}")]
    UnsupportedFormat(ImageFormat),

    #[error("Image too small: {width}x{height}")]
    TooSmall { width: u32, height: u32 },

    #[error("Image dimensions too large: {width}x{height}")]
    TooBig { width: u32, height: u32 },
}

/// Header facts of an accepted image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

/// Bytes that passed [`ImageValidator::check`]. There is no other constructor.
#[derive(Debug, Clone)]
pub struct ValidatedImage {
    bytes: Vec<u8>,
    info: ImageInfo,
}

impl ValidatedImage {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn info(&self) -> ImageInfo {
        self.info
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[derive(Debug, Clone)]
pub struct ImageValidator {
    max_size_mb: u32,
    min_dimension: u32,
    max_dimension: u32,
}

impl ImageValidator {
    pub fn new(max_size_mb: u32) -> Self {
        Self {
            max_size_mb,
            min_dimension: MIN_DIMENSION,
            max_dimension: MAX_DIMENSION,
        }
    }

    pub fn max_size_mb(&self) -> u32 {
        self.max_size_mb
    }

    /// Check size, format and dimensions without decoding pixel data.
    pub fn inspect(&self, bytes: &[u8]) -> Result<ImageInfo, Rejection> {
        if bytes.len() > self.max_size_mb as usize * BYTES_PER_MB {
            return Err(Rejection::TooLarge {
                size_bytes: bytes.len(),
                max_size_mb: self.max_size_mb,
            });
        }

        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| Rejection::Undecodable(e.to_string()))?;

        let format = reader
            .format()
            .ok_or_else(|| Rejection::Undecodable("unrecognised image data".to_string()))?;

        if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
            return Err(Rejection::UnsupportedFormat(format));
        }

        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| Rejection::Undecodable(e.to_string()))?;

        if width < self.min_dimension || height < self.min_dimension {
            return Err(Rejection::TooSmall { width, height });
        }
        if width > self.max_dimension || height > self.max_dimension {
            return Err(Rejection::TooBig { width, height });
        }

        Ok(ImageInfo {
            format,
            width,
            height,
        })
    }

    pub fn check(&self, bytes: Vec<u8>) -> Result<ValidatedImage, Rejection> {
        match self.inspect(&bytes) {
            Ok(info) => {
                tracing::debug!(
                    format = ?info.format,
                    width = info.width,
                    height = info.height,
                    size_bytes = bytes.len(),
                    "Image accepted"
                );
                Ok(ValidatedImage { bytes, info })
            }
            Err(rejection) => {
                tracing::warn!(reason = %rejection, size_bytes = bytes.len(), "Image rejected");
                Err(rejection)
            }
        }
    }
}

impl Default for ImageValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE_MB)
    }
}

/// Predicate form of [`ImageValidator::inspect`].
pub fn validate(bytes: &[u8], max_size_mb: u32) -> bool {
    ImageValidator::new(max_size_mb).inspect(bytes).is_ok()
}
