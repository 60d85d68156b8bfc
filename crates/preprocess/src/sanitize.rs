//! Metadata stripping by re-encoding decoded pixels.
//!
//! A decoded [`DynamicImage`] holds only color type, size and pixel data, so
//! re-encoding it emits no EXIF, ICC profile or text chunks.

use crate::config::JPEG_QUALITY;
use crate::validate::{ImageInfo, ValidatedImage};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageFormat, ImageReader, ImageResult};
use std::borrow::Cow;
use std::io::Cursor;

/// A validated image whose bytes went through [`strip_metadata`].
#[derive(Debug, Clone)]
pub struct SanitizedImage {
    bytes: Vec<u8>,
    info: ImageInfo,
}

impl SanitizedImage {
    /// Use the validated bytes as-is (stripping disabled).
    pub fn passthrough(image: ValidatedImage) -> Self {
        let info = image.info();
        Self {
            bytes: image.into_bytes(),
            info,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn info(&self) -> ImageInfo {
        self.info
    }
}

pub fn sanitize(image: ValidatedImage) -> SanitizedImage {
    let info = image.info();
    let _s = common::span_debug!("strip_metadata");
    SanitizedImage {
        bytes: strip_metadata(image.bytes()),
        info,
    }
}

/// Re-encode `bytes` from pixel data alone, in the source format (JPEG when
/// it cannot be determined). Falls back to the input unchanged on any failure.
pub fn strip_metadata(bytes: &[u8]) -> Vec<u8> {
    match reencode(bytes) {
        Ok(clean) => {
            tracing::trace!(
                original_bytes = bytes.len(),
                clean_bytes = clean.len(),
                "Metadata stripped"
            );
            clean
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to strip metadata, keeping original bytes");
            bytes.to_vec()
        }
    }
}

fn reencode(bytes: &[u8]) -> ImageResult<Vec<u8>> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let format = reader.format().unwrap_or(ImageFormat::Jpeg);
    let pixels = reader.decode()?;
    encode(&pixels, format)
}

/// Encode as PNG or, for every other format, as JPEG at [`JPEG_QUALITY`].
pub fn encode(image: &DynamicImage, format: ImageFormat) -> ImageResult<Vec<u8>> {
    let mut out = Vec::new();
    match format {
        ImageFormat::Png => image.write_with_encoder(PngEncoder::new(&mut out))?,
        _ => {
            // JPEG carries neither alpha nor 16-bit samples.
            let image = match image {
                DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => Cow::Borrowed(image),
                DynamicImage::ImageLumaA8(_)
                | DynamicImage::ImageLuma16(_)
                | DynamicImage::ImageLumaA16(_) => {
                    Cow::Owned(DynamicImage::ImageLuma8(image.to_luma8()))
                }
                _ => Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8())),
            };
            image.write_with_encoder(JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY))?
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::ImageValidator;
    use bytes::Bytes;
    use image::{GenericImageView, Rgb, RgbImage, Rgba, RgbaImage};
    use img_parts::{ImageEXIF, jpeg::Jpeg, png::Png};

    const FAKE_EXIF: &[u8] = b"Exif\0\0MM\0*\0\0\0\x08GPS 51.5074N 0.1278W";

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    fn encode_with(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, format).unwrap();
        buffer.into_inner()
    }

    fn jpeg_with_exif(width: u32, height: u32) -> Vec<u8> {
        let plain = encode_with(
            &DynamicImage::ImageRgb8(gradient(width, height)),
            ImageFormat::Jpeg,
        );
        let mut jpeg = Jpeg::from_bytes(Bytes::from(plain)).unwrap();
        jpeg.set_exif(Some(Bytes::from_static(FAKE_EXIF)));
        jpeg.encoder().bytes().to_vec()
    }

    #[test]
    fn test_strips_exif_from_jpeg() {
        let original = jpeg_with_exif(320, 240);
        assert!(
            Jpeg::from_bytes(Bytes::from(original.clone()))
                .unwrap()
                .exif()
                .is_some(),
            "fixture should carry EXIF"
        );

        let clean = strip_metadata(&original);
        let jpeg = Jpeg::from_bytes(Bytes::from(clean.clone())).unwrap();
        assert!(jpeg.exif().is_none(), "EXIF should be removed");
        assert!(!clean.windows(4).any(|w| w == b"GPS "));

        let decoded = image::load_from_memory(&clean).unwrap();
        assert_eq!(decoded.dimensions(), (320, 240));
    }

    #[test]
    fn test_strips_exif_from_png_and_keeps_pixels() {
        let pixels = DynamicImage::ImageRgba8(RgbaImage::from_fn(150, 120, |x, y| {
            Rgba([x as u8, y as u8, 7, (x * y % 256) as u8])
        }));
        let mut png =
            Png::from_bytes(Bytes::from(encode_with(&pixels, ImageFormat::Png))).unwrap();
        png.set_exif(Some(Bytes::from_static(FAKE_EXIF)));
        let original = png.encoder().bytes().to_vec();

        let clean = strip_metadata(&original);
        assert!(
            Png::from_bytes(Bytes::from(clean.clone()))
                .unwrap()
                .exif()
                .is_none()
        );
        assert_eq!(image::guess_format(&clean).unwrap(), ImageFormat::Png);

        let before = image::load_from_memory(&original).unwrap();
        let after = image::load_from_memory(&clean).unwrap();
        assert_eq!(before.dimensions(), after.dimensions());
        assert_eq!(before.as_bytes(), after.as_bytes());
        assert_eq!(before.color(), after.color());
    }

    #[test]
    fn test_png_pixels_stable_across_repeated_stripping() {
        let original = encode_with(
            &DynamicImage::ImageRgb8(gradient(200, 100)),
            ImageFormat::Png,
        );
        let once = strip_metadata(&original);
        let twice = strip_metadata(&once);

        let a = image::load_from_memory(&once).unwrap();
        let b = image::load_from_memory(&twice).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_returns_input_unchanged_on_failure() {
        let garbage = b"not an image at all".to_vec();
        assert_eq!(strip_metadata(&garbage), garbage);

        // JPEG markers cut off before any frame header.
        let jpeg = jpeg_with_exif(200, 200);
        let truncated = &jpeg[..20];
        assert_eq!(strip_metadata(truncated), truncated.to_vec());
    }

    #[test]
    fn test_jpeg_encode_drops_alpha() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(120, 120, Rgba([1, 2, 3, 4])));
        let out = encode(&rgba, ImageFormat::Jpeg).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert!(!decoded.color().has_alpha());
        assert_eq!(decoded.dimensions(), (120, 120));
    }

    #[test]
    fn test_sanitize_keeps_validated_info() {
        let validated = ImageValidator::default()
            .check(jpeg_with_exif(640, 480))
            .unwrap();
        let sanitized = sanitize(validated);
        assert_eq!(sanitized.info().width, 640);
        assert_eq!(sanitized.info().format, ImageFormat::Jpeg);
        let jpeg = Jpeg::from_bytes(Bytes::from(sanitized.bytes().to_vec())).unwrap();
        assert!(jpeg.exif().is_none());
    }
}
