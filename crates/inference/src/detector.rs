use crate::{
    catalog::{ProductMatch, ProductMatcher, StaticCatalog},
    model::ObjectDetector,
};
use schema::{BoundingBox, Detection, DetectionResult};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("Model not loaded")]
    ModelNotLoaded,

    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("{0:#}")]
    Inference(anyhow::Error),
}

/// Process-wide detection entry point: an optional loaded model plus the
/// label to product lookup. Built once at startup and shared read-only.
pub struct Detector {
    model: Option<Box<dyn ObjectDetector>>,
    matcher: Box<dyn ProductMatcher>,
}

impl Detector {
    pub fn new(model: Box<dyn ObjectDetector>) -> Self {
        Self {
            model: Some(model),
            matcher: Box::new(StaticCatalog),
        }
    }

    /// A detector whose model failed to initialize. Every `detect` call fails.
    pub fn unloaded() -> Self {
        Self {
            model: None,
            matcher: Box::new(StaticCatalog),
        }
    }

    pub fn with_matcher(mut self, matcher: Box<dyn ProductMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model.as_deref().map(|m| m.name())
    }

    /// Decode `bytes`, run the model at `confidence_threshold` and map every
    /// label through the product matcher.
    #[tracing::instrument(skip(self, bytes), fields(size_bytes = bytes.len()))]
    pub fn detect(
        &self,
        bytes: &[u8],
        confidence_threshold: f32,
    ) -> Result<DetectionResult, DetectError> {
        let model = self.model.as_deref().ok_or(DetectError::ModelNotLoaded)?;

        // Grayscale and alpha images are flattened to three channels.
        let image = image::load_from_memory(bytes)?.into_rgb8();
        let (image_width, image_height) = image.dimensions();

        let raw = model
            .predict(&image, confidence_threshold)
            .map_err(DetectError::Inference)?;

        let detections = raw
            .into_iter()
            .map(|d| {
                let ProductMatch { sku, brand } = self.matcher.lookup(&d.label);
                let [x1, y1, x2, y2] = d.bbox;
                Detection {
                    sku_name: sku,
                    brand,
                    confidence: round_confidence(d.confidence),
                    bbox: BoundingBox::from_corners(x1, y1, x2, y2),
                }
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            image_width,
            image_height,
            detections = detections.len(),
            "Detection complete"
        );

        Ok(DetectionResult {
            image_width,
            image_height,
            detections,
        })
    }
}

fn round_confidence(confidence: f32) -> f32 {
    ((confidence.clamp(0.0, 1.0) * 100.0).round() / 100.0).clamp(0.0, 1.0)
}
