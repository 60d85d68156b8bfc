use crate::{
    backend::{InferenceBackend, InferenceOutput},
    config::InferenceConfig,
    processing::post::{PostProcessor, TransformParams},
};
use common::span;
use image::RgbImage;
use preprocess::CpuPreProcessor;
use std::sync::Mutex;

/// A raw model output: class label, score and `[x1, y1, x2, y2]` in source
/// image pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDetection {
    pub label: String,
    pub confidence: f32,
    pub bbox: [f32; 4],
}

/// A pretrained detector that thresholds and suppresses its own outputs.
pub trait ObjectDetector: Send + Sync {
    fn name(&self) -> &str;

    fn predict(
        &self,
        image: &RgbImage,
        confidence_threshold: f32,
    ) -> anyhow::Result<Vec<ModelDetection>>;
}

struct Pipeline<B> {
    backend: B,
    preprocessor: CpuPreProcessor,
}

/// YOLO detector: letterbox, run the backend, decode and NMS.
pub struct YoloDetector<B: InferenceBackend> {
    name: String,
    labels: Vec<String>,
    postprocessor: PostProcessor,
    pipeline: Mutex<Pipeline<B>>,
}

impl<B: InferenceBackend> YoloDetector<B> {
    pub fn new(
        name: impl Into<String>,
        backend: B,
        labels: Vec<String>,
        config: &InferenceConfig,
    ) -> Self {
        Self {
            name: name.into(),
            labels,
            postprocessor: PostProcessor::new(config.iou_threshold, config.max_detections),
            pipeline: Mutex::new(Pipeline {
                backend,
                preprocessor: CpuPreProcessor::new(config.input_size),
            }),
        }
    }

    fn label_for(&self, class_id: usize) -> String {
        self.labels
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| format!("class_{}", class_id))
    }
}

impl<B: InferenceBackend + Send> ObjectDetector for YoloDetector<B> {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(
        &self,
        image: &RgbImage,
        confidence_threshold: f32,
    ) -> anyhow::Result<Vec<ModelDetection>> {
        let mut pipeline = self
            .pipeline
            .lock()
            .map_err(|_| anyhow::anyhow!("Model pipeline lock poisoned"))?;
        let Pipeline {
            backend,
            preprocessor,
        } = &mut *pipeline;

        let prepared = preprocessor.preprocess_image(image)?;

        let InferenceOutput { predictions } = {
            let _s = span!("model_inference");
            backend.infer(&prepared.data)?
        };
        drop(pipeline);

        let transform = TransformParams {
            orig_width: image.width(),
            orig_height: image.height(),
            scale: prepared.scale,
            offset_x: prepared.offset_x,
            offset_y: prepared.offset_y,
        };

        let predictions = self.postprocessor.parse_detections(
            &predictions.view(),
            confidence_threshold,
            &transform,
        )?;

        Ok(predictions
            .into_iter()
            .map(|p| ModelDetection {
                label: self.label_for(p.class_id),
                confidence: p.confidence,
                bbox: [p.x1, p.y1, p.x2, p.y2],
            })
            .collect())
    }
}
