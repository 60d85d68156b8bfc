use crate::config::InferenceConfig;
use ndarray::{Array, ArrayD, IxDyn};

#[cfg(feature = "ort-backend")]
pub mod ort;

pub trait InferenceBackend {
    fn load_model(path: &str, config: &InferenceConfig) -> anyhow::Result<Self>
    where
        Self: Sized;

    /// Run inference on a letterboxed NCHW batch of one image
    fn infer(&mut self, images: &Array<f32, IxDyn>) -> anyhow::Result<InferenceOutput>;
}

pub struct InferenceOutput {
    pub predictions: ArrayD<f32>, // [1, 4 + num_classes, anchors] cxcywh in input pixels, then class scores
}
