use crate::{
    backend::InferenceBackend,
    config::InferenceConfig,
    detector::Detector,
    labels::{coco_labels, load_labels},
    model::YoloDetector,
};
use std::path::Path;

/// Pick the configured weights if present, otherwise the generic checkpoint.
pub fn resolve_model_path(config: &InferenceConfig) -> &str {
    if Path::new(&config.model_path).exists() {
        &config.model_path
    } else {
        tracing::warn!(
            model_path = %config.model_path,
            fallback = %config.fallback_model_path,
            "Custom model not found, using pretrained fallback (demo mode)"
        );
        &config.fallback_model_path
    }
}

/// Load the detector once at startup. Failure is logged and yields an
/// unloaded detector so the service still starts and reports unhealthy.
pub fn load_detector<B>(config: &InferenceConfig) -> Detector
where
    B: InferenceBackend + Send + 'static,
{
    match try_load::<B>(config) {
        Ok(detector) => detector,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "Failed to load model");
            Detector::unloaded()
        }
    }
}

fn try_load<B>(config: &InferenceConfig) -> anyhow::Result<Detector>
where
    B: InferenceBackend + Send + 'static,
{
    let path = resolve_model_path(config);

    let labels = match &config.labels_path {
        Some(labels_path) => load_labels(labels_path)?,
        None => coco_labels(),
    };

    tracing::info!(path, classes = labels.len(), "Loading detection model");
    let backend = B::load_model(path, config)
        .map_err(|e| e.context(format!("Failed to load model from {}", path)))?;

    let name = Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string();

    tracing::info!(model = %name, "Model loaded successfully");
    Ok(Detector::new(Box::new(YoloDetector::new(
        name, backend, labels, config,
    ))))
}
