use crate::{config::DetectionSettings, metrics::DetectMetrics};
use inference::Detector;
use preprocess::ImageValidator;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub detector: Arc<Detector>,
    pub validator: ImageValidator,
    pub settings: DetectionSettings,
    pub metrics: DetectMetrics,
}

impl AppState {
    pub fn new(detector: Detector, settings: DetectionSettings) -> Self {
        Self {
            detector: Arc::new(detector),
            validator: ImageValidator::new(settings.max_upload_mb),
            settings,
            metrics: DetectMetrics::new("gateway"),
        }
    }
}
