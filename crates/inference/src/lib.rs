pub mod backend;
pub mod catalog;
pub mod config;
pub mod detector;
pub mod labels;
pub mod loader;
pub mod model;
pub mod processing;

// Re-export commonly used types for convenience
pub use backend::{InferenceBackend, InferenceOutput};
pub use catalog::{ProductMatch, ProductMatcher, StaticCatalog};
pub use config::{ExecutionProvider, InferenceConfig};
pub use detector::{DetectError, Detector};
pub use loader::load_detector;
pub use model::{ModelDetection, ObjectDetector, YoloDetector};
