use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionProvider {
    Cpu,
    Cuda,
}

impl FromStr for ExecutionProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "cuda" | "gpu" => Ok(Self::Cuda),
            other => Err(format!(
                "{} is not a supported execution provider. Use either `cpu` or `cuda`.",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Weights of the product detector.
    pub model_path: String,
    /// Generic pretrained checkpoint used when `model_path` does not exist.
    pub fallback_model_path: String,
    /// One class name per line; COCO names when unset.
    pub labels_path: Option<String>,
    pub input_size: (u32, u32),
    pub iou_threshold: f32,
    pub max_detections: usize,
    pub intra_threads: usize,
    pub execution_provider: ExecutionProvider,
}

impl InferenceConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let model_path = env::var("MODEL_PATH")
            .unwrap_or_else(|_| "./models/yolov8_bottles.onnx".to_string());

        let fallback_model_path =
            env::var("FALLBACK_MODEL_PATH").unwrap_or_else(|_| "yolov8n.onnx".to_string());

        let labels_path = env::var("LABELS_PATH").ok().filter(|s| !s.is_empty());

        let input_width = env::var("INPUT_WIDTH")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(640);

        let input_height = env::var("INPUT_HEIGHT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(640);

        if input_width == 0 || input_height == 0 {
            anyhow::bail!(
                "Model input size must be non-zero, got {}x{}",
                input_width,
                input_height
            );
        }

        let iou_threshold = env::var("IOU_THRESHOLD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.7);

        let max_detections = env::var("MAX_DETECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(300);

        let intra_threads = env::var("INTRA_THREADS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(4);

        let execution_provider = match env::var("EXECUTION_PROVIDER") {
            Ok(value) => value.parse().map_err(anyhow::Error::msg)?,
            Err(_) => ExecutionProvider::Cpu,
        };

        Ok(Self {
            model_path,
            fallback_model_path,
            labels_path,
            input_size: (input_width, input_height),
            iou_threshold,
            max_detections,
            intra_threads,
            execution_provider,
        })
    }

    /// Create default configuration for testing
    #[cfg(test)]
    pub fn test_default() -> Self {
        Self {
            model_path: "/models/model.onnx".to_string(),
            fallback_model_path: "/models/yolov8n.onnx".to_string(),
            labels_path: None,
            input_size: (640, 640),
            iou_threshold: 0.7,
            max_detections: 300,
            intra_threads: 1,
            execution_provider: ExecutionProvider::Cpu,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 5] = [
        "MODEL_PATH",
        "INPUT_WIDTH",
        "INPUT_HEIGHT",
        "EXECUTION_PROVIDER",
        "LABELS_PATH",
    ];

    fn clear() {
        for var in VARS {
            unsafe { env::remove_var(var) };
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear();
        let config = InferenceConfig::from_env().unwrap();
        assert_eq!(config.model_path, "./models/yolov8_bottles.onnx");
        assert_eq!(config.fallback_model_path, "yolov8n.onnx");
        assert_eq!(config.input_size, (640, 640));
        assert_eq!(config.execution_provider, ExecutionProvider::Cpu);
        assert!(config.labels_path.is_none());
    }

    #[test]
    #[serial]
    fn test_overrides_and_bad_numbers() {
        clear();
        unsafe {
            env::set_var("MODEL_PATH", "/srv/shelf.onnx");
            env::set_var("INPUT_WIDTH", "not-a-number");
            env::set_var("EXECUTION_PROVIDER", "CUDA");
            env::set_var("LABELS_PATH", "");
        }

        let config = InferenceConfig::from_env().unwrap();
        assert_eq!(config.model_path, "/srv/shelf.onnx");
        assert_eq!(config.input_size.0, 640, "unparsable value keeps default");
        assert_eq!(config.execution_provider, ExecutionProvider::Cuda);
        assert!(config.labels_path.is_none(), "empty path means unset");
        clear();
    }

    #[test]
    #[serial]
    fn test_unknown_provider_is_an_error() {
        clear();
        unsafe { env::set_var("EXECUTION_PROVIDER", "tpu") };
        let err = InferenceConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("tpu"));
        clear();
    }

    #[test]
    #[serial]
    fn test_zero_input_size_is_an_error() {
        clear();
        unsafe { env::set_var("INPUT_HEIGHT", "0") };
        let err = InferenceConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("640x0"), "{}", err);
        clear();
    }
}
