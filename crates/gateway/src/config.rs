use common::{Environment, LogLevel};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub log_level: LogLevel,
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    /// OTLP collector; traces and metrics are only exported when set.
    pub otel_endpoint: Option<String>,
    pub detection: DetectionSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectionSettings {
    pub max_upload_mb: u32,
    pub default_confidence: f32,
    pub strip_metadata: bool,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            max_upload_mb: preprocess::config::DEFAULT_MAX_SIZE_MB,
            default_confidence: 0.5,
            strip_metadata: true,
        }
    }
}

impl Config {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub fn get_configuration() -> Result<Config, config::ConfigError> {
    let detection = DetectionSettings::default();

    let config = config::Config::builder()
        .set_default("log_level", "info")?
        .set_default("environment", Environment::from_env().as_str())?
        .set_default("host", "0.0.0.0")?
        .set_default("port", 8000)?
        .set_default("detection.max_upload_mb", detection.max_upload_mb as i64)?
        .set_default("detection.default_confidence", detection.default_confidence as f64)?
        .set_default("detection.strip_metadata", detection.strip_metadata)?
        .add_source(
            config::Environment::with_prefix("GATEWAY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: Config = config.try_deserialize::<Config>()?;

    Ok(config)
}
