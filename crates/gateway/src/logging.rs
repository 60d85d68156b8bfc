use crate::config::Config;
use common::TelemetryGuard;

/// Install the global subscriber. With an OTLP endpoint configured the
/// returned guard must be held until shutdown so spans and metrics flush.
pub fn setup_logging(config: &Config) -> anyhow::Result<Option<TelemetryGuard>> {
    match &config.otel_endpoint {
        Some(endpoint) => {
            let guard =
                TelemetryGuard::init("gateway", endpoint, config.log_level, config.environment)?;
            Ok(Some(guard))
        }
        None => {
            common::setup_logging(config.log_level, config.environment);
            Ok(None)
        }
    }
}
