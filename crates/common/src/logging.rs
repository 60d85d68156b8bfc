use crate::config::{Environment, LogLevel};
use tracing_subscriber::{
    EnvFilter, Layer, Registry, layer::Layered, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Initialize tracing subscriber with pretty formatting for development
/// and JSON formatting for production.
///
/// Uses RUST_LOG environment variable for filtering (defaults to `log_level` if not set).
///
/// Also adds an OpenTelemetry layer so spans reach a global tracer provider
/// if one has been installed.
pub fn setup_logging(log_level: LogLevel, environment: Environment) {
    init_subscriber(log_level, environment, tracing_opentelemetry::layer());
}

pub(crate) fn init_subscriber<L>(log_level: LogLevel, environment: Environment, otel_layer: L)
where
    L: Layer<Layered<EnvFilter, Registry>> + Send + Sync + 'static,
{
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.as_str()));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(otel_layer);

    match environment {
        Environment::Production => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_level(true))
                .init();
        }
        Environment::Development => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_ansi(true))
                .init();
        }
    }
}
