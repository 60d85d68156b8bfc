use gateway::{AppState, config::get_configuration, logging::setup_logging, router};
use inference::{InferenceConfig, load_detector};

#[cfg(feature = "cuda")]
const BACKEND: &str = "onnxruntime-cuda";
#[cfg(not(feature = "cuda"))]
const BACKEND: &str = "onnxruntime";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = get_configuration()?;
    let _telemetry = setup_logging(&config)?;

    tracing::info!(config = ?config, "Loaded configuration");

    let inference_config = InferenceConfig::from_env()?;
    tracing::info!(backend = BACKEND, config = ?inference_config, "Loading detector");

    let detector = tokio::task::spawn_blocking(move || {
        load_detector::<inference::backend::ort::OrtBackend>(&inference_config)
    })
    .await?;
    tracing::info!(
        model_loaded = detector.is_loaded(),
        model = detector.model_name().unwrap_or("none"),
        "Service ready"
    );

    let state = AppState::new(detector, config.detection.clone());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.address()).await?;
    tracing::info!("HTTP server listening on {}", config.address());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl-C"),
        _ = terminate => tracing::info!("Received terminate signal"),
    }

    tracing::info!("Shutting down gracefully");
}
