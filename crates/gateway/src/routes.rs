use crate::{
    handlers::{detect, health, root},
    state::AppState,
};
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use schema::ErrorResponse;
use std::any::Any;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

const BYTES_PER_MB: usize = 1024 * 1024;

/// Transport cap on request bodies. It sits well above the upload limit so
/// oversized images still reach validation and get the 400 response.
pub fn body_limit_bytes(max_upload_mb: u32) -> usize {
    (max_upload_mb as usize * 2 + 1) * BYTES_PER_MB
}

pub fn router(state: AppState) -> Router {
    let body_limit = body_limit_bytes(state.settings.max_upload_mb);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/detect", post(detect))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    };

    tracing::error!(detail, "Request handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::internal(detail)),
    )
        .into_response()
}
