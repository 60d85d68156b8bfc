use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};
use axum::{
    Json,
    extract::{Multipart, State},
};
use inference::Detector;
use preprocess::{ImageValidator, Rejection, SanitizedImage, sanitize};
use schema::{DetectionResponse, DetectionResult, Endpoints, HealthResponse, ServiceInfo};
use std::time::Instant;

pub const SERVICE_NAME: &str = "SnapCount AI - ML Inference";
pub const API_VERSION: &str = "1.0.0";

const IMAGE_FIELD: &str = "image";
const THRESHOLD_FIELD: &str = "confidence_threshold";

pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: SERVICE_NAME.to_string(),
        version: API_VERSION.to_string(),
        status: "running".to_string(),
        endpoints: Endpoints {
            detect: "/detect".to_string(),
            health: "/health".to_string(),
        },
    })
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::new(state.detector.is_loaded(), API_VERSION))
}

struct Upload {
    filename: Option<String>,
    bytes: Vec<u8>,
    confidence_threshold: f32,
}

#[tracing::instrument(skip(state, multipart))]
pub async fn detect(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<DetectionResponse>> {
    let start = Instant::now();
    state.metrics.record_request();

    match run_detection(&state, multipart, start).await {
        Ok(response) => {
            state.metrics.record_success(
                start.elapsed().as_secs_f64(),
                response.total_detections,
            );
            tracing::info!(
                detections = response.total_detections,
                inference_time_ms = response.inference_time_ms,
                "Detection succeeded"
            );
            Ok(Json(response))
        }
        Err(e) => {
            if e.is_client_error() {
                state.metrics.record_rejected(rejection_reason(&e));
            } else {
                state.metrics.record_failure(start.elapsed().as_secs_f64());
                tracing::error!(error = %e, "Detection request failed");
            }
            Err(e)
        }
    }
}

async fn run_detection(
    state: &AppState,
    multipart: Multipart,
    start: Instant,
) -> ApiResult<DetectionResponse> {
    let upload = read_upload(multipart, state.settings.default_confidence).await?;

    tracing::info!(
        filename = upload.filename.as_deref().unwrap_or("<unnamed>"),
        size_bytes = upload.bytes.len(),
        confidence_threshold = upload.confidence_threshold,
        "Received image"
    );

    let detector = state.detector.clone();
    let validator = state.validator.clone();
    let strip = state.settings.strip_metadata;

    let result = tokio::task::spawn_blocking(move || {
        process(
            &detector,
            &validator,
            upload.bytes,
            upload.confidence_threshold,
            strip,
        )
    })
    .await
    .map_err(|e| ApiError::internal(format!("detection task failed: {}", e)))??;

    let inference_time_ms = start.elapsed().as_millis() as u64;
    Ok(DetectionResponse::new(result, inference_time_ms))
}

/// Validate, optionally strip metadata, then run the detector.
fn process(
    detector: &Detector,
    validator: &ImageValidator,
    bytes: Vec<u8>,
    confidence_threshold: f32,
    strip_metadata: bool,
) -> ApiResult<DetectionResult> {
    let validated = validator
        .check(bytes)
        .map_err(|_: Rejection| ApiError::InvalidImage {
            max_size_mb: validator.max_size_mb(),
        })?;

    let image = if strip_metadata {
        sanitize(validated)
    } else {
        SanitizedImage::passthrough(validated)
    };

    Ok(detector.detect(image.bytes(), confidence_threshold)?)
}

async fn read_upload(mut multipart: Multipart, default_confidence: f32) -> ApiResult<Upload> {
    let mut image = None;
    let mut confidence_threshold = default_confidence;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(IMAGE_FIELD) => {
                let filename = field.file_name().map(str::to_string);
                let bytes = field.bytes().await?;
                image = Some((filename, bytes.to_vec()));
            }
            Some(THRESHOLD_FIELD) => {
                let text = field.text().await?;
                confidence_threshold = parse_threshold(&text, default_confidence)?;
            }
            other => {
                tracing::debug!(field = ?other, "Ignoring unexpected form field");
            }
        }
    }

    let (filename, bytes) =
        image.ok_or_else(|| ApiError::bad_request("Missing form field `image`"))?;

    Ok(Upload {
        filename,
        bytes,
        confidence_threshold,
    })
}

/// A blank field counts as absent and yields `default`.
fn parse_threshold(text: &str, default: f32) -> ApiResult<f32> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(default);
    }

    let value: f32 = text.parse().map_err(|_| {
        ApiError::bad_request(format!("`{}` must be a number, got `{}`", THRESHOLD_FIELD, text))
    })?;

    if !(0.0..=1.0).contains(&value) {
        return Err(ApiError::bad_request(format!(
            "`{}` must be between 0.0 and 1.0, got {}",
            THRESHOLD_FIELD, value
        )));
    }

    Ok(value)
}

fn rejection_reason(error: &ApiError) -> &'static str {
    match error {
        ApiError::InvalidImage { .. } => "invalid_image",
        ApiError::Multipart(_) => "malformed_upload",
        _ => "bad_request",
    }
}
