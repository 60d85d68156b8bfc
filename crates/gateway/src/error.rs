use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use inference::DetectError;
use schema::ErrorResponse;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid image. Must be JPEG/PNG and under {max_size_mb}MB")]
    InvalidImage { max_size_mb: u32 },

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Multipart(#[from] MultipartError),

    #[error("Detection failed: {0}")]
    Detection(#[from] DetectError),

    #[error("Detection failed: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidImage { .. } | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Multipart(e) => e.status(),
            ApiError::Detection(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = match &self {
            ApiError::Multipart(e) => e.body_text(),
            _ => self.to_string(),
        };

        (status, Json(ErrorResponse::detail(detail))).into_response()
    }
}
