use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub model_loaded: bool,
    pub version: String,
}

impl HealthResponse {
    pub fn new(model_loaded: bool, version: impl Into<String>) -> Self {
        let status = if model_loaded {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };
        Self {
            status,
            model_loaded,
            version: version.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoints {
    pub detect: String,
    pub health: String,
}

/// Body of `GET /`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub status: String,
    pub endpoints: Endpoints,
}

/// Error body. `success` and `error` are only set by the fallback handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub detail: String,
}

impl ErrorResponse {
    pub fn detail(detail: impl Into<String>) -> Self {
        Self {
            success: None,
            error: None,
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            success: Some(false),
            error: Some("Internal server error".to_string()),
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_follows_model_flag() {
        let healthy = HealthResponse::new(true, "1.0.0");
        assert_eq!(healthy.status, HealthStatus::Healthy);

        let json = serde_json::to_value(HealthResponse::new(false, "1.0.0")).unwrap();
        assert_eq!(json["status"], "unhealthy");
        assert_eq!(json["model_loaded"], false);
    }

    #[test]
    fn test_error_body_omits_fallback_fields() {
        let json = serde_json::to_value(ErrorResponse::detail("bad")).unwrap();
        assert_eq!(json, serde_json::json!({ "detail": "bad" }));

        let json = serde_json::to_value(ErrorResponse::internal("boom")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Internal server error");
        assert_eq!(json["detail"], "boom");
    }
}
