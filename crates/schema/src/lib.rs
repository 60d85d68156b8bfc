//! Wire types shared by the detection pipeline and the HTTP gateway.

mod detection;
mod service;

pub use detection::{BoundingBox, Detection, DetectionResponse, DetectionResult};
pub use service::{Endpoints, ErrorResponse, HealthResponse, HealthStatus, ServiceInfo};
