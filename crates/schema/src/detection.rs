use serde::{Deserialize, Serialize};

/// Axis-aligned box in pixel coordinates of the submitted image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    /// Truncate float corners to integer pixels, ordering each axis so that
    /// `x1 <= x2` and `y1 <= y2`.
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x1: x1.min(x2) as i32,
            y1: y1.min(y2) as i32,
            x2: x1.max(x2) as i32,
            y2: y1.max(y2) as i32,
        }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }
}

/// One detected product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub sku_name: String,
    pub brand: Option<String>,
    /// Rounded to two decimals, within `[0, 1]`.
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Detections for a single image, in model output order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub image_width: u32,
    pub image_height: u32,
    pub detections: Vec<Detection>,
}

/// Body of a successful `POST /detect`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResponse {
    pub success: bool,
    pub image_width: u32,
    pub image_height: u32,
    pub detections: Vec<Detection>,
    pub total_detections: usize,
    pub inference_time_ms: u64,
}

impl DetectionResponse {
    pub fn new(result: DetectionResult, inference_time_ms: u64) -> Self {
        Self {
            success: true,
            image_width: result.image_width,
            image_height: result.image_height,
            total_detections: result.detections.len(),
            detections: result.detections,
            inference_time_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_truncates_and_orders_corners() {
        let bbox = BoundingBox::from_corners(120.9, 80.2, 10.7, 300.99);
        assert_eq!(
            bbox,
            BoundingBox {
                x1: 10,
                y1: 80,
                x2: 120,
                y2: 300
            }
        );
        assert_eq!(bbox.width(), 110);
        assert_eq!(bbox.height(), 220);
    }

    #[test]
    fn test_response_counts_detections() {
        let result = DetectionResult {
            image_width: 800,
            image_height: 600,
            detections: vec![Detection {
                sku_name: "generic-bottle-750ml".to_string(),
                brand: Some("Unknown".to_string()),
                confidence: 0.87,
                bbox: BoundingBox {
                    x1: 1,
                    y1: 2,
                    x2: 3,
                    y2: 4,
                },
            }],
        };

        let response = DetectionResponse::new(result, 42);
        assert!(response.success);
        assert_eq!(response.total_detections, 1);
        assert_eq!(response.inference_time_ms, 42);
    }

    #[test]
    fn test_detection_response_wire_shape() {
        let response = DetectionResponse::new(
            DetectionResult {
                image_width: 640,
                image_height: 480,
                detections: vec![Detection {
                    sku_name: "cocktail-glass".to_string(),
                    brand: None,
                    confidence: 0.5,
                    bbox: BoundingBox {
                        x1: 0,
                        y1: 0,
                        x2: 10,
                        y2: 20,
                    },
                }],
            },
            7,
        );

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["image_width"], 640);
        assert_eq!(json["total_detections"], 1);
        assert_eq!(json["detections"][0]["sku_name"], "cocktail-glass");
        assert!(json["detections"][0]["brand"].is_null());
        assert_eq!(json["detections"][0]["bbox"]["y2"], 20);
    }
}
