use ndarray::ArrayViewD;

/// Letterbox parameters needed to map boxes back onto the source image.
pub struct TransformParams {
    pub orig_width: u32,
    pub orig_height: u32,
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

/// One box after thresholding and NMS, in source image pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub class_id: usize,
    pub confidence: f32,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Prediction {
    fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }
}

pub struct PostProcessor {
    pub iou_threshold: f32,
    pub max_detections: usize,
}

impl PostProcessor {
    pub fn new(iou_threshold: f32, max_detections: usize) -> Self {
        Self {
            iou_threshold,
            max_detections,
        }
    }

    /// Decode a YOLOv8-style head output, keep boxes scoring at least
    /// `confidence_threshold`, then apply per-class NMS.
    ///
    /// Accepts `[1, 4 + C, N]` (Ultralytics export) or the transposed
    /// `[1, N, 4 + C]`; the longer axis is taken as the anchor axis. Class
    /// scores are expected to be probabilities already.
    #[tracing::instrument(skip(self, predictions, transform))]
    pub fn parse_detections(
        &self,
        predictions: &ArrayViewD<f32>,
        confidence_threshold: f32,
        transform: &TransformParams,
    ) -> anyhow::Result<Vec<Prediction>> {
        let shape = predictions.shape();
        if shape.len() != 3 || shape[0] != 1 {
            anyhow::bail!("Unexpected output shape {:?}, expected [1, 4 + C, N]", shape);
        }

        let attrs_first = shape[1] < shape[2];
        let (num_attrs, num_anchors) = if attrs_first {
            (shape[1], shape[2])
        } else {
            (shape[2], shape[1])
        };
        if num_attrs <= 4 {
            anyhow::bail!("Output has no class scores: shape {:?}", shape);
        }

        let at = |attr: usize, anchor: usize| -> f32 {
            if attrs_first {
                predictions[[0, attr, anchor]]
            } else {
                predictions[[0, anchor, attr]]
            }
        };

        let mut candidates = Vec::new();

        for i in 0..num_anchors {
            let mut confidence = f32::NEG_INFINITY;
            let mut class_id = 0usize;
            for c in 4..num_attrs {
                let score = at(c, i);
                if score > confidence {
                    confidence = score;
                    class_id = c - 4;
                }
            }

            if confidence < confidence_threshold {
                continue;
            }

            let (x1, y1, x2, y2) = cxcywh_to_xyxy(at(0, i), at(1, i), at(2, i), at(3, i));

            // Undo the letterbox and clamp to the source image.
            let max_x = transform.orig_width as f32;
            let max_y = transform.orig_height as f32;
            let unletterbox = |v: f32, offset: f32, max: f32| {
                ((v - offset) / transform.scale).clamp(0.0, max)
            };

            candidates.push(Prediction {
                class_id,
                confidence: confidence.clamp(0.0, 1.0),
                x1: unletterbox(x1, transform.offset_x, max_x),
                y1: unletterbox(y1, transform.offset_y, max_y),
                x2: unletterbox(x2, transform.offset_x, max_x),
                y2: unletterbox(y2, transform.offset_y, max_y),
            });
        }

        let candidates_len = candidates.len();
        let kept = non_max_suppression(candidates, self.iou_threshold, self.max_detections);

        tracing::trace!(candidates = candidates_len, kept = kept.len(), "Decoded predictions");

        Ok(kept)
    }
}

/// Greedy per-class NMS, highest confidence first, capped at `max_detections`.
fn non_max_suppression(
    mut candidates: Vec<Prediction>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Prediction> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<Prediction> = Vec::new();
    for candidate in candidates {
        if kept.len() >= max_detections {
            break;
        }
        let suppressed = kept
            .iter()
            .any(|k| k.class_id == candidate.class_id && iou(k, &candidate) > iou_threshold);
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}

fn iou(a: &Prediction, b: &Prediction) -> f32 {
    let ix1 = a.x1.max(b.x1);
    let iy1 = a.y1.max(b.y1);
    let ix2 = a.x2.min(b.x2);
    let iy2 = a.y2.min(b.y2);

    let intersection = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
    let union = a.area() + b.area() - intersection;
    if union <= 0.0 {
        0.0
    } else {
        intersection / union
    }
}

/// Convert bounding box from center-width-height format to corner format
#[inline]
fn cxcywh_to_xyxy(cx: f32, cy: f32, w: f32, h: f32) -> (f32, f32, f32, f32) {
    let x1 = cx - w / 2.0;
    let y1 = cy - h / 2.0;
    let x2 = cx + w / 2.0;
    let y2 = cy + h / 2.0;
    (x1, y1, x2, y2)
}
