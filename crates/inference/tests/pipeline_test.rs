//! End-to-end detector tests with a scripted backend: real decoding,
//! letterboxing, YOLO decoding, NMS and catalog mapping.

use image::{ImageFormat, Rgb, RgbImage};
use inference::{
    Detector, InferenceBackend, InferenceConfig, InferenceOutput, YoloDetector,
    labels::coco_labels,
};
use ndarray::{Array, ArrayD, IxDyn};
use schema::BoundingBox;
use std::io::Cursor;

const ANCHORS: usize = 8400;
const BOTTLE: usize = 39;
const CUP: usize = 41;

/// Emits a fixed `[1, 84, 8400]` head output regardless of input.
struct ScriptedBackend {
    output: ArrayD<f32>,
}

impl ScriptedBackend {
    fn new(boxes: &[([f32; 4], usize, f32)]) -> Self {
        let mut output = ArrayD::zeros(IxDyn(&[1, 84, ANCHORS]));
        for (i, (bbox, class_id, score)) in boxes.iter().enumerate() {
            for (k, v) in bbox.iter().enumerate() {
                output[[0, k, i]] = *v;
            }
            output[[0, 4 + class_id, i]] = *score;
        }
        Self { output }
    }
}

impl InferenceBackend for ScriptedBackend {
    fn load_model(_path: &str, _config: &InferenceConfig) -> anyhow::Result<Self> {
        Ok(Self::new(&[]))
    }

    fn infer(&mut self, images: &Array<f32, IxDyn>) -> anyhow::Result<InferenceOutput> {
        assert_eq!(images.shape(), &[1, 3, 640, 640]);
        Ok(InferenceOutput {
            predictions: self.output.clone(),
        })
    }
}

fn config() -> InferenceConfig {
    InferenceConfig {
        model_path: "unused.onnx".into(),
        fallback_model_path: "unused.onnx".into(),
        labels_path: None,
        input_size: (640, 640),
        iou_threshold: 0.7,
        max_detections: 300,
        intra_threads: 1,
        execution_provider: inference::ExecutionProvider::Cpu,
    }
}

fn detector(boxes: &[([f32; 4], usize, f32)]) -> Detector {
    let model = YoloDetector::new("scripted", ScriptedBackend::new(boxes), coco_labels(), &config());
    Detector::new(Box::new(model))
}

fn shelf_jpeg(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, _| {
        if (350..450).contains(&x) {
            Rgb([30, 90, 40])
        } else {
            Rgb([200, 200, 200])
        }
    });
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Jpeg).unwrap();
    buffer.into_inner()
}

#[test]
fn test_bottle_on_800x600_shelf() {
    // Letterbox: scale 0.8, offset_y 80. Box (280,200)-(360,440) in model
    // space maps to (350,150)-(450,450) in the photo.
    let detector = detector(&[([320.0, 320.0, 80.0, 240.0], BOTTLE, 0.91)]);

    let result = detector.detect(&shelf_jpeg(800, 600), 0.5).unwrap();

    assert_eq!((result.image_width, result.image_height), (800, 600));
    assert_eq!(result.detections.len(), 1);

    let bottle = &result.detections[0];
    assert_eq!(bottle.sku_name, "generic-bottle-750ml");
    assert_eq!(bottle.brand.as_deref(), Some("Unknown"));
    assert_eq!(bottle.confidence, 0.91);

    let BoundingBox { x1, y1, x2, y2 } = bottle.bbox;
    assert!((x1 - 350).abs() <= 1, "x1 = {}", x1);
    assert!((y1 - 150).abs() <= 1, "y1 = {}", y1);
    assert!((x2 - 450).abs() <= 1, "x2 = {}", x2);
    assert!((y2 - 450).abs() <= 1, "y2 = {}", y2);
}

#[test]
fn test_threshold_controls_detection_count() {
    let detector = detector(&[
        ([100.0, 300.0, 40.0, 120.0], BOTTLE, 0.92),
        ([200.0, 300.0, 40.0, 120.0], BOTTLE, 0.61),
        ([300.0, 300.0, 40.0, 60.0], CUP, 0.34),
    ]);
    let jpeg = shelf_jpeg(800, 600);

    assert_eq!(detector.detect(&jpeg, 0.5).unwrap().detections.len(), 2);
    assert_eq!(detector.detect(&jpeg, 0.3).unwrap().detections.len(), 3);
    assert_eq!(detector.detect(&jpeg, 0.95).unwrap().detections.len(), 0);
}

#[test]
fn test_duplicate_boxes_are_suppressed() {
    let detector = detector(&[
        ([320.0, 320.0, 80.0, 240.0], BOTTLE, 0.91),
        ([321.0, 322.0, 80.0, 240.0], BOTTLE, 0.88),
    ]);

    let result = detector.detect(&shelf_jpeg(800, 600), 0.5).unwrap();
    assert_eq!(result.detections.len(), 1);
    assert_eq!(result.detections[0].confidence, 0.91);
}

#[test]
fn test_every_detection_satisfies_output_invariants() {
    let detector = detector(&[
        ([5.0, 90.0, 60.0, 60.0], BOTTLE, 0.777),
        ([630.0, 550.0, 60.0, 60.0], CUP, 0.999),
        ([320.0, 320.0, 10.0, 10.0], 0, 0.5),
    ]);

    let result = detector.detect(&shelf_jpeg(800, 600), 0.5).unwrap();
    assert_eq!(result.detections.len(), 3);

    for d in &result.detections {
        assert!((0.0..=1.0).contains(&d.confidence));
        assert_eq!((d.confidence * 100.0).round() / 100.0, d.confidence);
        assert!(d.bbox.x1 <= d.bbox.x2 && d.bbox.y1 <= d.bbox.y2);
        assert!(d.bbox.x1 >= 0 && d.bbox.x2 <= 800);
        assert!(d.bbox.y1 >= 0 && d.bbox.y2 <= 600);
    }

    let person = result
        .detections
        .iter()
        .find(|d| d.sku_name == "person-unknown")
        .unwrap();
    assert_eq!(person.brand.as_deref(), Some("Unknown"));
}
