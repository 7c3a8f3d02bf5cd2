use std::io::Cursor;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use overlap_detect::analytics::{AnalysisResult, OverlapLevel};
use overlap_detect::common::{BoundingBox, Detection, InputImage};
use overlap_detect::detectors::Detector;
use overlap_detect::DetectError;

/// Returns a fixed set of boxes, labelled through its own label table.
struct FixedDetector {
    names: Vec<String>,
    found: Vec<(usize, f32, [f32; 4])>,
    calls: usize,
}

impl FixedDetector {
    fn new(found: Vec<(usize, f32, [f32; 4])>) -> Self {
        Self {
            names: vec!["person".to_string(), "bicycle".to_string(), "car".to_string()],
            found,
            calls: 0,
        }
    }
}

impl Detector for FixedDetector {
    fn run_inference(&mut self, _image: &InputImage) -> overlap_detect::Result<Vec<Detection>> {
        self.calls += 1;
        Ok(self
            .found
            .iter()
            .map(|&(class_id, conf, bbox)| {
                Detection::new(class_id, &self.resolve_class_name(class_id), conf, BoundingBox::from(bbox))
            })
            .collect())
    }

    fn resolve_class_name(&self, class_id: usize) -> String {
        self.names.get(class_id).cloned().unwrap_or_else(|| format!("# {}", class_id))
    }
}

struct FailingDetector;

impl Detector for FailingDetector {
    fn run_inference(&mut self, _image: &InputImage) -> overlap_detect::Result<Vec<Detection>> {
        Err(DetectError::Inference("runtime exploded".to_string()))
    }

    fn resolve_class_name(&self, class_id: usize) -> String {
        class_id.to_string()
    }
}

fn encoded_image(format: ImageFormat) -> Vec<u8> {
    let image = RgbImage::from_pixel(64, 48, Rgb([200, 200, 200]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image).write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

#[test]
fn full_pipeline_with_fixed_detections() {
    let mut detector = FixedDetector::new(vec![
        (0, 0.9, [0., 0., 10., 10.]),
        (1, 0.7, [5., 5., 15., 15.]),
        (0, 0.8, [20., 20., 30., 30.]),
    ]);

    let (png, result) = overlap_detect::analyze_with(&mut detector, &encoded_image(ImageFormat::Png)).unwrap();
    assert_eq!(detector.calls, 1);

    let annotated = InputImage::decode(&png).unwrap();
    assert_eq!(annotated.dimensions(), (64, 48));
    assert_ne!(*annotated.get_pixel(0, 0), Rgb([200, 200, 200]));

    assert_eq!(result.total_detections, 3);
    assert_eq!(result.class_counts.get("person"), Some(&2));
    assert_eq!(result.class_counts.get("bicycle"), Some(&1));
    assert!((result.average_confidence - 0.8).abs() < 1e-6);

    let pairs: Vec<(&str, OverlapLevel)> = result
        .jaccard_indices
        .iter()
        .map(|r| (r.detection_pair.as_str(), r.overlap_level))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("person & bicycle", OverlapLevel::Low),
            ("person & person", OverlapLevel::None),
            ("bicycle & person", OverlapLevel::None),
        ]
    );
    assert!((result.jaccard_indices[0].jaccard_index - 0.142857).abs() < 1e-5);
}

#[test]
fn accepts_jpeg_and_bmp() {
    for format in [ImageFormat::Jpeg, ImageFormat::Bmp] {
        let mut detector = FixedDetector::new(vec![(2, 0.5, [1., 1., 9., 9.])]);
        let (_, result) = overlap_detect::analyze_with(&mut detector, &encoded_image(format)).unwrap();
        assert_eq!(result.class_counts.get("car"), Some(&1));
        assert!(result.jaccard_indices.is_empty());
    }
}

#[test]
fn no_detections() {
    let mut detector = FixedDetector::new(Vec::new());
    let (png, result) = overlap_detect::analyze_with(&mut detector, &encoded_image(ImageFormat::Png)).unwrap();

    assert!(!png.is_empty());
    assert_eq!(result, AnalysisResult::default());
    assert_eq!(result.average_confidence, 0.0);
}

#[test]
fn undecodable_bytes_fail_before_inference() {
    let mut detector = FixedDetector::new(vec![(0, 0.9, [0., 0., 1., 1.])]);
    let err = overlap_detect::analyze_with(&mut detector, b"GIF89a not really").unwrap_err();
    assert!(matches!(err, DetectError::ImageDecode(_)));
    assert_eq!(detector.calls, 0);
}

#[test]
fn unsupported_format_is_a_decode_error() {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(2, 2))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Tiff)
        .unwrap();
    let mut detector = FixedDetector::new(Vec::new());
    let err = overlap_detect::analyze_with(&mut detector, &bytes).unwrap_err();
    assert!(matches!(err, DetectError::ImageDecode(_)));
}

#[test]
fn inference_errors_propagate_without_partial_output() {
    let err = overlap_detect::analyze_with(&mut FailingDetector, &encoded_image(ImageFormat::Png)).unwrap_err();
    assert!(matches!(err, DetectError::Inference(_)));
    assert!(err.to_string().contains("runtime exploded"));
}

#[test]
fn missing_model_is_a_load_error() {
    let err = overlap_detect::analyze(&encoded_image(ImageFormat::Png), "/nonexistent/model.onnx").unwrap_err();
    assert!(matches!(err, DetectError::ModelLoad(_)), "{err}");
    assert_eq!(overlap_detect::model_cache::loaded_models(), 0);
}

#[test]
fn decode_is_checked_before_model_load() {
    let err = overlap_detect::analyze(b"nope", "/nonexistent/model.onnx").unwrap_err();
    assert!(matches!(err, DetectError::ImageDecode(_)));
}

#[test]
fn result_json_round_trip() {
    let mut detector = FixedDetector::new(vec![
        (0, 0.91, [1.5, 2.25, 30., 40.]),
        (2, 0.42, [10., 12., 50.75, 44.]),
    ]);
    let (_, result) = overlap_detect::analyze_with(&mut detector, &encoded_image(ImageFormat::Png)).unwrap();

    let json = result.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["total_detections"], 2);
    assert_eq!(value["class_counts"]["car"], 1);
    assert_eq!(value["detections"][0]["class_name"], "person");
    assert_eq!(value["detections"][1]["bbox"], serde_json::json!([10.0, 12.0, 50.75, 44.0]));
    assert_eq!(value["jaccard_indices"][0]["detection_pair"], "person & car");
    assert!(value["detections"][0].get("class_id").is_none());

    let back = AnalysisResult::from_json(&json).unwrap();
    assert_eq!(back.total_detections, result.total_detections);
    assert_eq!(back.class_counts, result.class_counts);
    assert!((back.average_confidence - result.average_confidence).abs() < 1e-6);
    assert_eq!(back.jaccard_indices, result.jaccard_indices);
    for (a, b) in back.detections.iter().zip(&result.detections) {
        assert_eq!(a.class_name, b.class_name);
        assert_eq!(a.bbox, b.bbox);
        assert!((a.confidence - b.confidence).abs() < 1e-6);
    }
}
