use std::path::PathBuf;
use std::time::Instant;
use overlap_detect::common::ModelConfig;
use overlap_detect::model_cache;

/// Needs a YOLO ONNX export and a test image:
///
/// ```text
/// OVERLAP_DETECT_MODEL=models/yolov8n.onnx OVERLAP_DETECT_IMAGE=tests/people.jpg \
///     cargo test --test test_detection -- --ignored
/// ```
#[test]
#[ignore]
fn detection() {
    /////////////////////
    // Testing variables
    let loop_count: u32 = 3;
    let model_path = PathBuf::from(std::env::var("OVERLAP_DETECT_MODEL").expect("OVERLAP_DETECT_MODEL not set"));
    let image_path = PathBuf::from(std::env::var("OVERLAP_DETECT_IMAGE").expect("OVERLAP_DETECT_IMAGE not set"));
    let ort_lib_path = std::env::var("ORT_LIB_PATH").unwrap_or_default();
    /////////////////////

    let config = ModelConfig {
        ort_lib_path,
        ..ModelConfig::new(&model_path)
    };
    let image_bytes = std::fs::read(&image_path).unwrap();

    let mut previous = None;
    for count in 0..loop_count {
        let now = Instant::now();
        let (png, result) = overlap_detect::analyze_with_config(&image_bytes, &config).unwrap();
        println!("TIME | {}th run={:.2?}", count, now.elapsed());
        println!("{}", result);

        assert!(!png.is_empty());
        assert_eq!(result.class_counts.values().sum::<usize>(), result.total_detections);
        let n = result.total_detections;
        assert_eq!(result.jaccard_indices.len(), n * n.saturating_sub(1) / 2);
        for det in &result.detections {
            assert!((0.0..=1.0).contains(&det.confidence));
            assert!(det.bbox.x1 < det.bbox.x2 && det.bbox.y1 < det.bbox.y2);
        }

        // the cached model gives the same answer every time
        if let Some(previous) = &previous {
            assert_eq!(previous, &result);
        }
        previous = Some(result);
    }

    assert_eq!(model_cache::loaded_models(), 1);
}
