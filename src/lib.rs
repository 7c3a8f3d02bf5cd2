mod utils;
pub mod analytics;
pub mod annotate;
pub mod common;
pub mod data;
pub mod detection_runners;
pub mod detectors;
pub mod error;
pub mod model_cache;

use std::path::Path;
use std::time::Instant;
use crate::analytics::AnalysisResult;
use crate::common::{InputImage, ModelConfig};
use crate::detectors::Detector;

pub use crate::error::DetectError;

pub type Result<T, E = DetectError> = std::result::Result<T, E>;

/// Detects objects in `image_bytes` with the model at `model_path` and
/// analyses their overlaps.
///
/// Returns the PNG-encoded annotated image and the analysis. The model is
/// loaded once per process with [`ModelConfig`] defaults and reused.
pub fn analyze(image_bytes: &[u8], model_path: impl AsRef<Path>) -> Result<(Vec<u8>, AnalysisResult)> {
    analyze_with_config(image_bytes, &ModelConfig::new(model_path))
}

/// Like [`analyze`], with explicit model options.
pub fn analyze_with_config(image_bytes: &[u8], config: &ModelConfig) -> Result<(Vec<u8>, AnalysisResult)> {
    let image = InputImage::decode(image_bytes)?;
    let detector = model_cache::load_detector(config)?;
    let mut detector = detector.lock();
    analyze_image(&mut *detector, &image)
}

/// Runs the pipeline with any detection backend.
pub fn analyze_with<D: Detector + ?Sized>(detector: &mut D, image_bytes: &[u8]) -> Result<(Vec<u8>, AnalysisResult)> {
    let image = detector.decode_image(image_bytes)?;
    analyze_image(detector, &image)
}

fn analyze_image<D: Detector + ?Sized>(detector: &mut D, image: &InputImage) -> Result<(Vec<u8>, AnalysisResult)> {
    let now = Instant::now();

    let detections = detector.run_inference(image)?;
    let annotated = detector.render_annotations(image, &detections)?;
    let png = annotate::encode_png(&annotated).map_err(DetectError::inference)?;
    let result = analytics::analyze_detections(detections)?;

    log::info!(
        "Analyzed {}x{} image: {} detections, {} pairs in {:.2?}",
        image.width(),
        image.height(),
        result.total_detections,
        result.jaccard_indices.len(),
        now.elapsed()
    );

    Ok((png, result))
}
