//! Pairwise overlap statistics over the detections of one image.

mod analysis_result;
mod jaccard;
mod overlap_level;

pub use analysis_result::*;
pub use jaccard::jaccard_index;
pub use overlap_level::OverlapLevel;

use crate::common::Detection;
use crate::error::DetectError;

/// Joins two class names into a pair label.
pub const PAIR_SEPARATOR: &str = " & ";

/// Aggregates a detection set into an [`AnalysisResult`].
///
/// Every unordered pair `(i, j)`, `i < j`, is scored regardless of class, in
/// increasing `i` then increasing `j`. Detection order is kept as given.
pub fn analyze_detections(detections: Vec<Detection>) -> Result<AnalysisResult, DetectError> {
    let total_detections = detections.len();

    let mut class_counts = ClassHistogram::new();
    let mut confidence_sum = 0.0f64;
    for det in &detections {
        if !det.confidence.is_finite() {
            return Err(DetectError::Analytics(format!(
                "non-finite confidence for a '{}' detection",
                det.class_name
            )));
        }
        *class_counts.entry(det.class_name.clone()).or_insert(0) += 1;
        confidence_sum += det.confidence as f64;
    }

    let average_confidence = if total_detections == 0 {
        0.0
    } else {
        (confidence_sum / total_detections as f64) as f32
    };

    let mut jaccard_indices = Vec::with_capacity(total_detections * total_detections.saturating_sub(1) / 2);
    for (i, a) in detections.iter().enumerate() {
        for b in &detections[i + 1..] {
            let jaccard = jaccard_index(&a.bbox, &b.bbox);
            if !jaccard.is_finite() {
                return Err(DetectError::Analytics(format!(
                    "non-finite Jaccard index between {:?} and {:?}",
                    a.bbox, b.bbox
                )));
            }
            jaccard_indices.push(JaccardRecord {
                detection_pair: format!("{}{}{}", a.class_name, PAIR_SEPARATOR, b.class_name),
                jaccard_index: jaccard,
                overlap_level: OverlapLevel::from_jaccard(jaccard),
            });
        }
    }

    log::debug!(
        "Analyzed {} detections: {} classes, {} pairs",
        total_detections,
        class_counts.len(),
        jaccard_indices.len()
    );

    Ok(AnalysisResult {
        total_detections,
        class_counts,
        average_confidence,
        detections,
        jaccard_indices,
    })
}
