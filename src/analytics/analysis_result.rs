use std::collections::BTreeMap;
use std::fmt::{self, Write};
use serde::{Deserialize, Serialize};
use crate::analytics::OverlapLevel;
use crate::common::Detection;

/// Detection count per class name.
pub type ClassHistogram = BTreeMap<String, usize>;

/// Overlap between two detections of one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JaccardRecord {
    /// `"{class_i} & {class_j}"`
    pub detection_pair: String,
    pub jaccard_index: f32,
    pub overlap_level: OverlapLevel,
}

/// Everything computed for one image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub total_detections: usize,
    pub class_counts: ClassHistogram,
    pub average_confidence: f32,
    pub detections: Vec<Detection>,
    pub jaccard_indices: Vec<JaccardRecord>,
}

impl AnalysisResult {
    /// Number of distinct class names detected.
    pub fn unique_classes(&self) -> usize {
        self.class_counts.len()
    }

    /// Mean of all pairwise Jaccard indices, `None` without pairs.
    pub fn average_jaccard(&self) -> Option<f32> {
        if self.jaccard_indices.is_empty() {
            return None;
        }
        let sum: f32 = self.jaccard_indices.iter().map(|r| r.jaccard_index).sum();
        Some(sum / self.jaccard_indices.len() as f32)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Plain-text report of the metrics, classes, detections and overlaps.
    pub fn report(&self) -> String {
        self.to_string()
    }

    fn write_report<W: Write>(&self, out: &mut W) -> fmt::Result {
        writeln!(out, "Total Detections: {}", self.total_detections)?;
        writeln!(out, "Avg Confidence: {:.2}%", self.average_confidence * 100.)?;
        writeln!(out, "Unique Classes: {}", self.unique_classes())?;

        if !self.class_counts.is_empty() {
            writeln!(out, "\nClasses:")?;
            for (class_name, count) in &self.class_counts {
                writeln!(out, "  {}: {} detection(s)", class_name, count)?;
            }
        }

        if !self.detections.is_empty() {
            writeln!(out, "\nDetections:")?;
            for (i, det) in self.detections.iter().enumerate() {
                writeln!(
                    out,
                    "  {:>3}  {:<20} {:>7.2}%  [{:.1}, {:.1}, {:.1}, {:.1}]",
                    i + 1,
                    det.class_name,
                    det.confidence * 100.,
                    det.bbox.x1,
                    det.bbox.y1,
                    det.bbox.x2,
                    det.bbox.y2,
                )?;
            }
        }

        if self.jaccard_indices.is_empty() {
            writeln!(out, "\nJaccard Index: no pairs (needs 2+ detections)")?;
        } else {
            writeln!(out, "\nJaccard Indices:")?;
            for record in &self.jaccard_indices {
                writeln!(
                    out,
                    "  {:<30} {:.4}  {}",
                    record.detection_pair, record.jaccard_index, record.overlap_level
                )?;
            }
            if let Some(avg) = self.average_jaccard() {
                writeln!(out, "Average Jaccard Index: {:.4}", avg)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_report(f)
    }
}
