use serde::{Deserialize, Serialize};

/// Qualitative reading of a Jaccard index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OverlapLevel {
    #[serde(rename = "No Overlap")]
    None,
    #[serde(rename = "Minimal Overlap")]
    Minimal,
    #[serde(rename = "Low Overlap")]
    Low,
    #[serde(rename = "Moderate Overlap")]
    Moderate,
    #[serde(rename = "High Overlap")]
    High,
    #[serde(rename = "Very High Overlap")]
    VeryHigh,
}

impl OverlapLevel {
    /// Buckets: exactly 0, below 0.1, 0.3, 0.5, 0.7, and the rest.
    pub fn from_jaccard(jaccard_index: f32) -> Self {
        match jaccard_index {
            x if x == 0.0 => OverlapLevel::None,
            x if x < 0.1 => OverlapLevel::Minimal,
            x if x < 0.3 => OverlapLevel::Low,
            x if x < 0.5 => OverlapLevel::Moderate,
            x if x < 0.7 => OverlapLevel::High,
            _ => OverlapLevel::VeryHigh,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OverlapLevel::None => "No Overlap",
            OverlapLevel::Minimal => "Minimal Overlap",
            OverlapLevel::Low => "Low Overlap",
            OverlapLevel::Moderate => "Moderate Overlap",
            OverlapLevel::High => "High Overlap",
            OverlapLevel::VeryHigh => "Very High Overlap",
        }
    }
}

impl std::fmt::Display for OverlapLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
