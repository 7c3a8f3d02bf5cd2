use crate::common::Detection;
use crate::detection_runners::ort_detector::nms::nms;

/// Inference results for one image.
#[derive(Clone, PartialEq, Default)]
pub struct Y {
    detections: Option<Vec<Detection>>,
}

impl std::fmt::Debug for Y {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut f = f.debug_struct("Y");
        if let Some(x) = &self.detections {
            if !x.is_empty() {
                f.field("Detections", &x);
            }
        }
        f.finish()
    }
}

impl Y {
    pub fn with_detections(mut self, detections: Vec<Detection>) -> Self {
        self.detections = Some(detections);
        self
    }

    pub fn detections(&self) -> Option<&Vec<Detection>> {
        self.detections.as_ref()
    }

    /// Consumes the result, yielding its detections (empty when none).
    pub fn into_detections(self) -> Vec<Detection> {
        self.detections.unwrap_or_default()
    }

    pub fn apply_nms(mut self, iou_threshold: f32) -> Self {
        if let Some(ref mut bboxes) = self.detections {
            nms(bboxes, iou_threshold);
        }
        self
    }
}
