//! YOLO generations and the output tensor layouts they produce.

use ndarray::{ArrayView, Axis, IxDyn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelVersion {
    YoloV5,
    YoloV6,
    YoloV7,
    #[default] YoloV8,
    YoloV9,
    YoloV10,
    YoloV11,
    YoloV12,
}

impl ModelVersion {
    pub fn name(&self) -> &'static str {
        match self {
            Self::YoloV5 => "YoloV5",
            Self::YoloV6 => "YoloV6",
            Self::YoloV7 => "YoloV7",
            Self::YoloV8 => "YoloV8",
            Self::YoloV9 => "YoloV9",
            Self::YoloV10 => "YoloV10",
            Self::YoloV11 => "YoloV11",
            Self::YoloV12 => "YoloV12",
        }
    }

    /// Accepts `yolov8`, `v8` or `8` spellings.
    pub fn from_name(version: &str) -> Option<ModelVersion> {
        let version = version.to_lowercase();
        let digits = version.trim_start_matches("yolo").trim_start_matches('v');
        match digits {
            "5" => Some(ModelVersion::YoloV5),
            "6" => Some(ModelVersion::YoloV6),
            "7" => Some(ModelVersion::YoloV7),
            "8" => Some(ModelVersion::YoloV8),
            "9" => Some(ModelVersion::YoloV9),
            "10" => Some(ModelVersion::YoloV10),
            "11" => Some(ModelVersion::YoloV11),
            "12" => Some(ModelVersion::YoloV12),
            _ => None,
        }
    }

    /// Output layout of the exported detection head.
    pub fn preds(&self) -> YoloPreds {
        match self {
            Self::YoloV5 | Self::YoloV6 | Self::YoloV7 => YoloPreds::n_a_cxcywh_confclss(),
            Self::YoloV8 | Self::YoloV9 | Self::YoloV11 | Self::YoloV12 => YoloPreds::n_cxcywh_clss_a(),
            Self::YoloV10 => YoloPreds::n_a_xyxy_confcls().apply_nms(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoxType {
    /// Center, width, height
    Cxcywh,

    /// Top-left, bottom-right
    Xyxy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClssType {
    /// Per-class scores only
    Clss,
    /// Objectness followed by per-class scores
    ConfClss,
    /// Single score followed by the class id
    ConfCls,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnchorsPosition {
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YoloPreds {
    pub clss: ClssType,
    pub bbox: BoxType,
    pub anchors: AnchorsPosition,
    pub is_bbox_normalized: bool,
    pub apply_nms: bool,
}

/// Slices of one image's predictions: boxes, optional class ids, scores,
/// optional objectness.
pub type PredSlices<'a> = (
    ArrayView<'a, f32, IxDyn>,
    Option<ArrayView<'a, f32, IxDyn>>,
    ArrayView<'a, f32, IxDyn>,
    Option<ArrayView<'a, f32, IxDyn>>,
);

impl YoloPreds {
    pub fn apply_nms(mut self, x: bool) -> Self {
        self.apply_nms = x;
        self
    }

    pub fn n_a_cxcywh_confclss() -> Self {
        // YOLOv5 | YOLOv6 | YOLOv7 : NACxcywhConfClss
        Self {
            bbox: BoxType::Cxcywh,
            clss: ClssType::ConfClss,
            anchors: AnchorsPosition::Before,
            is_bbox_normalized: false,
            apply_nms: true,
        }
    }

    pub fn n_cxcywh_clss_a() -> Self {
        // YOLOv8 | YOLOv9 | YOLO11 : NCxcywhClssA
        Self {
            bbox: BoxType::Cxcywh,
            clss: ClssType::Clss,
            anchors: AnchorsPosition::After,
            is_bbox_normalized: false,
            apply_nms: true,
        }
    }

    pub fn n_a_xyxy_confcls() -> Self {
        // YOLOv10 : NAXyxyConfCls
        Self {
            bbox: BoxType::Xyxy,
            clss: ClssType::ConfCls,
            anchors: AnchorsPosition::Before,
            is_bbox_normalized: false,
            apply_nms: true,
        }
    }

    pub fn box_type(&self) -> &BoxType {
        &self.bbox
    }

    pub fn is_anchors_first(&self) -> bool {
        matches!(self.anchors, AnchorsPosition::Before)
    }

    /// Width of one prediction row for `nc` classes.
    pub fn row_len(&self, nc: usize) -> usize {
        match self.clss {
            ClssType::Clss => 4 + nc,
            ClssType::ConfClss => 5 + nc,
            ClssType::ConfCls => 6,
        }
    }

    /// Splits one image's predictions (anchors x row, or row x anchors) into
    /// its parts. Returns `None` when the row width does not match `nc`.
    pub fn parse_preds<'a>(&self, x: ArrayView<'a, f32, IxDyn>, nc: usize) -> Option<PredSlices<'a>> {
        if x.ndim() != 2 {
            return None;
        }
        let x = if self.is_anchors_first() {
            x
        } else {
            x.reversed_axes()
        };
        if x.shape()[1] < self.row_len(nc) {
            return None;
        }

        let (slice_bboxes, xs) = x.split_at(Axis(1), 4);

        let (slice_id, slice_clss, slice_confs) = match self.clss {
            ClssType::ConfClss => {
                let (confs, xs) = xs.split_at(Axis(1), 1);
                let (clss, _) = xs.split_at(Axis(1), nc);
                (None, clss, Some(confs))
            }
            ClssType::ConfCls => {
                let (clss, xs) = xs.split_at(Axis(1), 1);
                let (ids, _) = xs.split_at(Axis(1), 1);
                (Some(ids), clss, None)
            }
            ClssType::Clss => {
                let (clss, _) = xs.split_at(Axis(1), nc);
                (None, clss, None)
            }
        };

        Some((slice_bboxes, slice_id, slice_clss, slice_confs))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::Array;
    use super::*;

    #[test]
    fn version_names() {
        assert_eq!(ModelVersion::from_name("YOLOv8"), Some(ModelVersion::YoloV8));
        assert_eq!(ModelVersion::from_name("v11"), Some(ModelVersion::YoloV11));
        assert_eq!(ModelVersion::from_name("10"), Some(ModelVersion::YoloV10));
        assert_eq!(ModelVersion::from_name("yolov4"), None);
        assert!(!ModelVersion::YoloV10.preds().apply_nms);
    }

    #[test]
    fn parses_anchors_last_layout() {
        // 2 classes, 3 anchors, stored row-major as (4 + nc) x anchors
        let raw: Vec<f32> = (0..18).map(|x| x as f32).collect();
        let x = Array::from_shape_vec(IxDyn(&[6, 3]), raw).unwrap();
        let preds = YoloPreds::n_cxcywh_clss_a();
        let (bboxes, ids, clss, confs) = preds.parse_preds(x.view(), 2).unwrap();
        assert_eq!(bboxes.shape(), &[3, 4]);
        assert_eq!(clss.shape(), &[3, 2]);
        assert!(ids.is_none() && confs.is_none());
        // first anchor's box is the first column
        assert_eq!(bboxes[[0, 0]], 0.);
        assert_eq!(bboxes[[0, 1]], 3.);
        assert_eq!(clss[[2, 1]], 17.);
    }

    #[test]
    fn rejects_mismatched_class_count() {
        let x = Array::<f32, _>::zeros(IxDyn(&[6, 3]));
        assert!(YoloPreds::n_cxcywh_clss_a().parse_preds(x.view(), 80).is_none());
    }
}
