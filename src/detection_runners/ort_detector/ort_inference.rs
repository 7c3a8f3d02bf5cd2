use anyhow::Result;
use ndarray::{s, ArrayView, Axis, IxDyn};
use rayon::prelude::*;
use regex::Regex;

use crate::common::{BoundingBox, BoxType, Detection, InputImage, YoloPreds};
use crate::data::{ConfigOrt, DynConf, Xs, Y};
use crate::detection_runners::image_ops;
use crate::detection_runners::inference_process::InferenceProcess;
use crate::detection_runners::ort_detector::OrtEngine;

/// YOLO detector running on ONNX Runtime.
#[derive(Debug)]
pub struct OrtYOLO {
    engine: OrtEngine,
    confs: DynConf,
    iou: f32,
    names: Vec<String>,
    layout: YoloPreds,
}

impl InferenceProcess for OrtYOLO {
    type Input = InputImage;

    fn new(options: ConfigOrt) -> Result<Self> {
        let version = match options.yolo_version {
            Some(version) => version,
            None => anyhow::bail!("No YOLO version specified."),
        };
        let engine = OrtEngine::new(&options)?;

        // Class names: user-defined.or(parsed)
        let names_parsed = engine.try_fetch("names").map(|raw| Self::parse_names(&raw));
        let names = match names_parsed {
            Some(names_parsed) => match options.names {
                Some(names) => {
                    if names.len() == names_parsed.len() {
                        Some(names)
                    } else {
                        anyhow::bail!(
                            "The lengths of parsed class names: {} and user-defined class names: {} do not match.",
                            names_parsed.len(),
                            names.len(),
                        );
                    }
                }
                None => Some(names_parsed),
            },
            None => options.names,
        };

        // nc: names.len().or(options.nc)
        let nc = match &names {
            Some(names) => names.len(),
            None => match options.nc {
                Some(nc) => nc,
                None => anyhow::bail!(
                    "Unable to obtain the number of classes. The model carries no `names` metadata; \
                    provide a labels file or set the class count explicitly."
                ),
            },
        };

        let names = match names {
            None => Self::n2s(nc),
            Some(names) => names,
        };

        let confs = DynConf::new(&options.confs, nc);
        let iou = options.iou.unwrap_or(0.45);

        log::info!(
            "YOLO Version: {} | Classes: {} | Input: {}x{}",
            version.name(),
            nc,
            engine.model_width(),
            engine.model_height(),
        );

        Ok(Self {
            engine,
            confs,
            iou,
            names,
            layout: version.preds(),
        })
    }

    fn preprocess(&self, xs: &[Self::Input]) -> Result<Xs> {
        let firs = xs
            .iter()
            .map(|x| image_ops::to_fir_image(x))
            .collect::<Result<Vec<_>>>()?;
        let x = image_ops::preprocess(&firs, self.height(), self.width())?;
        Ok(Xs::from(x))
    }

    fn inference(&mut self, xs: Xs) -> Result<Xs> {
        self.engine.run(xs)
    }

    fn postprocess(&self, xs: Xs, xs0: &[Self::Input]) -> Result<Vec<Y>> {
        if xs.is_empty() {
            anyhow::bail!("Model produced no outputs");
        }
        let preds_batch = &xs[0];
        if preds_batch.ndim() != 3 || preds_batch.shape()[0] != xs0.len() {
            anyhow::bail!(
                "Unexpected YOLO output shape {:?} for a batch of {}",
                preds_batch.shape(),
                xs0.len()
            );
        }

        preds_batch
            .axis_iter(Axis(0))
            .zip(xs0)
            .map(|(preds, image)| {
                decode_preds(
                    preds,
                    &self.layout,
                    &self.confs,
                    self.iou,
                    &self.names,
                    (self.width(), self.height()),
                    image.dimensions(),
                )
            })
            .collect()
    }

    fn print_time(&self) {
        log::info!("Avg: {:?}", self.engine.infer_time.avg());
    }
}

/// Turns one image's raw predictions into detections in image pixels.
///
/// `preds` is the per-image `anchors x row` (or `row x anchors`) slice of the
/// model output. Boxes are scaled back through the letterbox of `image_size`
/// into `model_size`, clamped to the image and dropped when empty. Scores
/// below the class threshold are dropped. NMS runs when the layout needs it.
pub fn decode_preds(
    preds: ArrayView<f32, IxDyn>,
    layout: &YoloPreds,
    confs: &DynConf,
    iou: f32,
    names: &[String],
    model_size: (u32, u32),
    image_size: (u32, u32),
) -> Result<Y> {
    let nc = names.len();
    let shape = preds.shape().to_vec();
    let (slice_bboxes, slice_id, slice_clss, slice_confs) = layout
        .parse_preds(preds, nc)
        .ok_or_else(|| anyhow::anyhow!("YOLO output rows do not fit {} classes (shape {:?})", nc, shape))?;

    let (model_width, model_height) = (model_size.0 as f32, model_size.1 as f32);
    let (image_width, image_height) = (image_size.0 as f32, image_size.1 as f32);
    let ratio = image_ops::letterbox_ratio(image_size.0, image_size.1, model_size.0, model_size.1);

    let y_bboxes = slice_bboxes
        .axis_iter(Axis(0))
        .into_par_iter()
        .enumerate()
        .filter_map(|(i, bbox)| {
            // confidence & class_id
            let (class_id, confidence) = match &slice_id {
                Some(ids) => (ids[[i, 0]] as usize, slice_clss[[i, 0]]),
                None => {
                    let (class_id, &confidence) = slice_clss
                        .slice(s![i, ..])
                        .into_iter()
                        .enumerate()
                        .max_by(|a, b| a.1.total_cmp(b.1))?;

                    match &slice_confs {
                        None => (class_id, confidence),
                        Some(slice_confs) => (class_id, confidence * slice_confs[[i, 0]]),
                    }
                }
            };

            // filtering low scores
            if class_id >= nc || confidence < confs[class_id] {
                return None;
            }

            let bbox = if layout.is_bbox_normalized {
                (
                    bbox[0] * model_width,
                    bbox[1] * model_height,
                    bbox[2] * model_width,
                    bbox[3] * model_height,
                )
            } else {
                (bbox[0], bbox[1], bbox[2], bbox[3])
            };
            let (a, b, c, d) = (bbox.0 / ratio, bbox.1 / ratio, bbox.2 / ratio, bbox.3 / ratio);

            let bbox = match layout.box_type() {
                BoxType::Cxcywh => BoundingBox::from_cxcy_wh(a, b, c, d),
                BoxType::Xyxy => BoundingBox::new(a, b, c, d),
            }
            .clamp_to(image_width, image_height);

            if bbox.is_degenerate() {
                return None;
            }

            let detection = Detection::default()
                .with_bbox(bbox)
                .with_confidence(confidence.clamp(0., 1.))
                .with_class_id(class_id)
                .with_class_name(&class_name(names, class_id));

            Some(detection)
        })
        .collect::<Vec<_>>();

    let mut y = Y::default().with_detections(y_bboxes);
    if layout.apply_nms {
        y = y.apply_nms(iou);
    }

    Ok(y)
}

/// Label for `class_id`, `"# {id}"` when outside the label table.
pub fn class_name(names: &[String], class_id: usize) -> String {
    names
        .get(class_id)
        .cloned()
        .unwrap_or_else(|| format!("# {}", class_id))
}

impl OrtYOLO {
    pub fn width(&self) -> u32 {
        self.engine.model_width()
    }

    pub fn height(&self) -> u32 {
        self.engine.model_height()
    }

    pub fn class_name(&self, class_id: usize) -> String {
        class_name(&self.names, class_id)
    }

    /// Parses the `names` metadata written by YOLO exporters.
    ///
    /// String format: `{0: 'person', 1: 'bicycle', 2: 'sports ball', ..., 27: "yellow_lady's_slipper"}`
    pub fn parse_names(raw: &str) -> Vec<String> {
        let re = Regex::new(r#"(['"])([-()\w '"]+)(['"])"#).expect("names pattern is valid");
        re.captures_iter(raw)
            .map(|x| x.extract())
            .map(|(_, [_, name, _])| name.to_string())
            .collect()
    }

    fn n2s(n: usize) -> Vec<String> {
        (0..n).map(|x| format!("# {}", x)).collect::<Vec<String>>()
    }
}
