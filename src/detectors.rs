//! Detection backends.
//!
//! Anything that can decode an image, find objects in it, render those
//! objects and name a class id can drive the overlap analysis.

use ab_glyph::FontVec;
use image::RgbImage;
use crate::annotate;
use crate::common::{Detection, InputImage, ModelConfig};
use crate::detection_runners::inference_process::InferenceProcess;
use crate::detection_runners::OrtYOLO;
use crate::error::DetectError;
use crate::Result;

pub trait Detector {
    /// Decodes PNG, JPEG or BMP bytes.
    fn decode_image(&self, bytes: &[u8]) -> Result<InputImage> {
        InputImage::decode(bytes)
    }

    /// Runs the model once over `image`. Boxes are in `image` pixel
    /// coordinates and keep the model's output order.
    fn run_inference(&mut self, image: &InputImage) -> Result<Vec<Detection>>;

    /// Draws `detections` over a copy of `image`.
    fn render_annotations(&self, image: &InputImage, detections: &[Detection]) -> Result<RgbImage> {
        Ok(annotate::draw_detections(image, detections, None))
    }

    /// Label for a raw class id.
    fn resolve_class_name(&self, class_id: usize) -> String;
}

/// YOLO model on ONNX Runtime.
pub struct OrtDetector {
    yolo: OrtYOLO,
    font: Option<FontVec>,
    profile: bool,
}

impl std::fmt::Debug for OrtDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtDetector")
            .field("yolo", &self.yolo)
            .field("font", &self.font.is_some())
            .finish()
    }
}

impl OrtDetector {
    /// Loads the model described by `config`.
    pub fn new(config: &ModelConfig) -> Result<Self> {
        log::info!("Loading detector\n{}", config);

        let options = config.to_config_ort().map_err(DetectError::model_load)?;
        let yolo = OrtYOLO::new(options).map_err(DetectError::model_load)?;

        let font = match &config.font_path {
            Some(path) => match annotate::load_font(path) {
                Ok(font) => Some(font),
                Err(err) => {
                    log::warn!("{err:#}, annotations will have no labels");
                    None
                }
            },
            None => None,
        };

        Ok(Self {
            yolo,
            font,
            profile: config.profile,
        })
    }
}

impl Detector for OrtDetector {
    fn run_inference(&mut self, image: &InputImage) -> Result<Vec<Detection>> {
        let ys = self
            .yolo
            .forward(std::slice::from_ref(image), self.profile)
            .map_err(DetectError::inference)?;
        if self.profile {
            self.yolo.print_time();
        }

        Ok(ys.into_iter().next().map(|y| y.into_detections()).unwrap_or_default())
    }

    fn render_annotations(&self, image: &InputImage, detections: &[Detection]) -> Result<RgbImage> {
        Ok(annotate::draw_detections(image, detections, self.font.as_ref()))
    }

    fn resolve_class_name(&self, class_id: usize) -> String {
        self.yolo.class_name(class_id)
    }
}
