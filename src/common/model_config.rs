use std::path::{Path, PathBuf};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use crate::common::{InferenceDevice, ModelVersion};
use crate::data::ConfigOrt;
use crate::utils;

/// Describes the detector used by [`crate::analyze_with_config`].
///
/// Every field except `weights_path` has a default, so a JSON file only
/// needs to name the model:
///
/// ```json
/// { "weights_path": "models/yolov8n.onnx", "device": "cuda", "conf_threshold": 0.4 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub weights_path: PathBuf,
    /// ONNX Runtime shared library. Empty means `ORT_DYLIB_PATH` or the
    /// system default.
    pub ort_lib_path: String,
    /// Optional one-name-per-line label file overriding the model metadata.
    pub labels_path: Option<PathBuf>,
    pub device: String,
    pub device_id: usize,
    /// TensorRT only.
    pub trt_int8: bool,
    pub trt_fp16: bool,
    pub trt_engine_cache: bool,
    pub model_version: ModelVersion,
    /// Class count for models without `names` metadata or labels file.
    pub num_classes: Option<usize>,
    pub conf_threshold: f32,
    pub iou_threshold: f32,
    pub width: u32,
    pub height: u32,
    /// TrueType font for annotation labels. Boxes are drawn without text
    /// when unset.
    pub font_path: Option<PathBuf>,
    pub profile: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            weights_path: PathBuf::new(),
            ort_lib_path: String::new(),
            labels_path: None,
            device: "cpu".to_string(),
            device_id: 0,
            trt_int8: false,
            trt_fp16: false,
            trt_engine_cache: true,
            model_version: ModelVersion::YoloV8,
            num_classes: None,
            conf_threshold: 0.25,
            iou_threshold: 0.7,
            width: 640,
            height: 640,
            font_path: None,
            profile: false,
        }
    }
}

impl ModelConfig {
    pub fn new(weights_path: impl AsRef<Path>) -> Self {
        Self {
            weights_path: weights_path.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read model config {}", path.display()))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse model config {}", path.display()))?;
        Ok(config)
    }

    pub fn inference_device(&self) -> anyhow::Result<InferenceDevice> {
        InferenceDevice::from_name(&self.device, self.device_id).ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown inference device '{}', expected one of {:?}",
                self.device,
                InferenceDevice::all_inference_devices()
            )
        })
    }

    /// Translates this description into ONNX Runtime options.
    pub fn to_config_ort(&self) -> anyhow::Result<ConfigOrt> {
        let mut options = ConfigOrt::new()
            .with_model(&self.weights_path)
            .with_ort_lib_path(&self.ort_lib_path)
            .with_device(self.inference_device()?)
            .with_trt_int8(self.trt_int8)
            .with_trt_fp16(self.trt_fp16)
            .with_trt_engine_cache(self.trt_engine_cache)
            .with_yolo_version(self.model_version)
            .with_model_width(self.width)
            .with_model_height(self.height)
            .with_confs(&[self.conf_threshold])
            .with_iou(self.iou_threshold)
            .with_profile(self.profile);

        if let Some(nc) = self.num_classes {
            options = options.with_nc(nc);
        }
        if let Some(labels_path) = &self.labels_path {
            let names = utils::file_to_vec(labels_path)
                .with_context(|| format!("Failed to read labels file {}", labels_path.display()))?;
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            options = options.with_names(&names);
        }

        Ok(options)
    }
}

impl std::fmt::Display for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Weights File Path: {}\n\
        Labels Path: {}\n\
        OnnxRuntime Lib Path: {}\n\
        Inference Device: {}:{}\n\
        Model Version: {}\n\
        Model Input Resolution: {}x{}\n\
        Detection Threshold: {}\n\
        NMS IoU Threshold: {}",
               self.weights_path.display(),
               self.labels_path.as_deref().map(|p| p.display().to_string()).unwrap_or_else(|| "<model metadata>".to_string()),
               self.ort_lib_path,
               self.device, self.device_id,
               self.model_version.name(),
               self.width, self.height,
               self.conf_threshold, self.iou_threshold)
    }
}
