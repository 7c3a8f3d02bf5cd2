//! Options for building an ONNX Runtime YOLO detector.

use std::path::{Path, PathBuf};
use crate::common::{InferenceDevice, ModelVersion};

#[derive(Debug, Clone)]
pub struct ConfigOrt {
    pub onnx_path: PathBuf,
    pub ort_lib_path: String,
    pub device: InferenceDevice,
    pub model_width: u32,
    pub model_height: u32,
    pub profile: bool,

    // trt related
    pub trt_engine_cache_enable: bool,
    pub trt_int8_enable: bool,
    pub trt_fp16_enable: bool,

    pub nc: Option<usize>,
    pub confs: Vec<f32>,
    pub iou: Option<f32>,
    pub names: Option<Vec<String>>,
    pub yolo_version: Option<ModelVersion>,
}

impl Default for ConfigOrt {
    fn default() -> Self {
        Self {
            onnx_path: PathBuf::new(),
            ort_lib_path: String::new(),
            device: InferenceDevice::CPU,
            profile: false,
            model_height: 640,
            model_width: 640,

            trt_engine_cache_enable: true,
            trt_int8_enable: false,
            trt_fp16_enable: false,

            nc: None,
            confs: vec![0.25f32],
            iou: None,
            names: None,
            yolo_version: None,
        }
    }
}

impl ConfigOrt {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_model(mut self, onnx_path: impl AsRef<Path>) -> Self {
        self.onnx_path = onnx_path.as_ref().to_path_buf();
        self
    }

    pub fn with_ort_lib_path(mut self, ort_lib_path: &str) -> Self {
        self.ort_lib_path = ort_lib_path.to_string();
        self
    }

    pub fn with_model_width(mut self, n: u32) -> Self {
        self.model_width = n;
        self
    }

    pub fn with_model_height(mut self, n: u32) -> Self {
        self.model_height = n;
        self
    }

    pub fn with_device(mut self, device_type: InferenceDevice) -> Self {
        self.device = device_type;
        self
    }

    pub fn with_trt_int8(mut self, x: bool) -> Self {
        self.trt_int8_enable = x;
        self
    }

    pub fn with_trt_fp16(mut self, x: bool) -> Self {
        self.trt_fp16_enable = x;
        self
    }

    pub fn with_trt_engine_cache(mut self, x: bool) -> Self {
        self.trt_engine_cache_enable = x;
        self
    }

    pub fn with_yolo_version(mut self, x: ModelVersion) -> Self {
        self.yolo_version = Some(x);
        self
    }

    pub fn with_profile(mut self, profile: bool) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_names(mut self, names: &[&str]) -> Self {
        self.names = Some(names.iter().map(|x| x.to_string()).collect::<Vec<String>>());
        self
    }

    pub fn with_nc(mut self, nc: usize) -> Self {
        self.nc = Some(nc);
        self
    }

    pub fn with_iou(mut self, x: f32) -> Self {
        self.iou = Some(x);
        self
    }

    /// One threshold for every class, or one per class id.
    pub fn with_confs(mut self, x: &[f32]) -> Self {
        self.confs = x.to_vec();
        self
    }
}
