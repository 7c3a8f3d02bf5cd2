//! ONNX Runtime backend.

use std::time::Instant;
use anyhow::Result;
use half::{bf16, f16};
use ndarray::{Array, IxDyn};
use ort::{
    execution_providers::{ExecutionProvider,
                          CPUExecutionProvider,
                          CUDAExecutionProvider,
                          TensorRTExecutionProvider,
                          CoreMLExecutionProvider},
    session::builder::{GraphOptimizationLevel, SessionBuilder},
    session::{Session, SessionInputValue},
    tensor::TensorElementType,
    value::{DynValue, Value},
};
use crate::common::InferenceDevice;
use crate::data::{ConfigOrt, FsAccess, TimeCalc, Xs, X, CROSS_MARK};

/// Names and element types of a session's inputs or outputs.
#[derive(Debug, Clone, Default)]
pub struct OrtTensorAttr {
    pub names: Vec<String>,
    pub dtypes: Vec<TensorElementType>,
}

#[derive(Debug)]
pub struct OrtEngine {
    session: Session,
    inputs_attrs: OrtTensorAttr,
    outputs_attrs: OrtTensorAttr,
    model_width: u32,
    model_height: u32,
    profile: bool,
    pub infer_time: TimeCalc,
}

impl OrtEngine {
    pub fn new(config: &ConfigOrt) -> Result<Self> {
        if !config.onnx_path.is_file() {
            anyhow::bail!("Model file {} does not exist or is not a file", config.onnx_path.display());
        }

        if !config.ort_lib_path.is_empty() {
            // A dylib that cannot be loaded surfaces from `Session::builder` below.
            let committed = ort::init_from(&config.ort_lib_path).commit();
            log::debug!("ORT environment from {}: {:?}", config.ort_lib_path, committed);
        }

        let mut builder = Session::builder()?;

        let mut device = config.device;
        match device {
            InferenceDevice::TensorRT(device_id) => {
                Self::build_trt(
                    &mut builder,
                    device_id,
                    config.trt_int8_enable,
                    config.trt_fp16_enable,
                    config.trt_engine_cache_enable,
                )?;
            }
            InferenceDevice::CUDA(device_id) => {
                Self::build_cuda(&mut builder, device_id).unwrap_or_else(|err| {
                    log::warn!("{err}, Using cpu");
                    device = InferenceDevice::CPU;
                })
            }
            InferenceDevice::CoreML(_) => Self::build_coreml(&mut builder).unwrap_or_else(|err| {
                log::warn!("{err}, Using cpu");
                device = InferenceDevice::CPU;
            }),
            InferenceDevice::CPU => {
                Self::build_cpu(&mut builder)?;
            }
        }

        let session = builder
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(&config.onnx_path)?;

        let inputs_attrs = OrtTensorAttr {
            names: session.inputs.iter().map(|x| x.name.to_string()).collect(),
            dtypes: session.inputs.iter()
                .map(|x| x.input_type.tensor_type().unwrap_or(TensorElementType::Float32))
                .collect(),
        };
        let outputs_attrs = OrtTensorAttr {
            names: session.outputs.iter().map(|x| x.name.to_string()).collect(),
            dtypes: session.outputs.iter()
                .map(|x| x.output_type.tensor_type().unwrap_or(TensorElementType::Float32))
                .collect(),
        };
        if inputs_attrs.names.is_empty() || outputs_attrs.names.is_empty() {
            anyhow::bail!("Model {} declares no inputs or outputs", config.onnx_path.display());
        }

        log::info!(
            "Backend: ONNXRuntime | Model: {} | Device: {} | Inputs: {:?} | Outputs: {:?}",
            config.onnx_path.display(),
            device,
            inputs_attrs.names,
            outputs_attrs.names,
        );

        Ok(Self {
            session,
            inputs_attrs,
            outputs_attrs,
            model_width: config.model_width,
            model_height: config.model_height,
            profile: config.profile,
            infer_time: TimeCalc::default(),
        })
    }

    fn build_trt(
        builder: &mut SessionBuilder,
        device_id: usize,
        int8_enable: bool,
        fp16_enable: bool,
        engine_cache_enable: bool,
    ) -> Result<()> {
        let cache_dir = FsAccess::cache_or_current(&["trt-cache"])?;
        let trt = TensorRTExecutionProvider::default()
            .with_device_id(device_id as i32)
            .with_int8(int8_enable)
            .with_fp16(fp16_enable)
            .with_engine_cache(engine_cache_enable)
            .with_engine_cache_path(cache_dir.display().to_string())
            .with_timing_cache(false);
        if trt.is_available()? {
            match trt.register(builder) {
                Ok(_) => { }
                Err(err) => { anyhow::bail!("{CROSS_MARK} TensorRT initialization failed: {:?}", err) }
            }
            log::info!("Initial model serialization with TensorRT may take some time...");
            Ok(())
        } else {
            anyhow::bail!("{CROSS_MARK} TensorRT execution provider not available")
        }
    }

    fn build_cuda(builder: &mut SessionBuilder, device_id: usize) -> Result<()> {
        let ep = CUDAExecutionProvider::default()
            .with_device_id(device_id as i32);
        if ep.is_available()? {
            match ep.register(builder) {
                Ok(_) => { }
                Err(err) => { anyhow::bail!("{CROSS_MARK} CUDA initialization failed: {:?}", err) }
            }
            Ok(())
        } else {
            anyhow::bail!("{CROSS_MARK} CUDA execution provider not available")
        }
    }

    fn build_coreml(builder: &mut SessionBuilder) -> Result<()> {
        let ep = CoreMLExecutionProvider::default()
            .with_subgraphs(false);
        if ep.is_available()? {
            match ep.register(builder) {
                Ok(_) => { }
                Err(err) => { anyhow::bail!("{CROSS_MARK} CoreML initialization failed: {:?}", err) }
            }
            Ok(())
        } else {
            anyhow::bail!("{CROSS_MARK} CoreML execution provider not available")
        }
    }

    fn build_cpu(builder: &mut SessionBuilder) -> Result<()> {
        let ep = CPUExecutionProvider::default();
        if ep.is_available()? {
            match ep.register(builder) {
                Ok(_) => { }
                Err(err) => { anyhow::bail!("{CROSS_MARK} CPU initialization failed: {:?}", err) }
            }
            Ok(())
        } else {
            anyhow::bail!("{CROSS_MARK} CPU execution provider not available")
        }
    }

    fn tensor_preprocess(x: &X, dtype: &TensorElementType) -> Result<DynValue> {
        let x = match dtype {
            TensorElementType::Float32 => Value::from_array(x.0.clone())?.into_dyn(),
            TensorElementType::Float64 => Value::from_array(x.mapv(|x_| x_ as f64))?.into_dyn(),
            TensorElementType::Float16 => Value::from_array(x.mapv(f16::from_f32))?.into_dyn(),
            TensorElementType::Bfloat16 => Value::from_array(x.mapv(bf16::from_f32))?.into_dyn(),
            TensorElementType::Uint8 => Value::from_array(x.mapv(|x_| (x_ * 255.) as u8))?.into_dyn(),
            _ => anyhow::bail!("Unsupported model input type: {:?}", dtype),
        };
        Ok(x)
    }

    fn tensor_postprocess(x: &DynValue, dtype: &TensorElementType) -> Result<Array<f32, IxDyn>> {
        fn _extract_and_convert<T>(x: &DynValue, map_fn: impl Fn(T) -> f32) -> Result<Array<f32, IxDyn>>
        where
            T: Clone + 'static + ort::tensor::PrimitiveTensorElementType,
        {
            let view = x.try_extract_array::<T>()?;
            Ok(view.mapv(map_fn))
        }
        let x = match dtype {
            TensorElementType::Float32 => _extract_and_convert::<f32>(x, |x| x)?,
            TensorElementType::Float16 => _extract_and_convert::<f16>(x, f16::to_f32)?,
            TensorElementType::Bfloat16 => _extract_and_convert::<bf16>(x, bf16::to_f32)?,
            TensorElementType::Float64 => _extract_and_convert::<f64>(x, |x| x as f32)?,
            TensorElementType::Int64 => _extract_and_convert::<i64>(x, |x| x as f32)?,
            TensorElementType::Int32 => _extract_and_convert::<i32>(x, |x| x as f32)?,
            _ => anyhow::bail!("Unsupported ort tensor type: {:?}", dtype),
        };

        Ok(x)
    }

    /// Runs the session. Inputs are matched to the model's inputs by position.
    pub fn run(&mut self, xs: Xs) -> Result<Xs> {
        if xs.len() != self.inputs_attrs.names.len() {
            anyhow::bail!(
                "Model expects {} inputs, got {}",
                self.inputs_attrs.names.len(),
                xs.len()
            );
        }

        let t_pre = Instant::now();
        let mut xs_ = Vec::new();
        for (dtype, x) in self.inputs_attrs.dtypes.iter().zip(xs.iter()) {
            xs_.push(Into::<SessionInputValue<'_>>::into(Self::tensor_preprocess(
                x, dtype,
            )?));
        }
        let t_pre = t_pre.elapsed();
        self.infer_time.add_or_push(0, t_pre);

        let t_run = Instant::now();
        let outputs = self.session.run(&xs_[..])?;
        let t_run = t_run.elapsed();
        self.infer_time.add_or_push(1, t_run);

        let t_post = Instant::now();
        let mut ys = Xs::new();
        for (dtype, name) in self.outputs_attrs.dtypes.iter().zip(self.outputs_attrs.names.iter()) {
            let y = Self::tensor_postprocess(&outputs[name.as_str()], dtype)?;
            ys.push_kv(name.as_str(), X::from(y))?;
        }
        let t_post = t_post.elapsed();
        self.infer_time.add_or_push(2, t_post);

        if self.profile {
            log::info!("[Profile] {:?} ({:?} avg) [alignment: {:?} | inference: {:?} | to_f32: {:?}]",
                t_pre + t_run + t_post,
                self.infer_time.avg(),
                t_pre,
                t_run,
                t_post,
            );
        }

        Ok(ys)
    }

    pub fn model_width(&self) -> u32 { self.model_width }

    pub fn model_height(&self) -> u32 { self.model_height }

    /// Custom metadata entry of the model, e.g. `names`.
    pub fn try_fetch(&self, key: &str) -> Option<String> {
        match self.session.metadata() {
            Err(_) => None,
            Ok(metadata) => metadata.custom(key).unwrap_or_default(),
        }
    }
}
