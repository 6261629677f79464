//! ONNX Runtime session wrapper: execution provider selection, dtype alignment and timing.

use anyhow::Result;
use half::f16;
use ndarray::{Array, IxDyn};
use ort::{
    execution_providers::{ExecutionProvider,
                          CPUExecutionProvider,
                          CUDAExecutionProvider,
                          TensorRTExecutionProvider},
    session::builder::SessionBuilder,
    session::{Session, SessionInputValue},
    tensor::TensorElementType,
    value::{DynValue, Value, ValueType},
};
use crate::common::InferenceDevice;
use crate::data::{ConfigOrt, TimeCalc, CROSS_MARK};
use crate::detection_runners::input_wrapper::X;

/// ONNXRuntime Backend
#[derive(Debug)]
pub struct OrtEngine {
    session: Session,
    input_name: String,
    input_dtype: TensorElementType,
    output_names: Vec<String>,
    model_width: u32,
    model_height: u32,
    profile: bool,
    infer_time: TimeCalc,
}

impl OrtEngine {
    pub fn new(config: &ConfigOrt) -> Result<Self> {
        if let Some(lib) = &config.ort_lib_path {
            match ort::init_from(lib.to_string_lossy()).commit() {
                Ok(_) => {}
                Err(e) => anyhow::bail!("{CROSS_MARK} Failed to load ONNX Runtime from {}: {:?}", lib.display(), e),
            }
        }

        let mut builder = Session::builder()?;

        let mut device = config.device;
        match device {
            InferenceDevice::TensorRT(device_id) => {
                Self::build_trt(
                    &mut builder,
                    device_id,
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
            InferenceDevice::CPU => {
                Self::build_cpu(&mut builder)?;
            }
        }

        let session = builder
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .commit_from_file(&config.onnx_path)?;

        let (input_name, input_dtype) = match session.inputs.first() {
            Some(input) => match &input.input_type {
                ValueType::Tensor { ty, .. } => (input.name.clone(), *ty),
                other => anyhow::bail!("Model input `{}` is not a tensor: {:?}", input.name, other),
            },
            None => anyhow::bail!("Model {} declares no inputs", config.onnx_path.display()),
        };
        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        if output_names.is_empty() {
            anyhow::bail!("Model {} declares no outputs", config.onnx_path.display());
        }

        log::info!(
            "Backend: ONNXRuntime | Device: {} | Input: {} ({:?}) | Outputs: {:?}",
            device,
            input_name,
            input_dtype,
            output_names,
        );

        let mut engine = Self {
            session,
            input_name,
            input_dtype,
            output_names,
            model_width: config.model_width,
            model_height: config.model_height,
            profile: config.profile,
            infer_time: TimeCalc::default(),
        };
        engine.dry_run(config.num_dry_run)?;
        Ok(engine)
    }

    fn build_trt(
        builder: &mut SessionBuilder,
        device_id: usize,
        fp16_enable: bool,
        engine_cache_enable: bool,
    ) -> Result<()> {
        let trt = TensorRTExecutionProvider::default()
            .with_device_id(device_id as i32)
            .with_fp16(fp16_enable)
            .with_engine_cache(engine_cache_enable)
            .with_engine_cache_path("trt-cache");
        if trt.is_available()? {
            match trt.register(builder) {
                Ok(_) => { }
                Err(err) => { anyhow::bail!("{CROSS_MARK} TensorRT initialization failed: {:?}", err) }
            }
            log::info!("🐢 Initial model serialization with TensorRT may takes some time...");
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

    /// First runs on a fresh session pay for allocation and kernel selection.
    fn dry_run(&mut self, n: usize) -> Result<()> {
        if n == 0 {
            return Ok(());
        }
        let shape = [1, 3, self.model_height as usize, self.model_width as usize];
        for _ in 0..n {
            let x = X::from(Array::zeros(IxDyn(&shape)));
            self.engine_run(x)?;
        }
        self.infer_time.clear();
        log::info!("Warm-up finished ({n} run{})", if n > 1 { "s" } else { "" });
        Ok(())
    }

    fn tensor_preprocess(x: X, dtype: &TensorElementType) -> Result<DynValue> {
        let x = match dtype {
            TensorElementType::Float32 => Value::from_array(x.into_inner())?.into_dyn(),
            TensorElementType::Float16 => Value::from_array(x.mapv(f16::from_f32))?.into_dyn(),
            _ => anyhow::bail!("Unsupported model input type: {:?}", dtype),
        };
        Ok(x)
    }

    fn tensor_postprocess(x: &DynValue) -> Result<Array<f32, IxDyn>> {
        // exported models emit f32, or f16 when exported with `half=True`
        if let Ok(y) = x.try_extract_array::<f32>() {
            return Ok(y.view().into_owned());
        }
        match x.try_extract_array::<f16>() {
            Ok(y) => Ok(y.view().mapv(f16::to_f32)),
            Err(err) => Err(anyhow::anyhow!("Unsupported model output type: {:?}", err)),
        }
    }

    /// Runs the session on a single batch and returns the first output as `f32`.
    pub fn engine_run(&mut self, x: X) -> Result<X> {
        let t_pre = std::time::Instant::now();
        let xs_ = vec![(
            self.input_name.clone(),
            Into::<SessionInputValue<'_>>::into(Self::tensor_preprocess(x, &self.input_dtype)?),
        )];
        let t_pre = t_pre.elapsed();
        self.infer_time.add_or_push(0, t_pre);

        let t_run = std::time::Instant::now();
        let outputs = self.session.run(xs_)?;
        let t_run = t_run.elapsed();
        self.infer_time.add_or_push(1, t_run);

        let t_post = std::time::Instant::now();
        let y = Self::tensor_postprocess(&outputs[self.output_names[0].as_str()])?;
        let t_post = t_post.elapsed();
        self.infer_time.add_or_push(2, t_post);

        if self.profile {
            let len = 10usize;
            let n = 4usize;
            log::info!("[Profile] {:>len$.n$?} ({:>len$.n$?} avg) [alignment: {:>len$.n$?} ({:>len$.n$?} avg) | inference: {:>len$.n$?} ({:>len$.n$?} avg) | to_f32: {:>len$.n$?} ({:>len$.n$?} avg)]",
                t_pre + t_run + t_post,
                self.infer_time.avg(),
                t_pre,
                self.infer_time.avg_i(0),
                t_run,
                self.infer_time.avg_i(1),
                t_post,
                self.infer_time.avg_i(2),
            );
        }

        Ok(X::from(y))
    }

    pub fn try_fetch(&self, key: &str) -> Option<String> {
        match self.session.metadata() {
            Err(_) => None,
            Ok(metadata) => metadata.custom(key).unwrap_or_default(),
        }
    }

    pub fn model_width(&self) -> u32 { self.model_width }

    pub fn model_height(&self) -> u32 { self.model_height }
}
