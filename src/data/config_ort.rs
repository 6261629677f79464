//! Options for building the ONNX Runtime YOLO runner.

use std::path::{Path, PathBuf};
use anyhow::Result;
use crate::common::{InferenceDevice, ModelConfig, ModelVersion};

#[derive(Debug, Clone)]
pub struct ConfigOrt {
    pub onnx_path: PathBuf,
    pub ort_lib_path: Option<PathBuf>,
    pub device: InferenceDevice,
    pub model_width: u32,
    pub model_height: u32,
    pub profile: bool,
    pub num_dry_run: usize,

    // trt related
    pub trt_engine_cache_enable: bool,
    pub trt_fp16_enable: bool,

    pub iou: f32,
    pub agnostic_nms: bool,
    pub names: Option<Vec<String>>,
    pub yolo_version: ModelVersion,
}

impl Default for ConfigOrt {
    fn default() -> Self {
        Self {
            onnx_path: PathBuf::new(),
            ort_lib_path: None,
            device: InferenceDevice::CPU,
            model_width: 640,
            model_height: 640,
            profile: false,
            num_dry_run: 1,

            trt_engine_cache_enable: true,
            trt_fp16_enable: false,

            iou: 0.7,
            agnostic_nms: false,
            names: None,
            yolo_version: ModelVersion::default(),
        }
    }
}

impl ConfigOrt {
    pub fn new() -> Self {
        Default::default()
    }

    /// Builds runner options from a [`ModelConfig`], reading the labels file when one is set.
    pub fn from_model_config(model: &ModelConfig) -> Result<Self> {
        let mut options = Self::new()
            .with_model(&model.weights_path)
            .with_device(model.inference_device)
            .with_yolo_version(model.model_version)
            .with_model_width(model.width)
            .with_model_height(model.height)
            .with_trt_fp16(model.trt_fp16)
            .with_iou(model.iou_threshold)
            .with_agnostic_nms(model.agnostic_nms)
            .with_profile(model.profile);

        if let Some(lib) = &model.ort_lib_path {
            options = options.with_ort_lib_path(lib);
        }
        if let Some(labels) = &model.labels_path {
            let names = crate::utils::read_labels(labels)?;
            options.names = Some(names);
        }
        Ok(options)
    }

    pub fn with_model(mut self, onnx_path: &Path) -> Self {
        self.onnx_path = onnx_path.to_path_buf();
        self
    }

    pub fn with_ort_lib_path(mut self, ort_lib_path: &Path) -> Self {
        self.ort_lib_path = Some(ort_lib_path.to_path_buf());
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

    pub fn with_trt_fp16(mut self, x: bool) -> Self {
        self.trt_fp16_enable = x;
        self
    }

    pub fn with_yolo_version(mut self, x: ModelVersion) -> Self {
        self.yolo_version = x;
        self
    }

    pub fn with_profile(mut self, profile: bool) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_iou(mut self, x: f32) -> Self {
        self.iou = x;
        self
    }

    pub fn with_agnostic_nms(mut self, x: bool) -> Self {
        self.agnostic_nms = x;
        self
    }
}
