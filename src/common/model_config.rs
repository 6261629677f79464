use std::path::PathBuf;
use crate::common::inference_device::InferenceDevice;
use crate::common::model_version::ModelVersion;

/// Everything needed to load a detector.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub weights_path: PathBuf,
    pub ort_lib_path: Option<PathBuf>,
    pub labels_path: Option<PathBuf>,
    pub inference_device: InferenceDevice,
    pub model_version: ModelVersion,
    pub conf_threshold: f32,
    pub iou_threshold: f32,
    pub agnostic_nms: bool,
    pub trt_fp16: bool,
    pub width: u32,
    pub height: u32,
    pub profile: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            weights_path: PathBuf::new(),
            ort_lib_path: None,
            labels_path: None,
            inference_device: InferenceDevice::CPU,
            model_version: ModelVersion::default(),
            conf_threshold: 0.25,
            iou_threshold: 0.7,
            agnostic_nms: false,
            trt_fp16: false,
            width: 640,
            height: 640,
            profile: false,
        }
    }
}

impl ModelConfig {
    pub fn new(weights_path: impl Into<PathBuf>) -> Self {
        Self {
            weights_path: weights_path.into(),
            ..Default::default()
        }
    }
}

impl std::fmt::Display for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Weights File Path: {}\n\
        Labels Path: {}\n\
        Inference Device: {}\n\
        Model Version: {}\n\
        Model Input Resolution: {}x{}\n\
        Detection Threshold: {}\n\
        IoU Threshold: {}",
               self.weights_path.display(),
               self.labels_path.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "<model metadata>".to_string()),
               self.inference_device, self.model_version.name(),
               self.width, self.height, self.conf_threshold, self.iou_threshold)
    }
}
