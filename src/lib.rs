mod utils;
pub mod annotate;
pub mod common;
pub mod data;
pub mod detection_loop;
pub mod detection_runners;
pub mod detectors;
pub mod display;
pub mod error;
pub mod input;
pub mod video;

use crate::common::ModelConfig;
use crate::data::{ConfigOrt, LoopConfig};
use crate::detection_loop::DetectionLoop;
use crate::detection_runners::inference_process::InferenceProcess;
use crate::detection_runners::OrtYOLO;
use crate::display::Display;
use crate::error::LoopError;

pub use crate::detection_loop::{AnnotatedFrame, FrameOutcome, LoopState, RunSummary};
pub use crate::detectors::Detector;

/// Builds the ONNX Runtime YOLO runner for `model_details`, including the warm-up run.
pub fn init_detector(model_details: &ModelConfig) -> anyhow::Result<OrtYOLO> {
    let ort_options = ConfigOrt::from_model_config(model_details)?;

    log::info!("Initializing ORT session with ({}) execution provider", model_details.inference_device);
    OrtYOLO::new(ort_options)
}

/// [`DetectionLoop::initialize`] with the ONNX Runtime detector and the default source backends.
pub fn init_loop<V: Display>(
    model_details: &ModelConfig,
    config: LoopConfig,
    display: V,
) -> Result<DetectionLoop<OrtYOLO, V>, LoopError> {
    DetectionLoop::initialize(model_details, config, init_detector, video::open_source, display)
}
