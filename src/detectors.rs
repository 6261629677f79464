use crate::common::{Detection, Frame};

/// Anything that turns a frame into detections at a given confidence threshold.
///
/// Implemented by the ONNX Runtime YOLO runner; tests plug in in-memory doubles.
pub trait Detector {
    fn infer(&mut self, frame: &Frame, conf_threshold: f32) -> anyhow::Result<Vec<Detection>>;
}

impl<D: Detector + ?Sized> Detector for Box<D> {
    fn infer(&mut self, frame: &Frame, conf_threshold: f32) -> anyhow::Result<Vec<Detection>> {
        (**self).infer(frame, conf_threshold)
    }
}
