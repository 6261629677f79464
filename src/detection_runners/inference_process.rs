use std::time::Instant;
use crate::common::{Detection, Frame};
use crate::data::{ConfigOrt, X};
use crate::utils;

pub trait InferenceProcess: Sized {
    /// Creates a new instance of the model with the given options.
    fn new(options: ConfigOrt) -> anyhow::Result<Self>;

    /// Pre-process the input frame.
    fn preprocess(&self, frame: &Frame) -> anyhow::Result<X>;

    /// Executes the model on the preprocessed data.
    fn inference(&mut self, x: X) -> anyhow::Result<X>;

    /// Post-process the model's output back into frame coordinates.
    fn postprocess(&self, x: X, frame: &Frame, conf_threshold: f32) -> anyhow::Result<Vec<Detection>>;

    /// Executes the full pipeline.
    fn run(&mut self, frame: &Frame, conf_threshold: f32) -> anyhow::Result<Vec<Detection>> {
        let x = self.preprocess(frame)?;
        let y = self.inference(x)?;
        self.postprocess(y, frame, conf_threshold)
    }

    /// Executes the full pipeline, tracing each stage.
    fn forward(&mut self, frame: &Frame, conf_threshold: f32, profile: bool) -> anyhow::Result<Vec<Detection>> {
        let detect_time = Instant::now();

        let t_pre = Instant::now();
        let x = self.preprocess(frame)?;
        let t_pre = t_pre.elapsed();

        let mut _detect_elapsed = detect_time.elapsed();
        _detect_elapsed = utils::trace("TIME", "Preprocessing input", detect_time, _detect_elapsed);

        let t_exe = Instant::now();
        let y = self.inference(x)?;
        let t_exe = t_exe.elapsed();

        _detect_elapsed = utils::trace("TIME", "Detection run", detect_time, _detect_elapsed);

        let t_post = Instant::now();
        let ys = self.postprocess(y, frame, conf_threshold)?;
        let t_post = t_post.elapsed();

        utils::trace("TIME", "Postprocessing", detect_time, _detect_elapsed);

        if profile {
            log::info!("> Preprocess: {t_pre:?} | Inference: {t_exe:?} | Postprocess: {t_post:?}");
        }

        Ok(ys)
    }
}
