//! The acquisition → inference → overlay → display → input loop.

use crate::annotate::{overlay_lines, Annotator};
use crate::common::{Detection, Frame, ModelConfig};
use crate::data::{FpsCounter, LoopConfig, SessionParams};
use crate::detectors::Detector;
use crate::display::Display;
use crate::error::LoopError;
use crate::input::{handle_input, Command, FrameSaver};
use crate::video::{CaptureThread, FrameSource, SourceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Terminated,
}

/// A frame with boxes and overlay burned in, plus what was drawn.
#[derive(Debug, Clone)]
pub struct AnnotatedFrame {
    pub frame: Frame,
    pub detections: Vec<Detection>,
    pub fps: f32,
    pub conf_threshold: f32,
    pub overlay: Vec<String>,
}

impl AnnotatedFrame {
    pub fn detection_count(&self) -> usize {
        self.detections.len()
    }
}

#[derive(Debug)]
pub enum FrameOutcome {
    Frame(AnnotatedFrame),
    EndOfStream,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub saved: u32,
    pub final_threshold: f32,
}

/// Owns the detector, the source and the display for one run.
///
/// The source and display are released exactly once: on quit, end of stream, error, or drop.
pub struct DetectionLoop<D: Detector, V: Display> {
    detector: D,
    source: Box<dyn FrameSource + Send>,
    display: V,
    config: LoopConfig,
    params: SessionParams,
    fps: FpsCounter,
    annotator: Annotator,
    saver: FrameSaver,
    state: LoopState,
    released: bool,
    frames_read: u64,
}

impl<D: Detector, V: Display> DetectionLoop<D, V> {
    /// Loads the model, then opens and configures the source.
    ///
    /// A missing weights file fails with [`LoopError::ModelLoad`] without calling `load`.
    pub fn initialize<L, O, S>(
        model: &ModelConfig,
        config: LoopConfig,
        load: L,
        open: O,
        display: V,
    ) -> Result<Self, LoopError>
    where
        L: FnOnce(&ModelConfig) -> anyhow::Result<D>,
        O: FnOnce(&SourceId) -> anyhow::Result<S>,
        S: FrameSource + Send + 'static,
    {
        if !model.weights_path.exists() {
            return Err(LoopError::ModelLoad(anyhow::anyhow!(
                "model file {} does not exist",
                model.weights_path.display()
            )));
        }
        let detector = load(model).map_err(LoopError::ModelLoad)?;
        log::info!("Loaded model {}", model.weights_path.display());

        let mut source = open(&config.source).map_err(LoopError::SourceOpen)?;
        if let Err(err) = source.configure(config.target_width, config.target_height) {
            log::warn!(
                "Source refused {}x{}: {err:#}",
                config.target_width,
                config.target_height
            );
        }

        let source: Box<dyn FrameSource + Send> = if config.threaded_capture {
            Box::new(CaptureThread::spawn(source).map_err(LoopError::SourceOpen)?)
        } else {
            Box::new(source)
        };

        let annotator = Annotator::new(config.font_path.as_deref());
        let params = SessionParams::new(model.conf_threshold, config.interactive);
        log::info!(
            "Detection started on {} | conf {:.2} | {}",
            config.source,
            params.conf_threshold,
            if config.interactive { "interactive (q quit, s save, +/- threshold)" } else { "q to quit" },
        );

        Ok(Self {
            detector,
            source,
            display,
            fps: FpsCounter::new(config.fps_window),
            saver: FrameSaver::new(&config.save_dir),
            config,
            params,
            annotator,
            state: LoopState::Running,
            released: false,
            frames_read: 0,
        })
    }

    /// Reads, detects and annotates one frame.
    ///
    /// A read failure or end of stream shuts the loop down and returns `EndOfStream`.
    pub fn step(&mut self) -> Result<FrameOutcome, LoopError> {
        if self.state == LoopState::Terminated {
            return Ok(FrameOutcome::EndOfStream);
        }

        let frame = match self.source.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                self.end_of_stream(None);
                return Ok(FrameOutcome::EndOfStream);
            }
            Err(err) => {
                self.end_of_stream(Some(err));
                return Ok(FrameOutcome::EndOfStream);
            }
        };
        self.frames_read += 1;

        let conf_threshold = self.params.conf_threshold;
        let detections = match self.detector.infer(&frame, conf_threshold) {
            Ok(detections) => detections,
            Err(err) => return Err(self.fail(LoopError::Inference(err))),
        };
        let fps = self.fps.tick();

        let overlay = overlay_lines(
            fps,
            self.params.interactive.then_some(conf_threshold),
            detections.len(),
        );
        let mut frame = frame;
        self.annotator.draw_detections(&mut frame, &detections);
        self.annotator.draw_overlay(&mut frame, &overlay);

        Ok(FrameOutcome::Frame(AnnotatedFrame {
            frame,
            detections,
            fps,
            conf_threshold,
            overlay,
        }))
    }

    pub fn render(&mut self, annotated: &AnnotatedFrame) -> Result<(), LoopError> {
        match self.display.show(&self.config.window_name, &annotated.frame) {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail(LoopError::Display(err))),
        }
    }

    /// Polls one key and applies it. A quit shuts the loop down.
    pub fn apply_input(&mut self, annotated: &AnnotatedFrame) -> Result<Command, LoopError> {
        let key = match self.display.poll_key(self.config.poll_timeout_ms) {
            Ok(key) => key,
            Err(err) => return Err(self.fail(LoopError::Display(err))),
        };

        let (params, command) = handle_input(key, &self.params);
        if params.conf_threshold != self.params.conf_threshold {
            log::info!("Confidence threshold: {:.2}", params.conf_threshold);
        }
        self.params = params;

        match command {
            Command::Save => {
                if let Err(err) = self.saver.save(&annotated.frame) {
                    return Err(self.fail(LoopError::Save(err)));
                }
            }
            Command::Quit => {
                log::info!("Quit requested");
                self.shutdown();
            }
            Command::Continue => {}
        }
        Ok(command)
    }

    /// Runs until quit, end of stream or a fatal error. Always shuts down before returning.
    pub fn run(&mut self) -> Result<RunSummary, LoopError> {
        let result = self.run_until_stopped();
        self.shutdown();

        let summary = self.summary();
        log::info!(
            "Detection stopped after {} frame(s), {} saved",
            summary.frames,
            summary.saved
        );
        result.map(|_| summary)
    }

    fn run_until_stopped(&mut self) -> Result<(), LoopError> {
        loop {
            let annotated = match self.step()? {
                FrameOutcome::Frame(annotated) => annotated,
                FrameOutcome::EndOfStream => return Ok(()),
            };
            self.render(&annotated)?;
            if self.apply_input(&annotated)? == Command::Quit {
                return Ok(());
            }
        }
    }

    /// Releases the source and closes the display. Later calls do nothing.
    pub fn shutdown(&mut self) {
        self.state = LoopState::Terminated;
        if self.released {
            return;
        }
        self.released = true;
        self.source.release();
        self.display.destroy_all();
        log::debug!("Source released and display closed");
    }

    fn fail(&mut self, err: LoopError) -> LoopError {
        self.shutdown();
        err
    }

    fn end_of_stream(&mut self, err: Option<anyhow::Error>) {
        match (self.frames_read, err) {
            (0, Some(err)) => log::warn!("Source failed on the first read: {err:#}"),
            (0, None) => log::warn!("Source produced no frames, check the camera or file"),
            (n, Some(err)) => log::info!("Frame read failed after {n} frame(s), stopping: {err:#}"),
            (n, None) => log::info!("End of stream after {n} frame(s)"),
        }
        self.shutdown();
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            frames: self.frames_read,
            saved: self.saver.saved(),
            final_threshold: self.params.conf_threshold,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    pub fn display(&self) -> &V {
        &self.display
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }
}

impl<D: Detector, V: Display> Drop for DetectionLoop<D, V> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
