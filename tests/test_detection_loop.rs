extern crate live_detect;

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use image::RgbImage;
use rand::seq::SliceRandom;
use rand::Rng;
use live_detect::common::{BBox, Detection, Frame, ModelConfig};
use live_detect::data::{LoopConfig, SessionParams, MAX_CONF_THRESHOLD, MIN_CONF_THRESHOLD};
use live_detect::detection_loop::DetectionLoop;
use live_detect::display::Display;
use live_detect::error::LoopError;
use live_detect::input::{handle_input, Command};
use live_detect::video::{FrameSource, SourceId};
use live_detect::{Detector, FrameOutcome, LoopState};

#[derive(Default)]
struct Counters {
    loads: AtomicUsize,
    opens: AtomicUsize,
    configures: AtomicUsize,
    released: AtomicUsize,
    shown: AtomicUsize,
    destroyed: AtomicUsize,
    thresholds: Mutex<Vec<f32>>,
}

/// Returns `counts[i % len]` boxes on the i-th call.
struct FakeDetector {
    counts: Vec<usize>,
    calls: usize,
    fail_on: Option<usize>,
    counters: Arc<Counters>,
}

impl Detector for FakeDetector {
    fn infer(&mut self, frame: &Frame, conf_threshold: f32) -> anyhow::Result<Vec<Detection>> {
        let call = self.calls;
        self.calls += 1;
        self.counters.thresholds.lock().unwrap().push(conf_threshold);
        if self.fail_on == Some(call) {
            anyhow::bail!("model exploded");
        }
        let n = self.counts.get(call % self.counts.len().max(1)).copied().unwrap_or(0);
        Ok((0..n)
            .map(|i| {
                let mut det = Detection::default()
                    .with_class_id(i)
                    .with_confidence(0.9)
                    .with_label("thing");
                det.bbox = BBox::new(1., 1., (frame.width() - 1) as f32, (frame.height() - 1) as f32);
                det
            })
            .collect())
    }
}

struct ScriptedSource {
    frames: u64,
    served: u64,
    fail_first_read: bool,
    refuse_configure: bool,
    counters: Arc<Counters>,
}

impl FrameSource for ScriptedSource {
    fn configure(&mut self, _width: u32, _height: u32) -> anyhow::Result<()> {
        self.counters.configures.fetch_add(1, Ordering::SeqCst);
        if self.refuse_configure {
            anyhow::bail!("resolution not supported");
        }
        Ok(())
    }

    fn read_frame(&mut self) -> anyhow::Result<Option<Frame>> {
        if self.fail_first_read {
            anyhow::bail!("device unplugged");
        }
        if self.served == self.frames {
            return Ok(None);
        }
        let frame = Frame::new(RgbImage::new(64, 48), self.served);
        self.served += 1;
        Ok(Some(frame))
    }

    fn release(&mut self) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

struct ScriptedDisplay {
    keys: VecDeque<Option<i32>>,
    counters: Arc<Counters>,
}

impl Display for ScriptedDisplay {
    fn show(&mut self, _window: &str, _frame: &Frame) -> anyhow::Result<()> {
        self.counters.shown.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn poll_key(&mut self, _timeout_ms: i32) -> anyhow::Result<Option<i32>> {
        Ok(self.keys.pop_front().flatten())
    }

    fn destroy_all(&mut self) {
        self.counters.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

struct Harness {
    _model_dir: tempfile::TempDir,
    model: ModelConfig,
    counters: Arc<Counters>,
    frames: u64,
    counts: Vec<usize>,
    fail_on: Option<usize>,
    fail_first_read: bool,
    refuse_configure: bool,
}

impl Harness {
    fn new(frames: u64) -> Self {
        let model_dir = tempfile::tempdir().unwrap();
        let weights = model_dir.path().join("model.onnx");
        std::fs::write(&weights, b"weights").unwrap();
        Self {
            model: ModelConfig::new(weights),
            _model_dir: model_dir,
            counters: Arc::new(Counters::default()),
            frames,
            counts: vec![1],
            fail_on: None,
            fail_first_read: false,
            refuse_configure: false,
        }
    }

    fn init(
        &self,
        config: LoopConfig,
        keys: &[Option<char>],
    ) -> Result<DetectionLoop<FakeDetector, ScriptedDisplay>, LoopError> {
        let counters = self.counters.clone();
        let display = ScriptedDisplay {
            keys: keys.iter().map(|k| k.map(|c| c as i32)).collect(),
            counters: counters.clone(),
        };
        DetectionLoop::initialize(
            &self.model,
            config,
            |_model| {
                counters.loads.fetch_add(1, Ordering::SeqCst);
                Ok(FakeDetector {
                    counts: self.counts.clone(),
                    calls: 0,
                    fail_on: self.fail_on,
                    counters: counters.clone(),
                })
            },
            |_source| {
                counters.opens.fetch_add(1, Ordering::SeqCst);
                Ok(ScriptedSource {
                    frames: self.frames,
                    served: 0,
                    fail_first_read: self.fail_first_read,
                    refuse_configure: self.refuse_configure,
                    counters: counters.clone(),
                })
            },
            display,
        )
    }

    fn count(&self, f: impl Fn(&Counters) -> &AtomicUsize) -> usize {
        f(&self.counters).load(Ordering::SeqCst)
    }
}

#[test]
fn valid_model_and_source_start_running() {
    let h = Harness::new(5);
    let detection = h.init(LoopConfig::default(), &[]).unwrap();

    assert_eq!(detection.state(), LoopState::Running);
    assert_eq!(h.count(|c| &c.loads), 1);
    assert_eq!(h.count(|c| &c.opens), 1);
    assert_eq!(h.count(|c| &c.configures), 1);
    assert_eq!(h.count(|c| &c.released), 0);
}

#[test]
fn missing_model_never_starts() {
    let mut h = Harness::new(5);
    h.model.weights_path = PathBuf::from("/definitely/not/here/yolo11n.onnx");

    match h.init(LoopConfig::default(), &[]) {
        Err(err @ LoopError::ModelLoad(_)) => assert_eq!(err.exit_code(), 2),
        Err(other) => panic!("expected a model load error, got {other}"),
        Ok(_) => panic!("loop started without a model"),
    }
    assert_eq!(h.count(|c| &c.loads), 0);
    assert_eq!(h.count(|c| &c.opens), 0);
}

#[test]
fn unopenable_source_is_reported() {
    let h = Harness::new(5);
    let result = DetectionLoop::initialize(
        &h.model,
        LoopConfig::default().with_source(SourceId::parse("/dev/video9")),
        |_| Ok(FakeDetector { counts: vec![0], calls: 0, fail_on: None, counters: h.counters.clone() }),
        |source: &SourceId| -> anyhow::Result<ScriptedSource> { anyhow::bail!("cannot open {source}") },
        ScriptedDisplay { keys: VecDeque::new(), counters: h.counters.clone() },
    );
    match result {
        Err(err @ LoopError::SourceOpen(_)) => assert_eq!(err.exit_code(), 3),
        _ => panic!("expected a source open error"),
    }
}

#[test]
fn refused_resolution_is_not_fatal() {
    let mut h = Harness::new(1);
    h.refuse_configure = true;
    let detection = h.init(LoopConfig::default(), &[]).unwrap();
    assert_eq!(detection.state(), LoopState::Running);
}

#[test]
fn empty_stream_terminates_cleanly() {
    let h = Harness::new(0);
    let mut detection = h.init(LoopConfig::default(), &[]).unwrap();

    assert!(matches!(detection.step().unwrap(), FrameOutcome::EndOfStream));
    assert_eq!(detection.state(), LoopState::Terminated);
    assert_eq!(h.count(|c| &c.released), 1);
    assert_eq!(h.count(|c| &c.destroyed), 1);

    let summary = detection.run().unwrap();
    assert_eq!(summary.frames, 0);
    drop(detection);
    assert_eq!(h.count(|c| &c.released), 1);
    assert_eq!(h.count(|c| &c.destroyed), 1);
}

#[test]
fn failed_first_read_is_end_of_stream() {
    let mut h = Harness::new(3);
    h.fail_first_read = true;
    let mut detection = h.init(LoopConfig::default(), &[]).unwrap();

    let summary = detection.run().unwrap();
    assert_eq!(summary.frames, 0);
    assert_eq!(detection.state(), LoopState::Terminated);
    assert_eq!(h.count(|c| &c.released), 1);
}

#[test]
fn quit_key_releases_everything_once() {
    let h = Harness::new(100);
    let keys = [None, Some('x'), Some('q')];
    let mut detection = h.init(LoopConfig::default(), &keys).unwrap();

    let summary = detection.run().unwrap();
    assert_eq!(summary.frames, 3);
    assert_eq!(detection.state(), LoopState::Terminated);
    assert_eq!(h.count(|c| &c.shown), 3);

    detection.shutdown();
    drop(detection);
    assert_eq!(h.count(|c| &c.released), 1);
    assert_eq!(h.count(|c| &c.destroyed), 1);
}

#[test]
fn stream_end_stops_the_run() {
    let h = Harness::new(4);
    let mut detection = h.init(LoopConfig::default(), &[]).unwrap();

    let summary = detection.run().unwrap();
    assert_eq!(summary.frames, 4);
    assert_eq!(summary.saved, 0);
    assert_eq!(h.count(|c| &c.shown), 4);
    assert_eq!(h.count(|c| &c.released), 1);
}

#[test]
fn overlay_reports_fps_and_detection_count() {
    let mut h = Harness::new(3);
    h.counts = vec![0, 2, 5];
    let mut detection = h.init(LoopConfig::default(), &[]).unwrap();

    let mut seen = vec![];
    while let FrameOutcome::Frame(annotated) = detection.step().unwrap() {
        assert_eq!(annotated.overlay.len(), 2);
        assert_eq!(annotated.overlay[1], format!("Detections: {}", annotated.detection_count()));
        seen.push((annotated.fps, annotated.detection_count()));
    }

    assert_eq!(seen.iter().map(|s| s.1).collect::<Vec<_>>(), vec![0, 2, 5]);
    assert_eq!(seen[0].0, 0.0);
}

#[test]
fn interactive_overlay_shows_threshold() {
    let h = Harness::new(1);
    let mut detection = h.init(LoopConfig::default().with_interactive(true), &[]).unwrap();

    let FrameOutcome::Frame(annotated) = detection.step().unwrap() else {
        panic!("expected a frame");
    };
    assert_eq!(annotated.overlay, vec!["FPS: 0.0", "Conf: 0.25", "Detections: 1"]);
}

#[test]
fn save_key_writes_numbered_frames() {
    let h = Harness::new(10);
    let out = tempfile::tempdir().unwrap();
    let config = LoopConfig::default()
        .with_interactive(true)
        .with_save_dir(out.path());
    let mut detection = h.init(config, &[Some('s'), None, Some('s'), Some('q')]).unwrap();

    let summary = detection.run().unwrap();
    assert_eq!(summary.saved, 2);
    assert!(out.path().join("detection_0.jpg").is_file());
    assert!(out.path().join("detection_1.jpg").is_file());
    assert!(!out.path().join("detection_2.jpg").exists());
}

#[test]
fn save_key_is_ignored_without_interactive_mode() {
    let h = Harness::new(3);
    let out = tempfile::tempdir().unwrap();
    let config = LoopConfig::default().with_save_dir(out.path());
    let mut detection = h.init(config, &[Some('s'), Some('+')]).unwrap();

    let summary = detection.run().unwrap();
    assert_eq!(summary.saved, 0);
    assert_eq!(summary.final_threshold, 0.25);
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn threshold_keys_reach_the_detector() {
    let h = Harness::new(4);
    let keys = [Some('+'), Some('='), Some('-')];
    let mut detection = h.init(LoopConfig::default().with_interactive(true), &keys).unwrap();

    let summary = detection.run().unwrap();
    assert_eq!(summary.final_threshold, 0.3);
    assert_eq!(*h.counters.thresholds.lock().unwrap(), vec![0.25, 0.3, 0.35, 0.3]);
}

#[test]
fn inference_failure_is_fatal_after_cleanup() {
    let mut h = Harness::new(10);
    h.fail_on = Some(1);
    let mut detection = h.init(LoopConfig::default(), &[]).unwrap();

    match detection.run() {
        Err(err @ LoopError::Inference(_)) => assert_eq!(err.exit_code(), 1),
        other => panic!("expected an inference error, got {other:?}"),
    }
    assert_eq!(detection.state(), LoopState::Terminated);
    assert_eq!(h.count(|c| &c.released), 1);
    assert_eq!(h.count(|c| &c.destroyed), 1);
}

#[test]
fn threaded_capture_keeps_frame_order() {
    let h = Harness::new(6);
    let mut detection = h.init(LoopConfig::default().with_threaded_capture(true), &[]).unwrap();

    let mut order = vec![];
    while let FrameOutcome::Frame(annotated) = detection.step().unwrap() {
        order.push(annotated.frame.index);
    }
    assert_eq!(order, (0..6).collect::<Vec<u64>>());
    assert_eq!(h.count(|c| &c.released), 1);
}

#[test]
fn random_keys_keep_threshold_in_range() {
    let keys = ['+', '=', '-', '_', 's', 'x', 'a'];
    let mut rng = rand::thread_rng();

    let mut params = SessionParams::new(0.25, true);
    for _ in 0..2000 {
        let key = if rng.gen_bool(0.1) { None } else { keys.choose(&mut rng).map(|c| *c as i32) };
        let (next, command) = handle_input(key, &params);
        assert_ne!(command, Command::Quit);
        assert!((MIN_CONF_THRESHOLD..=MAX_CONF_THRESHOLD).contains(&next.conf_threshold));
        params = next;
    }
}

#[test]
fn random_session_saves_what_it_was_told_to() {
    let mut rng = rand::thread_rng();
    let frames = 30;
    let keys: Vec<Option<char>> = (0..frames)
        .map(|_| match rng.gen_range(0..4) {
            0 => Some('s'),
            1 => Some('+'),
            2 => Some('-'),
            _ => None,
        })
        .collect();
    let expected_saves = keys.iter().filter(|k| **k == Some('s')).count() as u32;

    let h = Harness::new(frames);
    let out = tempfile::tempdir().unwrap();
    let config = LoopConfig::default()
        .with_interactive(true)
        .with_save_dir(out.path());
    let mut detection = h.init(config, &keys).unwrap();

    let summary = detection.run().unwrap();
    assert_eq!(summary.frames, frames);
    assert_eq!(summary.saved, expected_saves);
    for n in 0..expected_saves {
        assert!(out.path().join(format!("detection_{n}.jpg")).is_file());
    }
}
