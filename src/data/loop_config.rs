use std::path::PathBuf;
use crate::video::SourceId;

pub const DEFAULT_WINDOW_NAME: &str = "YOLO Real-time Detection";
pub const DEFAULT_TARGET_WIDTH: u32 = 1280;
pub const DEFAULT_TARGET_HEIGHT: u32 = 720;

/// Settings for one run of the detection loop.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_name: String,
    pub source: SourceId,
    pub target_width: u32,
    pub target_height: u32,
    /// Keyboard controls and the on-screen threshold line.
    pub interactive: bool,
    /// Key poll timeout per frame, in milliseconds.
    pub poll_timeout_ms: i32,
    /// Number of frame deltas averaged into the FPS overlay. 1 = instantaneous.
    pub fps_window: usize,
    /// Read frames on a dedicated capture thread.
    pub threaded_capture: bool,
    /// Where saved frames land.
    pub save_dir: PathBuf,
    pub font_path: Option<PathBuf>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_name: DEFAULT_WINDOW_NAME.to_string(),
            source: SourceId::Camera(0),
            target_width: DEFAULT_TARGET_WIDTH,
            target_height: DEFAULT_TARGET_HEIGHT,
            interactive: false,
            poll_timeout_ms: 1,
            fps_window: 1,
            threaded_capture: false,
            save_dir: PathBuf::from("."),
            font_path: None,
        }
    }
}

impl LoopConfig {
    pub fn with_source(mut self, source: SourceId) -> Self {
        self.source = source;
        self
    }

    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn with_threaded_capture(mut self, threaded: bool) -> Self {
        self.threaded_capture = threaded;
        self
    }

    pub fn with_save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_dir = dir.into();
        self
    }
}
