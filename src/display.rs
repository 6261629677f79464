//! Viewports that show annotated frames and report key presses.

mod headless;
#[cfg(feature = "opencv")]
mod highgui;

use anyhow::Result;
use crate::common::Frame;

pub use headless::HeadlessDisplay;
#[cfg(feature = "opencv")]
pub use highgui::HighGuiDisplay;

pub trait Display {
    /// Shows `frame` in the named window, creating the window on first use.
    fn show(&mut self, window: &str, frame: &Frame) -> Result<()>;

    /// Waits up to `timeout_ms` for a key press. `None` when nothing was pressed.
    fn poll_key(&mut self, timeout_ms: i32) -> Result<Option<i32>>;

    /// Closes every window this display opened. Safe to call more than once.
    fn destroy_all(&mut self);
}

impl<V: Display + ?Sized> Display for Box<V> {
    fn show(&mut self, window: &str, frame: &Frame) -> Result<()> {
        (**self).show(window, frame)
    }

    fn poll_key(&mut self, timeout_ms: i32) -> Result<Option<i32>> {
        (**self).poll_key(timeout_ms)
    }

    fn destroy_all(&mut self) {
        (**self).destroy_all()
    }
}

/// HighGUI window when built with `opencv` and not asked to run headless.
pub fn open_display(headless: bool) -> Box<dyn Display> {
    if headless {
        return Box::new(HeadlessDisplay::default());
    }
    windowed_display()
}

#[cfg(feature = "opencv")]
fn windowed_display() -> Box<dyn Display> {
    Box::new(HighGuiDisplay::new())
}

#[cfg(not(feature = "opencv"))]
fn windowed_display() -> Box<dyn Display> {
    log::warn!("Built without the `opencv` feature, running headless");
    Box::new(HeadlessDisplay::default())
}
