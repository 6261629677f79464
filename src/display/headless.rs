use anyhow::Result;
use crate::common::Frame;
use crate::display::Display;

/// Discards frames. Never reports a key, so the loop runs until the source ends.
#[derive(Debug, Default)]
pub struct HeadlessDisplay {
    shown: u64,
}

impl HeadlessDisplay {
    pub fn frames_shown(&self) -> u64 {
        self.shown
    }
}

impl Display for HeadlessDisplay {
    fn show(&mut self, window: &str, frame: &Frame) -> Result<()> {
        self.shown += 1;
        log::debug!("[{window}] frame #{} ({}x{})", frame.index, frame.width(), frame.height());
        Ok(())
    }

    fn poll_key(&mut self, _timeout_ms: i32) -> Result<Option<i32>> {
        Ok(None)
    }

    fn destroy_all(&mut self) {}
}
