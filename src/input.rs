//! Keyboard handling and frame saving.

use std::path::{Path, PathBuf};
use anyhow::Context;
use image::RgbImage;
use crate::data::SessionParams;

/// What the loop should do after a key poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Continue,
    Save,
    Quit,
}

/// Maps one polled key to a command and the updated session parameters.
///
/// Key codes are masked to their low byte. Only `q` is honoured outside interactive mode.
pub fn handle_input(key: Option<i32>, params: &SessionParams) -> (SessionParams, Command) {
    let Some(key) = key else {
        return (*params, Command::Continue);
    };
    let key = (key & 0xFF) as u8;

    match key {
        b'q' => (*params, Command::Quit),
        _ if !params.interactive => (*params, Command::Continue),
        b's' => (*params, Command::Save),
        b'+' | b'=' => (params.raise_threshold(), Command::Continue),
        b'-' | b'_' => (params.lower_threshold(), Command::Continue),
        _ => (*params, Command::Continue),
    }
}

/// Writes `detection_<n>.jpg` files with `n` counting up from 0 for the run.
#[derive(Debug)]
pub struct FrameSaver {
    dir: PathBuf,
    next: u32,
}

impl FrameSaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            next: 0,
        }
    }

    pub fn next_path(&self) -> PathBuf {
        self.dir.join(format!("detection_{}.jpg", self.next))
    }

    pub fn saved(&self) -> u32 {
        self.next
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save(&mut self, img: &RgbImage) -> anyhow::Result<PathBuf> {
        let path = self.next_path();
        img.save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        self.next += 1;
        log::info!("Saved {}", path.display());
        Ok(path)
    }
}
