use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use crate::common::Frame;
use crate::video::{is_image_file, FrameSource};

/// Plays a single image, or every image in a directory sorted by file name, as a finite stream.
#[derive(Debug)]
pub struct ImageFolderSource {
    pending: VecDeque<PathBuf>,
    next_index: u64,
    released: bool,
}

impl ImageFolderSource {
    pub fn open(path: &Path) -> Result<Self> {
        let pending: VecDeque<PathBuf> = if path.is_dir() {
            let mut files: Vec<PathBuf> = fs::read_dir(path)
                .with_context(|| format!("Failed to read directory {}", path.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| is_image_file(p))
                .collect();
            files.sort();
            files.into()
        } else if is_image_file(path) {
            VecDeque::from([path.to_path_buf()])
        } else {
            anyhow::bail!("{} is neither an image nor a directory", path.display());
        };

        log::info!("Image source {}: {} frame(s)", path.display(), pending.len());
        Ok(Self {
            pending,
            next_index: 0,
            released: false,
        })
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl FrameSource for ImageFolderSource {
    fn configure(&mut self, width: u32, height: u32) -> Result<()> {
        log::debug!("Image source keeps native frame sizes (requested {width}x{height})");
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        if self.released {
            return Ok(None);
        }
        let Some(path) = self.pending.pop_front() else {
            return Ok(None);
        };
        let image = image::open(&path)
            .with_context(|| format!("Failed to decode {}", path.display()))?;
        let frame = Frame::from(image).with_index(self.next_index);
        self.next_index += 1;
        Ok(Some(frame))
    }

    fn release(&mut self) {
        self.pending.clear();
        self.released = true;
    }
}
