//! OpenCV-backed camera and video-file capture.

use anyhow::{Context, Result};
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture},
};
use crate::common::Frame;
use crate::video::{FrameSource, SourceId};

pub struct OpenCvCapture {
    cap: VideoCapture,
    mat: Mat,
    next_index: u64,
    released: bool,
}

impl OpenCvCapture {
    pub fn open(source: &SourceId) -> Result<Self> {
        let cap = match source {
            SourceId::Camera(index) => VideoCapture::new(*index, videoio::CAP_ANY)
                .with_context(|| format!("Failed to open camera #{index}"))?,
            SourceId::Path(path) => {
                let uri = path.to_string_lossy();
                VideoCapture::from_file(&uri, videoio::CAP_ANY)
                    .with_context(|| format!("Failed to open {uri}"))?
            }
        };
        if !cap.is_opened()? {
            anyhow::bail!("Video source {source} could not be opened");
        }
        log::info!("Opened {source}");

        Ok(Self {
            cap,
            mat: Mat::default(),
            next_index: 0,
            released: false,
        })
    }
}

impl FrameSource for OpenCvCapture {
    fn configure(&mut self, width: u32, height: u32) -> Result<()> {
        let w_ok = self.cap.set(videoio::CAP_PROP_FRAME_WIDTH, width as f64)?;
        let h_ok = self.cap.set(videoio::CAP_PROP_FRAME_HEIGHT, height as f64)?;
        if !(w_ok && h_ok) {
            anyhow::bail!("backend refused {width}x{height}");
        }
        let got_w = self.cap.get(videoio::CAP_PROP_FRAME_WIDTH)?;
        let got_h = self.cap.get(videoio::CAP_PROP_FRAME_HEIGHT)?;
        log::info!("Capture resolution: {got_w}x{got_h} (requested {width}x{height})");
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        if self.released || !self.cap.read(&mut self.mat)? {
            return Ok(None);
        }
        let size = self.mat.size()?;
        if size.width <= 0 || size.height <= 0 {
            return Ok(None);
        }
        if self.mat.channels() != 3 {
            anyhow::bail!("Expected a 3-channel BGR frame, got {} channels", self.mat.channels());
        }

        let frame = Frame::from_bgr_bytes(
            size.width as u32,
            size.height as u32,
            self.mat.data_bytes()?,
            self.next_index,
        )?;
        self.next_index += 1;
        Ok(Some(frame))
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(err) = self.cap.release() {
            log::warn!("Failed to release capture: {err}");
        }
    }
}
