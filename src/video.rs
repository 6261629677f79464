//! Frame sources: cameras, video files and still-image folders.

mod capture_thread;
mod image_folder;
#[cfg(feature = "opencv")]
mod opencv_capture;

use std::fmt;
use std::path::{Path, PathBuf};
use anyhow::Result;
use crate::common::Frame;

pub use capture_thread::CaptureThread;
pub use image_folder::ImageFolderSource;
#[cfg(feature = "opencv")]
pub use opencv_capture::OpenCvCapture;

/// A stream of frames that must be released exactly once when done.
pub trait FrameSource {
    /// Requests a capture resolution. Sources may ignore or only partly honour it.
    fn configure(&mut self, width: u32, height: u32) -> Result<()>;

    /// Next frame, `Ok(None)` at end of stream.
    fn read_frame(&mut self) -> Result<Option<Frame>>;

    fn release(&mut self);
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn configure(&mut self, width: u32, height: u32) -> Result<()> {
        (**self).configure(width, height)
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        (**self).read_frame()
    }

    fn release(&mut self) {
        (**self).release()
    }
}

/// Where frames come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceId {
    /// Camera device index.
    Camera(i32),
    /// Video file, stream URL, image file or directory of images.
    Path(PathBuf),
}

impl Default for SourceId {
    fn default() -> Self {
        SourceId::Camera(0)
    }
}

impl SourceId {
    /// `0` and `/dev/video0` are camera indices; anything else is a path or URL.
    pub fn parse(source: &str) -> Self {
        match parse_device_index(source) {
            Some(index) => SourceId::Camera(index),
            None => SourceId::Path(PathBuf::from(source)),
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::Camera(index) => write!(f, "camera #{index}"),
            SourceId::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

fn parse_device_index(source: &str) -> Option<i32> {
    if let Ok(index) = source.trim().parse::<i32>() {
        return (index >= 0).then_some(index);
    }
    let stripped = source.strip_prefix("/dev/video")?;
    if !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit()) {
        return stripped.parse::<i32>().ok();
    }
    None
}

pub(crate) fn is_image_file(path: &Path) -> bool {
    path.is_file() && image::ImageFormat::from_path(path).is_ok()
}

/// Opens the best available backend for `source`.
///
/// Image files and directories are always readable. Cameras and video files need the
/// `opencv` feature.
pub fn open_source(source: &SourceId) -> Result<Box<dyn FrameSource + Send>> {
    if let SourceId::Path(path) = source {
        if path.is_dir() || is_image_file(path) {
            return Ok(Box::new(ImageFolderSource::open(path)?));
        }
    }
    open_capture(source)
}

#[cfg(feature = "opencv")]
fn open_capture(source: &SourceId) -> Result<Box<dyn FrameSource + Send>> {
    Ok(Box::new(OpenCvCapture::open(source)?))
}

#[cfg(not(feature = "opencv"))]
fn open_capture(source: &SourceId) -> Result<Box<dyn FrameSource + Send>> {
    anyhow::bail!(
        "cannot open {source}: camera and video capture need the `opencv` feature \
         (only image files and folders are readable without it)"
    )
}
