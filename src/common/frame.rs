use anyhow::{bail, Result};
use image::{DynamicImage, RgbImage};

/// A captured RGB frame plus its position in the stream.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub image: RgbImage,
    pub index: u64,
}

impl std::ops::Deref for Frame {
    type Target = RgbImage;

    fn deref(&self) -> &Self::Target {
        &self.image
    }
}

impl std::ops::DerefMut for Frame {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.image
    }
}

impl From<RgbImage> for Frame {
    fn from(image: RgbImage) -> Self {
        Self {
            image,
            index: 0,
        }
    }
}

impl From<DynamicImage> for Frame {
    fn from(image: DynamicImage) -> Self {
        Self {
            image: image.to_rgb8(),
            index: 0,
        }
    }
}

impl From<Frame> for RgbImage {
    fn from(frame: Frame) -> Self {
        frame.image
    }
}

impl Frame {
    pub fn new(image: RgbImage, index: u64) -> Self {
        Self { image, index }
    }

    pub fn with_index(mut self, index: u64) -> Self {
        self.index = index;
        self
    }

    /// Builds a frame from packed BGR bytes, the layout capture devices hand out.
    pub fn from_bgr_bytes(width: u32, height: u32, bgr: &[u8], index: u64) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if bgr.len() != expected {
            bail!("Unexpected BGR buffer size: got {}, expected {}", bgr.len(), expected);
        }

        let mut rgb = Vec::with_capacity(expected);
        for px in bgr.chunks_exact(3) {
            rgb.extend_from_slice(&[px[2], px[1], px[0]]);
        }

        match RgbImage::from_raw(width, height, rgb) {
            Some(image) => Ok(Self { image, index }),
            None => bail!("Failed to build a {}x{} frame", width, height),
        }
    }

    /// Packed BGR copy of the pixels, for display backends.
    pub fn to_bgr_bytes(&self) -> Vec<u8> {
        let mut bgr = Vec::with_capacity(self.image.as_raw().len());
        for px in self.image.as_raw().chunks_exact(3) {
            bgr.extend_from_slice(&[px[2], px[1], px[0]]);
        }
        bgr
    }
}
