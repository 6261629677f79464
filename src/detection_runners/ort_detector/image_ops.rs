//! Functions to preprocess frames for the model.

use anyhow::{bail, Result};
use fast_image_resize::{
    images::{CroppedImageMut, Image as FirImage, ImageRef},
    pixels::PixelType,
    FilterType, ResizeAlg, ResizeOptions, Resizer,
};
use image::RgbImage;
use ndarray::Array;
use crate::detection_runners::input_wrapper::X;

/// Padding value used around the letterboxed frame.
pub const LETTERBOX_FILL: u8 = 114;

/// Scale that fits a `w0 x h0` frame inside `target_w x target_h` without distortion.
pub fn letterbox_ratio(w0: u32, h0: u32, target_w: u32, target_h: u32) -> f32 {
    (target_w as f32 / w0 as f32).min(target_h as f32 / h0 as f32)
}

/// Letterboxes `image` to the model size and returns a `1x3xHxW` tensor scaled to `[0, 1]`.
pub fn preprocess(image: &RgbImage, target_h: u32, target_w: u32) -> Result<X> {
    if image.width() == 0 || image.height() == 0 {
        bail!("Cannot preprocess an empty {}x{} frame", image.width(), image.height());
    }

    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));
    let mut resizer = Resizer::new();
    let letterboxed = letterbox_image(image, target_h, target_w, LETTERBOX_FILL, &mut resizer, &options)?;
    let flat = nchw_normalize_flat(&letterboxed)?;

    let batch = Array::from_shape_vec(
        (1, 3, target_h as usize, target_w as usize),
        flat,
    )?.into_dyn();

    Ok(X::from(batch))
}

/// Aspect-preserving resize into a padded canvas, anchored at the top-left corner.
fn letterbox_image<'a>(
    img: &RgbImage,
    target_h: u32,
    target_w: u32,
    bg: u8,
    resizer: &mut Resizer,
    resize_options: &ResizeOptions,
) -> Result<FirImage<'a>> {
    let (w0, h0) = img.dimensions();
    let scale = letterbox_ratio(w0, h0, target_w, target_h);
    let new_w = ((w0 as f32 * scale).round() as u32).clamp(1, target_w);
    let new_h = ((h0 as f32 * scale).round() as u32).clamp(1, target_h);

    let mut padded = FirImage::from_vec_u8(
        target_w,
        target_h,
        vec![bg; (target_w * target_h * 3) as usize],
        PixelType::U8x3,
    )?;

    let src = ImageRef::new(w0, h0, img.as_raw(), PixelType::U8x3)?;
    let mut cropped = CroppedImageMut::new(&mut padded, 0, 0, new_w, new_h)?;
    resizer.resize(&src, &mut cropped, resize_options)?;

    Ok(padded)
}

fn nchw_normalize_flat(img: &FirImage) -> Result<Vec<f32>> {
    let buf = img.buffer();
    let w = img.width() as usize;
    let h = img.height() as usize;

    if buf.len() != w * h * 3 {
        bail!("Unexpected buffer size: got {}, expected {}", buf.len(), w * h * 3);
    }

    let mut out = vec![0.0f32; buf.len()];
    let hw = w * h;

    for i in 0..hw {
        out[i] = buf[3 * i] as f32 / 255.0;
        out[i + hw] = buf[3 * i + 1] as f32 / 255.0;
        out[i + 2 * hw] = buf[3 * i + 2] as f32 / 255.0;
    }

    Ok(out)
}
