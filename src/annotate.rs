//! Burns detection boxes and the status overlay into frames.

mod colours;
mod fonts;

use std::path::Path;
use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use crate::common::Detection;

pub use colours::{get_class_colour, LABEL_TEXT_COLOUR, OVERLAY_COLOUR};
pub use fonts::{find_font, load_font};

/// Left edge and text baselines of the overlay lines.
pub const OVERLAY_X: i32 = 10;
pub const OVERLAY_BASELINES: [i32; 3] = [30, 70, 110];

const OVERLAY_SCALE: f32 = 32.;
const LABEL_SCALE: f32 = 20.;
const BOX_THICKNESS: i32 = 2;

/// Overlay text: FPS, the threshold in interactive mode, then the detection count.
pub fn overlay_lines(fps: f32, conf_threshold: Option<f32>, detections: usize) -> Vec<String> {
    let mut lines = vec![format!("FPS: {fps:.1}")];
    if let Some(conf) = conf_threshold {
        lines.push(format!("Conf: {conf:.2}"));
    }
    lines.push(format!("Detections: {detections}"));
    lines
}

pub struct Annotator {
    font: Option<FontVec>,
}

impl Annotator {
    pub fn new(font_path: Option<&Path>) -> Self {
        let font = find_font(font_path);
        if font.is_none() {
            log::warn!("No usable TrueType font found (try --font <path>), drawing boxes without text");
        }
        Self { font }
    }

    /// Boxes only, no text.
    pub fn without_text() -> Self {
        Self { font: None }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn draw_detections(&self, img: &mut RgbImage, detections: &[Detection]) {
        for det in detections {
            let (x, y, w, h) = det.bbox.as_xy_wh_i32();
            if w <= 0 || h <= 0 {
                continue;
            }
            let colour = get_class_colour(det.class_id);
            for t in 0..BOX_THICKNESS {
                let (tw, th) = (w - 2 * t, h - 2 * t);
                if tw <= 0 || th <= 0 {
                    break;
                }
                draw_hollow_rect_mut(img, Rect::at(x + t, y + t).of_size(tw as u32, th as u32), colour);
            }

            if let Some(font) = &self.font {
                draw_label(img, font, x, y, colour, &det.caption());
            }
        }
    }

    pub fn draw_overlay(&self, img: &mut RgbImage, lines: &[String]) {
        let Some(font) = &self.font else {
            return;
        };
        let scale = PxScale::from(OVERLAY_SCALE);
        for (line, baseline) in lines.iter().zip(OVERLAY_BASELINES) {
            let (_, th) = text_size(scale, font, line);
            draw_text_mut(img, OVERLAY_COLOUR, OVERLAY_X, baseline - th as i32, scale, font, line);
        }
    }
}

// filled tag sitting on top of the box, pushed inside the frame at the top edge
fn draw_label(img: &mut RgbImage, font: &FontVec, x: i32, y: i32, colour: Rgb<u8>, text: &str) {
    let scale = PxScale::from(LABEL_SCALE);
    let (tw, th) = text_size(scale, font, text);
    if tw == 0 || th == 0 {
        return;
    }
    let pad = 2;
    let tag_h = th as i32 + 2 * pad;
    let top = if y - tag_h >= 0 { y - tag_h } else { y };

    draw_filled_rect_mut(img, Rect::at(x, top).of_size(tw + 2 * pad as u32, tag_h as u32), colour);
    draw_text_mut(img, LABEL_TEXT_COLOUR, x + pad, top + pad, scale, font, text);
}
