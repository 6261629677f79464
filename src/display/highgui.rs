use anyhow::Result;
use opencv::{
    core::{Mat, Scalar, CV_8UC3},
    highgui,
    prelude::*,
};
use crate::common::Frame;
use crate::display::Display;

/// OpenCV HighGUI window.
#[derive(Debug, Default)]
pub struct HighGuiDisplay {
    windows: Vec<String>,
}

impl HighGuiDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    fn to_mat(frame: &Frame) -> Result<Mat> {
        let mut mat = Mat::new_rows_cols_with_default(
            frame.height() as i32,
            frame.width() as i32,
            CV_8UC3,
            Scalar::all(0.),
        )?;
        mat.data_bytes_mut()?.copy_from_slice(&frame.to_bgr_bytes());
        Ok(mat)
    }
}

impl Display for HighGuiDisplay {
    fn show(&mut self, window: &str, frame: &Frame) -> Result<()> {
        if !self.windows.iter().any(|w| w == window) {
            highgui::named_window(window, highgui::WINDOW_AUTOSIZE)?;
            self.windows.push(window.to_string());
        }
        let mat = Self::to_mat(frame)?;
        highgui::imshow(window, &mat)?;
        Ok(())
    }

    fn poll_key(&mut self, timeout_ms: i32) -> Result<Option<i32>> {
        let key = highgui::wait_key(timeout_ms.max(1))?;
        Ok((key >= 0).then_some(key))
    }

    fn destroy_all(&mut self) {
        if self.windows.is_empty() {
            return;
        }
        self.windows.clear();
        if let Err(err) = highgui::destroy_all_windows() {
            log::warn!("Failed to close windows: {err}");
        }
    }
}
