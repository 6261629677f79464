/// Lowest confidence threshold reachable from the keyboard.
pub const MIN_CONF_THRESHOLD: f32 = 0.05;
/// Highest confidence threshold reachable from the keyboard.
pub const MAX_CONF_THRESHOLD: f32 = 0.95;
/// Change applied per key press.
pub const CONF_STEP: f32 = 0.05;

/// Per-run parameters the keyboard can change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionParams {
    pub conf_threshold: f32,
    pub interactive: bool,
}

impl SessionParams {
    /// In interactive mode the starting threshold is pulled into the keyboard range.
    pub fn new(conf_threshold: f32, interactive: bool) -> Self {
        let conf_threshold = if interactive {
            conf_threshold.clamp(MIN_CONF_THRESHOLD, MAX_CONF_THRESHOLD)
        } else {
            conf_threshold
        };
        Self {
            conf_threshold,
            interactive,
        }
    }

    pub fn raise_threshold(self) -> Self {
        self.with_threshold(snap_to_grid(self.conf_threshold + CONF_STEP).min(MAX_CONF_THRESHOLD))
    }

    pub fn lower_threshold(self) -> Self {
        self.with_threshold(snap_to_grid(self.conf_threshold - CONF_STEP).max(MIN_CONF_THRESHOLD))
    }

    fn with_threshold(mut self, conf_threshold: f32) -> Self {
        self.conf_threshold = conf_threshold;
        self
    }
}

const GRID_EPSILON: f32 = 1e-5;

// Only absorbs f32 error from the step (0.3 + 0.05 != 0.35), off-grid values pass through.
fn snap_to_grid(x: f32) -> f32 {
    let rounded = (x * 100.0).round() / 100.0;
    if (x - rounded).abs() < GRID_EPSILON {
        rounded
    } else {
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_clamped_at_the_top() {
        let mut p = SessionParams::new(0.25, true);
        for _ in 0..30 {
            p = p.raise_threshold();
        }
        assert_eq!(p.conf_threshold, 0.95);
        assert_eq!(p.raise_threshold().conf_threshold, 0.95);
    }

    #[test]
    fn threshold_is_clamped_at_the_bottom() {
        let mut p = SessionParams::new(0.25, true);
        for _ in 0..30 {
            p = p.lower_threshold();
        }
        assert_eq!(p.conf_threshold, 0.05);
    }

    #[test]
    fn steps_are_exact_hundredths() {
        let p = SessionParams::new(0.25, true).raise_threshold().raise_threshold();
        assert_eq!(p.conf_threshold, 0.35);
        assert_eq!(p.lower_threshold().conf_threshold, 0.3);
    }

    #[test]
    fn off_grid_start_moves_by_exactly_one_step() {
        let p = SessionParams::new(0.333, true);
        assert!((p.raise_threshold().conf_threshold - 0.383).abs() < 1e-6);
        assert!((p.lower_threshold().conf_threshold - 0.283).abs() < 1e-6);

        let mut top = p;
        for _ in 0..20 {
            top = top.raise_threshold();
        }
        assert_eq!(top.conf_threshold, 0.95);
        assert_eq!(top.lower_threshold().conf_threshold, 0.9);
    }

    #[test]
    fn initial_threshold_clamped_only_when_interactive() {
        assert_eq!(SessionParams::new(0.99, true).conf_threshold, 0.95);
        assert_eq!(SessionParams::new(0.99, false).conf_threshold, 0.99);
    }
}
