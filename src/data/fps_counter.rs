use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Frames-per-second from wall-clock deltas between successful steps.
///
/// With a window of 1 the value is the instantaneous `1 / Δt`. Larger windows average
/// over the last `window` deltas. The first tick always reports `0.0`.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    prev: Option<Instant>,
    window: usize,
    deltas: VecDeque<Duration>,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new(1)
    }
}

impl FpsCounter {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            prev: None,
            window,
            deltas: VecDeque::with_capacity(window),
        }
    }

    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> f32 {
        let prev = self.prev.replace(now);
        let Some(prev) = prev else {
            return 0.0;
        };

        if self.deltas.len() == self.window {
            self.deltas.pop_front();
        }
        self.deltas.push_back(now.saturating_duration_since(prev));

        let total: Duration = self.deltas.iter().sum();
        if total.is_zero() {
            return 0.0;
        }
        self.deltas.len() as f32 / total.as_secs_f32()
    }

    pub fn reset(&mut self) {
        self.prev = None;
        self.deltas.clear();
    }
}
