use crate::timer::{FrameStats, Timer};
use std::cell::Cell;
use std::time::Duration;

/// Deterministic clock: every `now()` returns the current reading and then
/// advances it by `step`. `sleep` advances without blocking.
///
/// With one clock read per rendered frame this behaves like a display
/// refreshing every `step`.
#[derive(Debug, Clone)]
pub struct SteppedTimer {
    current: Cell<Duration>,
    step: Duration,
    frame_times: Vec<Duration>,
}

impl SteppedTimer {
    pub fn new(step: Duration) -> Self {
        Self {
            current: Cell::new(Duration::ZERO),
            step,
            frame_times: Vec::new(),
        }
    }

    pub fn advance(&self, d: Duration) {
        self.current.set(self.current.get() + d);
    }
}

impl Timer for SteppedTimer {
    fn now(&self) -> Duration {
        let t = self.current.get();
        self.current.set(t + self.step);
        t
    }
    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
    fn record_frame(&mut self, d: Duration) {
        self.frame_times.push(d);
    }
    fn frame_stats(&self) -> FrameStats {
        FrameStats::from_samples(&self.frame_times)
    }
    fn reset_frames(&mut self) {
        self.frame_times.clear();
    }
}
