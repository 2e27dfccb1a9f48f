//! Frame-rate readout.
//!
//! Frame times accumulate into half-second windows; each completed window
//! yields an averaged FPS figure the app surfaces in the window title, the
//! native stand-in for an on-screen stats overlay.

use instant::Duration;

const WINDOW: Duration = Duration::from_millis(500);

#[derive(Debug, Default)]
pub struct FrameStats {
    frames: u32,
    elapsed: Duration,
    last_fps: Option<f32>,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one frame. Returns the fresh FPS average when a measurement
    /// window just completed, `None` otherwise.
    pub fn record(&mut self, dt: Duration) -> Option<f32> {
        self.frames += 1;
        self.elapsed += dt;
        if self.elapsed < WINDOW {
            return None;
        }
        let fps = self.frames as f32 / self.elapsed.as_secs_f32();
        self.frames = 0;
        self.elapsed = Duration::ZERO;
        self.last_fps = Some(fps);
        Some(fps)
    }

    pub fn last_fps(&self) -> Option<f32> {
        self.last_fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_reading_before_the_window_fills() {
        let mut stats = FrameStats::new();
        assert!(stats.record(Duration::from_millis(100)).is_none());
        assert!(stats.last_fps().is_none());
    }

    #[test]
    fn steady_frames_yield_their_rate() {
        let mut stats = FrameStats::new();
        let mut reading = None;
        for _ in 0..40 {
            if let Some(fps) = stats.record(Duration::from_millis(25)) {
                reading = Some(fps);
            }
        }
        let fps = reading.unwrap();
        assert!((fps - 40.0).abs() < 1.0);
        assert_eq!(stats.last_fps(), Some(fps));
    }

    #[test]
    fn counters_reset_between_windows() {
        let mut stats = FrameStats::new();
        for _ in 0..10 {
            stats.record(Duration::from_millis(50));
        }
        // A second window at a different rate reports the new rate.
        let mut second = None;
        for _ in 0..50 {
            if let Some(fps) = stats.record(Duration::from_millis(10)) {
                second = Some(fps);
            }
        }
        assert!((second.unwrap() - 100.0).abs() < 2.0);
    }
}
