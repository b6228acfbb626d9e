//! Frame timing and the FPS readout.
//!
//! [`Time`] is advanced once per redraw by the frame driver. [`FpsCounter`]
//! turns frame deltas into the number shown on the overlay.

use std::time::{Duration, Instant};

/// Frame timing. Updated at the start of each frame.
#[derive(Debug, Clone, Copy)]
pub struct Time {
    /// When the app started.
    startup: Instant,
    /// When the current frame started.
    frame_start: Instant,
    /// Duration of the previous frame.
    delta: Duration,
    /// Total time since startup.
    elapsed: Duration,
    frame_count: u64,
}

impl Time {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            startup: now,
            frame_start: now,
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Call at the start of each frame.
    pub fn update(&mut self) {
        self.update_at(Instant::now());
    }

    pub(crate) fn update_at(&mut self, now: Instant) {
        self.delta = now.saturating_duration_since(self.frame_start);
        self.frame_start = now;
        self.elapsed = now.saturating_duration_since(self.startup);
        self.frame_count += 1;
    }

    /// Duration of the previous frame.
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Delta time in seconds.
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Total elapsed time in seconds.
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Number of frames rendered so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

/// Once-per-second FPS sample.
///
/// Deltas accumulate until at least one second has passed; the reading is
/// then replaced by `1 / delta` of that single frame and the accumulator is
/// reset. The value is instantaneous, not an average over the second.
#[derive(Debug, Clone, Copy, Default)]
pub struct FpsCounter {
    accumulated: f32,
    fps: f32,
}

/// Accumulated seconds before the reading refreshes.
const FPS_REFRESH_SECS: f32 = 1.0;

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one frame's delta in seconds. Returns `true` when the reading
    /// changed this frame.
    pub fn tick(&mut self, delta_secs: f32) -> bool {
        self.accumulated += delta_secs;
        if self.accumulated >= FPS_REFRESH_SECS {
            self.fps = if delta_secs > 0.0 { 1.0 / delta_secs } else { 0.0 };
            self.accumulated = 0.0;
            true
        } else {
            false
        }
    }

    /// The current reading (0 until the first second has passed).
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Overlay line for the current reading.
    pub fn label(&self) -> String {
        format!("FPS: {:.6}", self.fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_zero_before_first_second() {
        let mut counter = FpsCounter::new();
        for _ in 0..59 {
            assert!(!counter.tick(1.0 / 60.0));
        }
        assert_eq!(counter.fps(), 0.0);
    }

    #[test]
    fn fps_uses_instantaneous_delta() {
        let mut counter = FpsCounter::new();
        counter.tick(0.5);
        counter.tick(0.45);
        // Crosses one second on a slow 0.1s frame: reading is 10, not ~3.
        assert!(counter.tick(0.1));
        assert!((counter.fps() - 10.0).abs() < 1e-4, "got {}", counter.fps());
    }

    #[test]
    fn fps_accumulator_resets() {
        let mut counter = FpsCounter::new();
        assert!(counter.tick(1.5));
        assert!(!counter.tick(0.5), "accumulator should restart from zero");
        assert!(counter.tick(0.6));
    }

    #[test]
    fn exactly_one_second_refreshes() {
        let mut counter = FpsCounter::new();
        assert!(!counter.tick(0.5));
        assert!(counter.tick(0.5));
        assert_eq!(counter.fps(), 2.0);
    }

    #[test]
    fn label_format() {
        let mut counter = FpsCounter::new();
        counter.tick(2.0);
        assert_eq!(counter.label(), "FPS: 0.500000");
    }

    #[test]
    fn time_tracks_frames() {
        let mut time = Time::new();
        let start = time.frame_start;
        time.update_at(start + Duration::from_millis(16));
        time.update_at(start + Duration::from_millis(40));
        assert_eq!(time.frame_count(), 2);
        assert_eq!(time.delta(), Duration::from_millis(24));
        assert!((time.elapsed_secs() - 0.040).abs() < 1e-6);
    }
}
