//! Time management utilities

use std::time::{Duration, Instant};

/// High-precision timer for frame timing
pub struct Timer {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Update the timer (should be called once per frame)
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta_time = now.duration_since(self.last_frame).as_secs_f32();
        self.total_time += self.delta_time;
        self.last_frame = now;
        self.frame_count += 1;
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the average FPS since timer creation
    pub fn average_fps(&self) -> f32 {
        if self.total_time > 0.0 {
            self.frame_count as f32 / self.total_time
        } else {
            0.0
        }
    }
}

/// Simple stopwatch for measuring elapsed time
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time.take() {
            self.elapsed += start.elapsed();
        }
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        let running = self.start_time.map_or(Duration::ZERO, |start| start.elapsed());
        self.elapsed + running
    }

    /// Check if the stopwatch is currently running
    pub fn is_running(&self) -> bool {
        self.start_time.is_some()
    }
}

/// Timing information handed to every frame hook
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Variable timestep for this frame, in seconds
    pub delta: f32,
    /// Fixed simulation timestep, in seconds
    pub fixed_delta: f32,
    /// Simulated time since the clock started, in seconds
    pub total: f64,
    /// Index of this frame, starting at 0
    pub frame: u64,
}

impl FrameTime {
    /// Frame time with the given deltas at the start of the clock
    pub fn new(delta: f32, fixed_delta: f32) -> Self {
        Self {
            delta,
            fixed_delta,
            total: 0.0,
            frame: 0,
        }
    }
}

/// Converts measured frame durations into [`FrameTime`] values
///
/// Deltas are clamped to `max_delta` so a stall (debugger break, window drag)
/// does not produce one huge simulation step.
#[derive(Debug, Clone)]
pub struct FrameClock {
    fixed_delta: f32,
    max_delta: f32,
    total: f64,
    frame: u64,
}

impl FrameClock {
    /// Create a clock
    pub fn new(fixed_delta: f32, max_delta: f32) -> Self {
        Self {
            fixed_delta,
            max_delta,
            total: 0.0,
            frame: 0,
        }
    }

    /// Advance by a measured delta and return the time for the new frame
    pub fn advance(&mut self, measured_delta: f32) -> FrameTime {
        let delta = measured_delta.clamp(0.0, self.max_delta);
        self.total += f64::from(delta);
        let time = FrameTime {
            delta,
            fixed_delta: self.fixed_delta,
            total: self.total,
            frame: self.frame,
        };
        self.frame += 1;
        time
    }

    /// Number of frames produced so far
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Fixed timestep in seconds
    pub fn fixed_delta(&self) -> f32 {
        self.fixed_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_frame_clock_clamps_and_counts() {
        let mut clock = FrameClock::new(1.0 / 60.0, 0.25);

        let first = clock.advance(0.016);
        assert_eq!(first.frame, 0);
        assert_relative_eq!(first.delta, 0.016);
        assert_relative_eq!(first.fixed_delta, 1.0 / 60.0);

        let stalled = clock.advance(3.0);
        assert_eq!(stalled.frame, 1);
        assert_relative_eq!(stalled.delta, 0.25);
        assert_relative_eq!(stalled.total, 0.266, epsilon = 1e-6);
        assert_eq!(clock.frame_count(), 2);
    }

    #[test]
    fn test_negative_delta_is_zeroed() {
        let mut clock = FrameClock::new(0.02, 0.1);
        assert_relative_eq!(clock.advance(-1.0).delta, 0.0);
    }

    #[test]
    fn test_stopwatch_accumulates() {
        let mut stopwatch = Stopwatch::start_new();
        assert!(stopwatch.is_running());
        stopwatch.stop();
        assert!(!stopwatch.is_running());
        let first = stopwatch.elapsed();
        assert_eq!(stopwatch.elapsed(), first);
    }
}
