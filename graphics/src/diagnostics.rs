//! Frame diagnostics: FPS measurement and draw call counting.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Frames-per-second over a sliding window of frame deltas.
#[derive(Debug, Clone)]
pub struct FpsMeter {
    range: usize,
    deltas: VecDeque<f64>,
    last: Option<Instant>,
    delta: Duration,
    fps: f64,
}

impl FpsMeter {
    /// Create a meter averaging the last `range` frames.
    pub fn new(range: usize) -> Self {
        Self {
            range: range.max(1),
            deltas: VecDeque::with_capacity(range.max(1)),
            last: None,
            delta: Duration::ZERO,
            fps: 60.0,
        }
    }

    /// Record a frame starting at `now`.
    ///
    /// The first frame only sets the baseline.
    pub fn measure(&mut self, now: Instant) {
        if let Some(last) = self.last {
            self.delta = now.saturating_duration_since(last);
            self.deltas.push_back(self.delta.as_secs_f64() * 1000.0);
            if self.deltas.len() > self.range {
                self.deltas.pop_front();
            }
            let average = self.deltas.iter().sum::<f64>() / self.deltas.len() as f64;
            if average > 0.0 {
                self.fps = 1000.0 / average;
            }
        }
        self.last = Some(now);
    }

    /// Frames per second averaged over the window.
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Duration of the last frame.
    pub fn delta_time(&self) -> Duration {
        self.delta
    }

    /// Number of deltas currently in the window.
    pub fn samples(&self) -> usize {
        self.deltas.len()
    }
}

/// Draw calls of the current frame, the previous frame and overall.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawCallCounter {
    current: usize,
    last_frame: usize,
    total: usize,
    frames: u64,
}

impl DrawCallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count `count` draw calls in the current frame.
    pub fn add(&mut self, count: usize) {
        self.current += count;
        self.total += count;
    }

    /// Close the current frame.
    pub fn roll(&mut self) {
        self.last_frame = self.current;
        self.current = 0;
        self.frames += 1;
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn last_frame(&self) -> usize {
        self.last_frame
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Average draw calls per closed frame.
    pub fn average(&self) -> f64 {
        if self.frames == 0 {
            0.0
        } else {
            self.total.saturating_sub(self.current) as f64 / self.frames as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps_window() {
        let start = Instant::now();
        let mut meter = FpsMeter::new(3);
        meter.measure(start);
        assert_eq!(meter.samples(), 0);

        for frame in 1..=5 {
            meter.measure(start + Duration::from_millis(20 * frame));
        }
        assert_eq!(meter.samples(), 3);
        assert!((meter.fps() - 50.0).abs() < 1e-6);
        assert_eq!(meter.delta_time(), Duration::from_millis(20));
    }

    #[test]
    fn test_fps_window_drops_old_samples() {
        let start = Instant::now();
        let mut meter = FpsMeter::new(2);
        meter.measure(start);
        meter.measure(start + Duration::from_millis(100));
        meter.measure(start + Duration::from_millis(110));
        meter.measure(start + Duration::from_millis(120));
        assert!((meter.fps() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_draw_call_counter() {
        let mut counter = DrawCallCounter::new();
        counter.add(3);
        counter.add(2);
        assert_eq!(counter.current(), 5);
        counter.roll();
        assert_eq!(counter.current(), 0);
        assert_eq!(counter.last_frame(), 5);
        counter.add(1);
        assert_eq!(counter.total(), 6);
        assert!((counter.average() - 5.0).abs() < 1e-9);
    }
}
