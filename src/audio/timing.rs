// Audio clock shared between the realtime callback and the control thread

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Frames rendered by the audio callback, readable from any thread
#[derive(Clone)]
pub struct AudioTiming {
    /// Incremented by the audio callback
    sample_position: Arc<AtomicU64>,
    sample_rate: f64,
}

impl AudioTiming {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_position: Arc::new(AtomicU64::new(0)),
            sample_rate: sample_rate as f64,
        }
    }

    pub fn current_sample(&self) -> u64 {
        self.sample_position.load(Ordering::Relaxed)
    }

    /// Called by the audio callback after each buffer
    pub fn advance(&self, frames: usize) {
        self.sample_position.fetch_add(frames as u64, Ordering::Relaxed);
    }

    /// Current audio time in seconds
    pub fn current_time(&self) -> f64 {
        self.current_sample() as f64 / self.sample_rate
    }

    pub fn seconds_to_samples(&self, seconds: f64) -> u64 {
        (seconds.max(0.0) * self.sample_rate).round() as u64
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_creation() {
        let timing = AudioTiming::new(48000.0);
        assert_eq!(timing.current_sample(), 0);
        assert_eq!(timing.sample_rate(), 48000.0);
        assert_eq!(timing.current_time(), 0.0);
    }

    #[test]
    fn test_advance_is_shared_between_clones() {
        let timing = AudioTiming::new(48000.0);
        let callback_side = timing.clone();
        callback_side.advance(480);
        callback_side.advance(480);
        assert_eq!(timing.current_sample(), 960);
        assert!((timing.current_time() - 0.02).abs() < 1e-9);
    }

    #[test]
    fn test_seconds_to_samples() {
        let timing = AudioTiming::new(48000.0);
        assert_eq!(timing.seconds_to_samples(1.0), 48000);
        assert_eq!(timing.seconds_to_samples(0.01), 480);
        assert_eq!(timing.seconds_to_samples(-1.0), 0);
    }
}
