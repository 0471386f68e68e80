// Audio timing - The audio clock the scheduler plans against
// Advanced only by the output callback, so it moves at exactly the device rate

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared monotonic audio clock
#[derive(Debug, Clone)]
pub struct AudioTiming {
    /// Frames rendered since the stream was opened
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

    /// Current frame position (read from any thread)
    pub fn current_sample(&self) -> u64 {
        self.sample_position.load(Ordering::Acquire)
    }

    /// Advance by one rendered buffer (audio callback only)
    pub fn advance(&self, frames: usize) {
        self.sample_position
            .fetch_add(frames as u64, Ordering::Release);
    }

    /// Current audio-clock time in seconds
    pub fn current_seconds(&self) -> f64 {
        self.samples_to_seconds(self.current_sample())
    }

    /// Nearest frame for an absolute time in seconds; negative times map to 0
    pub fn seconds_to_samples(&self, seconds: f64) -> u64 {
        (seconds.max(0.0) * self.sample_rate).round() as u64
    }

    pub fn samples_to_seconds(&self, samples: u64) -> f64 {
        samples as f64 / self.sample_rate
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
        assert_eq!(timing.current_seconds(), 0.0);
        assert_eq!(timing.sample_rate(), 48000.0);
    }

    #[test]
    fn test_advance_samples() {
        let timing = AudioTiming::new(48000.0);
        timing.advance(480);
        assert_eq!(timing.current_sample(), 480);
        timing.advance(480);
        assert_eq!(timing.current_sample(), 960);
        assert!((timing.current_seconds() - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_clones_share_clock() {
        let timing = AudioTiming::new(44100.0);
        let reader = timing.clone();
        timing.advance(44100);
        assert_eq!(reader.current_seconds(), 1.0);
    }

    #[test]
    fn test_seconds_to_samples() {
        let timing = AudioTiming::new(48000.0);
        assert_eq!(timing.seconds_to_samples(0.5), 24000);
        assert_eq!(timing.seconds_to_samples(1.0 / 3.0), 16000);
        assert_eq!(timing.seconds_to_samples(-1.0), 0);
    }
}
