// Shared volume - Click gain read by the audio callback without locking
//
// The control side stores a clamped gain, the output callback loads it once
// per buffer. The f32 travels as its bit pattern in an AtomicU32.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Master click gain shared between the engine and the output stream
#[derive(Debug, Clone)]
pub struct SharedVolume {
    bits: Arc<AtomicU32>,
}

impl SharedVolume {
    pub fn new(volume: f32) -> Self {
        Self {
            bits: Arc::new(AtomicU32::new(Self::clamp(volume).to_bits())),
        }
    }

    /// Store a new gain, clamped to 0.0..=1.0 (NaN becomes silence)
    pub fn set(&self, volume: f32) {
        self.bits
            .store(Self::clamp(volume).to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    fn clamp(volume: f32) -> f32 {
        if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        }
    }
}

impl Default for SharedVolume {
    fn default() -> Self {
        Self::new(0.5)
    }
}
