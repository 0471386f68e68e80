// Audio backend - The host audio clock and click output the engine plans against

use crate::error::{EngineError, Result};
use crate::sequencer::metronome::ClickType;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Host audio output as seen by the scheduler
///
/// `current_time` must be monotonic and sample-accurate; clicks passed to
/// `schedule_click` sound at exactly that clock time, however early they arrive.
pub trait AudioBackend: Send + Sync + 'static {
    /// Open or resume output. An error leaves the engine stopped.
    fn resume(&self) -> Result<()>;

    /// Audio-clock time in seconds
    fn current_time(&self) -> f64;

    /// Commit a click at absolute audio-clock time `time`
    fn schedule_click(&self, time: f64, click_type: ClickType);

    fn set_volume(&self, volume: f32);
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Click committed to an [`OfflineBackend`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedClick {
    pub time: f64,
    pub click_type: ClickType,
}

#[derive(Debug, Default)]
struct OfflineState {
    now: f64,
    clicks: Vec<RecordedClick>,
    volume: f32,
    resumed: bool,
}

/// Manually clocked backend for simulations and tests
///
/// Time only moves when `advance` or `set_time` is called, so a whole session
/// can be simulated deterministically in microseconds.
#[derive(Debug)]
pub struct OfflineBackend {
    state: Mutex<OfflineState>,
    available: AtomicBool,
}

impl OfflineBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(OfflineState {
                volume: 1.0,
                ..Default::default()
            }),
            available: AtomicBool::new(true),
        }
    }

    /// A backend whose `resume` always fails, like a device blocked by the platform
    pub fn unavailable() -> Self {
        let backend = Self::new();
        backend.set_available(false);
        backend
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    pub fn advance(&self, seconds: f64) {
        lock(&self.state).now += seconds.max(0.0);
    }

    /// Jump the clock forward to `time`; never moves backwards
    pub fn set_time(&self, time: f64) {
        let mut state = lock(&self.state);
        state.now = state.now.max(time);
    }

    /// Every click committed so far, in scheduling order
    pub fn clicks(&self) -> Vec<RecordedClick> {
        lock(&self.state).clicks.clone()
    }

    pub fn take_clicks(&self) -> Vec<RecordedClick> {
        std::mem::take(&mut lock(&self.state).clicks)
    }

    pub fn volume(&self) -> f32 {
        lock(&self.state).volume
    }

    pub fn is_resumed(&self) -> bool {
        lock(&self.state).resumed
    }
}

impl Default for OfflineBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for OfflineBackend {
    fn resume(&self) -> Result<()> {
        if !self.available.load(Ordering::Relaxed) {
            return Err(EngineError::Unavailable(
                "offline backend disabled".to_string(),
            ));
        }
        lock(&self.state).resumed = true;
        Ok(())
    }

    fn current_time(&self) -> f64 {
        lock(&self.state).now
    }

    fn schedule_click(&self, time: f64, click_type: ClickType) {
        lock(&self.state)
            .clicks
            .push(RecordedClick { time, click_type });
    }

    fn set_volume(&self, volume: f32) {
        lock(&self.state).volume = volume.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_clock() {
        let backend = OfflineBackend::new();
        assert_eq!(backend.current_time(), 0.0);
        backend.advance(0.25);
        backend.advance(-1.0);
        assert_eq!(backend.current_time(), 0.25);
        backend.set_time(0.1);
        assert_eq!(backend.current_time(), 0.25);
        backend.set_time(2.0);
        assert_eq!(backend.current_time(), 2.0);
    }

    #[test]
    fn test_unavailable_resume_fails() {
        let backend = OfflineBackend::unavailable();
        assert!(backend.resume().is_err());
        assert!(!backend.is_resumed());

        backend.set_available(true);
        assert!(backend.resume().is_ok());
        assert!(backend.is_resumed());
    }

    #[test]
    fn test_clicks_recorded_in_order() {
        let backend = OfflineBackend::new();
        backend.schedule_click(0.0, ClickType::Accent);
        backend.schedule_click(0.5, ClickType::Regular);

        let clicks = backend.take_clicks();
        assert_eq!(clicks.len(), 2);
        assert_eq!(clicks[0].click_type, ClickType::Accent);
        assert_eq!(clicks[1].time, 0.5);
        assert!(backend.clicks().is_empty());
    }
}
