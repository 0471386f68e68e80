// Transport - Play/stop state shared between the control thread and the loops

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

/// Transport state (stopped/running)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub enum PlaybackState {
    #[default]
    Stopped = 0,
    Running = 1,
}

impl PlaybackState {
    pub fn is_running(&self) -> bool {
        matches!(self, PlaybackState::Running)
    }
}

impl From<u8> for PlaybackState {
    fn from(value: u8) -> Self {
        match value {
            1 => PlaybackState::Running,
            _ => PlaybackState::Stopped,
        }
    }
}

/// Shared transport state
///
/// Every start bumps the session counter. A tick or frame callback captures the
/// session it was armed for and must find both `Running` and the same session,
/// so callbacks left over from a previous run can never act on a newer one.
#[derive(Debug, Clone, Default)]
pub struct AtomicPlaybackState {
    state: Arc<AtomicU8>,
    session: Arc<AtomicU64>,
}

impl AtomicPlaybackState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> PlaybackState {
        PlaybackState::from(self.state.load(Ordering::Acquire))
    }

    pub fn is_running(&self) -> bool {
        self.get().is_running()
    }

    /// Enter `Running` and return the new session id
    pub fn begin(&self) -> u64 {
        let session = self.session.fetch_add(1, Ordering::AcqRel) + 1;
        self.state.store(PlaybackState::Running as u8, Ordering::Release);
        session
    }

    /// Enter `Stopped`. Returns false if it was already stopped.
    pub fn end(&self) -> bool {
        self.state.swap(PlaybackState::Stopped as u8, Ordering::AcqRel)
            == PlaybackState::Running as u8
    }

    /// Id of the latest session (running or not)
    pub fn session(&self) -> u64 {
        self.session.load(Ordering::Acquire)
    }

    /// Whether a callback armed for `session` may still act
    pub fn is_current(&self, session: u64) -> bool {
        self.is_running() && self.session.load(Ordering::Acquire) == session
    }
}
