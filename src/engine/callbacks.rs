// Engine callbacks - Observers notified on state changes and audible beats

use crate::messaging::notification::{BeatNotification, MetronomeState};

pub type StateChangeCallback = Box<dyn Fn(&MetronomeState) + Send + Sync>;
pub type BeatCallback = Box<dyn Fn(&BeatNotification) + Send + Sync>;

/// Host observers
///
/// Callbacks run on whichever thread triggered them (control thread for
/// parameter changes, frame loop for beats) with no engine lock held, so they
/// may call back into the engine.
#[derive(Default)]
pub struct MetronomeCallbacks {
    pub on_state_change: Option<StateChangeCallback>,
    pub on_beat: Option<BeatCallback>,
}

impl MetronomeCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_state_change(mut self, callback: impl Fn(&MetronomeState) + Send + Sync + 'static) -> Self {
        self.on_state_change = Some(Box::new(callback));
        self
    }

    pub fn on_beat(mut self, callback: impl Fn(&BeatNotification) + Send + Sync + 'static) -> Self {
        self.on_beat = Some(Box::new(callback));
        self
    }

    pub(crate) fn state_changed(&self, state: &MetronomeState) {
        if let Some(callback) = &self.on_state_change {
            callback(state);
        }
    }

    pub(crate) fn beat(&self, beat: &BeatNotification) {
        if let Some(callback) = &self.on_beat {
            callback(beat);
        }
    }
}

impl std::fmt::Debug for MetronomeCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetronomeCallbacks")
            .field("on_state_change", &self.on_state_change.is_some())
            .field("on_beat", &self.on_beat.is_some())
            .finish()
    }
}
