// Visual sync - Reflects already-scheduled beats on the display clock
// Never decides timing itself; it only consumes main-beat events whose time has come

use super::scheduler::ScheduledEvent;
use std::collections::VecDeque;

/// Pending main-beat events and the beat currently highlighted
#[derive(Debug, Clone, Default)]
pub struct VisualSync {
    pending: VecDeque<ScheduledEvent>,
    current_beat: Option<usize>,
}

impl VisualSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a main-beat event (called by the scheduler)
    pub fn push(&mut self, event: ScheduledEvent) {
        self.pending.push_back(event);
    }

    /// Consume every event due at `now` and return the new current beat
    ///
    /// Returns `Some` only when at least one event was consumed this frame.
    pub fn update(&mut self, now: f64) -> Option<usize> {
        let mut latest = None;
        self.pending.retain(|event| {
            if event.time <= now {
                latest = Some(event.beat_index);
                false
            } else {
                true
            }
        });
        if latest.is_some() {
            self.current_beat = latest;
        }
        latest
    }

    /// Beat index of the most recently displayed event
    pub fn current_beat(&self) -> Option<usize> {
        self.current_beat
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Forget all pending events and the highlighted beat
    pub fn clear(&mut self) {
        self.pending.clear();
        self.current_beat = None;
    }
}
