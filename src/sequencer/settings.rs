// Settings - Live metronome parameters read by the scheduler

use super::pattern::{AccentMap, resolve_accents, will_sound};
use super::subdivision::{self, SubdivisionPattern};
use super::timeline::{Tempo, TimeSignature};

/// Immutable snapshot of the user-facing parameters
///
/// Changes produce a new snapshot; the scheduler reads the latest one before
/// every sub-event, so an update lands at the next sub-event boundary.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MetronomeSettings {
    pub tempo: Tempo,
    pub time_signature: TimeSignature,
    pub subdivision: SubdivisionPattern,
    pub accents: AccentMap,
}

impl MetronomeSettings {
    pub fn new(tempo: Tempo, time_signature: TimeSignature, subdivision: SubdivisionPattern) -> Self {
        let accents = resolve_accents(&time_signature, &subdivision);
        Self {
            tempo,
            time_signature,
            subdivision,
            accents,
        }
    }

    /// Switch meter. A new meter starts on its first subdivision pattern with a
    /// regenerated accent map; re-selecting the current meter keeps manual accents.
    pub fn with_time_signature(&self, time_signature: TimeSignature) -> Self {
        if time_signature == self.time_signature {
            return self.clone();
        }
        Self::new(
            self.tempo,
            time_signature,
            subdivision::default_for(&time_signature),
        )
    }

    /// Switch subdivision; regenerates the accent map when the pattern changes
    pub fn with_subdivision(&self, subdivision: SubdivisionPattern) -> Self {
        if subdivision == self.subdivision {
            return self.clone();
        }
        Self::new(self.tempo, self.time_signature, subdivision)
    }

    /// Change tempo only; manual accents are kept
    pub fn with_tempo(&self, tempo: Tempo) -> Self {
        Self {
            tempo,
            ..self.clone()
        }
    }

    pub fn will_sound(&self, beat_index: usize) -> bool {
        will_sound(beat_index, &self.time_signature, &self.subdivision)
    }

    /// Duration of sub-event `sub_index` in seconds
    pub fn sub_event_duration(&self, sub_index: usize) -> f64 {
        self.tempo.beat_duration_seconds() * self.subdivision.ratio(sub_index)
    }
}

impl Default for MetronomeSettings {
    fn default() -> Self {
        let time_signature = TimeSignature::default();
        Self::new(
            Tempo::default(),
            time_signature,
            subdivision::default_for(&time_signature),
        )
    }
}
