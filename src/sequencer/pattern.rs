// Pattern resolver - Which beats sound, which are accented
// Pure functions of (time signature, subdivision); shared by the scheduler and UI

use super::subdivision::{DOTTED_QUARTER_PULSE, SubdivisionPattern};
use super::timeline::TimeSignature;
use std::collections::BTreeSet;

/// Whether `beat_index` produces a main-beat sound at all
///
/// Every beat is a main beat, except for the dotted-quarter pulse in a compound
/// meter where only the first pulse of each group of three is.
pub fn is_main_beat(
    beat_index: usize,
    time_signature: &TimeSignature,
    subdivision: &SubdivisionPattern,
) -> bool {
    if beat_index >= time_signature.beats {
        return false;
    }
    if time_signature.is_compound() && subdivision.id == DOTTED_QUARTER_PULSE {
        beat_index % 3 == 0
    } else {
        true
    }
}

/// Set of beat indices that emit a main-beat sound
pub fn resolve_main_beats(
    time_signature: &TimeSignature,
    subdivision: &SubdivisionPattern,
) -> BTreeSet<usize> {
    (0..time_signature.beats)
        .filter(|b| is_main_beat(*b, time_signature, subdivision))
        .collect()
}

/// Default accent map for a signature/subdivision selection
///
/// Compound meters accent the start of every group of three; simple meters
/// accent the downbeat only.
pub fn resolve_accents(
    time_signature: &TimeSignature,
    _subdivision: &SubdivisionPattern,
) -> AccentMap {
    let accents = (0..time_signature.beats)
        .map(|b| {
            if time_signature.is_compound() {
                b % 3 == 0
            } else {
                b == 0
            }
        })
        .collect();
    AccentMap(accents)
}

/// Single predicate deciding whether a beat is audible
pub fn will_sound(
    beat_index: usize,
    time_signature: &TimeSignature,
    subdivision: &SubdivisionPattern,
) -> bool {
    is_main_beat(beat_index, time_signature, subdivision) && !subdivision.mutes_beat(beat_index)
}

/// Per-beat accent flags, one entry per beat of the measure
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
pub struct AccentMap(Vec<bool>);

impl AccentMap {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Accent flag for `beat_index`; out-of-range beats are unaccented
    pub fn is_accent(&self, beat_index: usize) -> bool {
        self.0.get(beat_index).copied().unwrap_or(false)
    }

    /// Flip one entry. Returns false (and changes nothing) when out of range.
    pub fn toggle(&mut self, beat_index: usize) -> bool {
        match self.0.get_mut(beat_index) {
            Some(accent) => {
                *accent = !*accent;
                true
            }
            None => false,
        }
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    /// Build from explicit flags, fitted to `beats` entries (missing entries unaccented)
    pub fn from_flags(flags: &[bool], beats: usize) -> Self {
        let mut accents = flags.to_vec();
        accents.resize(beats, false);
        Self(accents)
    }
}
