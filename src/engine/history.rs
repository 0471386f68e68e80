// Beat history - Recently fired beats, for masking metronome bleed in recordings

use crate::messaging::notification::BeatTimestamp;
use std::collections::VecDeque;

/// Default number of beats remembered
pub const DEFAULT_HISTORY_LEN: usize = 50;

/// Default tolerance for `is_near_beat` (milliseconds)
pub const DEFAULT_NEAR_BEAT_TOLERANCE_MS: i64 = 25;

/// Bounded list of fired beats, oldest first
///
/// When full, recording a new beat drops the oldest one.
#[derive(Debug, Clone)]
pub struct BeatHistory {
    entries: VecDeque<BeatTimestamp>,
    capacity: usize,
}

impl BeatHistory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_LEN)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, beat: BeatTimestamp) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(beat);
    }

    /// Beats fired within `window_ms` before `now_ms`
    pub fn recent(&self, window_ms: i64, now_ms: i64) -> Vec<BeatTimestamp> {
        let cutoff = now_ms - window_ms.max(0);
        self.entries
            .iter()
            .filter(|beat| beat.wall_time >= cutoff)
            .copied()
            .collect()
    }

    /// Whether any remembered beat lies within `tolerance_ms` of `wall_time_ms`
    pub fn is_near(&self, wall_time_ms: i64, tolerance_ms: i64) -> bool {
        self.entries
            .iter()
            .any(|beat| (beat.wall_time - wall_time_ms).abs() <= tolerance_ms)
    }

    pub fn last(&self) -> Option<&BeatTimestamp> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for BeatHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beat(wall_time: i64) -> BeatTimestamp {
        BeatTimestamp {
            audio_time: wall_time as f64 / 1000.0,
            wall_time,
            is_accent: false,
        }
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut history = BeatHistory::with_capacity(3);
        for t in [100, 200, 300, 400] {
            history.record(beat(t));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.recent(i64::MAX / 2, 400).first().map(|b| b.wall_time), Some(200));
        assert_eq!(history.last().map(|b| b.wall_time), Some(400));
    }

    #[test]
    fn test_recent_window() {
        let mut history = BeatHistory::new();
        for t in [1000, 1500, 2000, 2500] {
            history.record(beat(t));
        }
        let recent: Vec<i64> = history
            .recent(1000, 2600)
            .iter()
            .map(|b| b.wall_time)
            .collect();
        assert_eq!(recent, vec![2000, 2500]);
        assert!(history.recent(50, 2600).is_empty());
    }

    #[test]
    fn test_is_near() {
        let mut history = BeatHistory::new();
        history.record(beat(1000));

        assert!(history.is_near(1000, DEFAULT_NEAR_BEAT_TOLERANCE_MS));
        assert!(history.is_near(1025, DEFAULT_NEAR_BEAT_TOLERANCE_MS));
        assert!(history.is_near(975, DEFAULT_NEAR_BEAT_TOLERANCE_MS));
        assert!(!history.is_near(1026, DEFAULT_NEAR_BEAT_TOLERANCE_MS));

        history.clear();
        assert!(!history.is_near(1000, DEFAULT_NEAR_BEAT_TOLERANCE_MS));
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let mut history = BeatHistory::with_capacity(0);
        history.record(beat(1));
        history.record(beat(2));
        assert_eq!(history.len(), 1);
    }
}
