// Notifications - What the engine reports to its host

use crate::sequencer::transport::PlaybackState;

/// Audible main beat, delivered when the audio clock reaches it
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct BeatNotification {
    /// 1-based beat number within the measure
    pub beat_number: usize,
    pub is_accent: bool,
    /// Scheduled audio-clock time (seconds)
    pub audio_time: f64,
    /// Wall clock at delivery, Unix milliseconds
    pub timestamp: i64,
}

/// Snapshot published on every parameter or play-state change
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MetronomeState {
    pub playback: PlaybackState,
    pub is_playing: bool,
    pub tempo: u32,
    pub time_signature: &'static str,
    pub subdivision_id: &'static str,
    pub accents: Vec<bool>,
    pub current_beat: Option<usize>,
}

/// Fired beat kept for masking metronome bleed in recordings
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct BeatTimestamp {
    pub audio_time: f64,
    pub wall_time: i64,
    pub is_accent: bool,
}

/// Current Unix time in milliseconds
pub fn wall_clock_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_clock_is_recent() {
        let now = wall_clock_millis();
        // After 2020-01-01
        assert!(now > 1_577_836_800_000);
    }

    #[test]
    fn test_beat_notification_json() {
        let beat = BeatNotification {
            beat_number: 1,
            is_accent: true,
            audio_time: 0.5,
            timestamp: 1_700_000_000_000,
        };
        let json = serde_json::to_value(beat).unwrap();
        assert_eq!(json["beat_number"], 1);
        assert_eq!(json["is_accent"], true);
        assert_eq!(json["audio_time"], 0.5);
    }
}
