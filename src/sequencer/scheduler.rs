// Lookahead scheduler - Turns the resolved pattern into absolute-time events
//
// The scheduler never decides *when* a click sounds by when it runs. A timer
// calls `schedule_until(now + lookahead)` at a fixed cadence, and every
// sub-event whose time falls inside that window is committed with its exact
// audio-clock time. Timer jitter only changes how early an event is committed.

use super::metronome::ClickType;
use super::settings::MetronomeSettings;

/// Main-beat observation delivered to `on_beat` listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct BeatMark {
    /// 1-based beat number within the measure
    pub beat_number: usize,
    pub is_accent: bool,
}

/// One scheduled sub-event and everything decided about it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubEvent {
    /// Absolute audio-clock time in seconds
    pub time: f64,
    pub beat_index: usize,
    pub sub_index: usize,
    /// Time until the next sub-event
    pub duration: f64,
    /// Sound to emit, `None` when silent
    pub click: Option<ClickType>,
    /// Set for audible-by-pattern main beats, even if a rest silenced the click
    pub beat: Option<BeatMark>,
}

impl SubEvent {
    pub fn is_main_beat(&self) -> bool {
        self.sub_index == 0
    }
}

/// Main-beat event kept for the visual sync loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledEvent {
    pub time: f64,
    pub beat_index: usize,
}

/// Scheduling cursor and position within the measure
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookaheadScheduler {
    next_time: f64,
    beat_index: usize,
    sub_index: usize,
}

impl LookaheadScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart from beat 0, sub-event 0 with the cursor at `now`
    pub fn reset(&mut self, now: f64) {
        self.next_time = now;
        self.beat_index = 0;
        self.sub_index = 0;
    }

    /// Audio-clock time of the next unscheduled sub-event
    pub fn next_time(&self) -> f64 {
        self.next_time
    }

    pub fn beat_index(&self) -> usize {
        self.beat_index
    }

    pub fn sub_index(&self) -> usize {
        self.sub_index
    }

    /// Schedule every sub-event starting before `horizon`
    ///
    /// `settings` is called once per sub-event so that parameter changes made while
    /// the pass runs apply from the next sub-event on. Returns the number scheduled.
    pub fn schedule_until<S, F>(&mut self, horizon: f64, mut settings: S, mut sink: F) -> usize
    where
        S: FnMut() -> std::sync::Arc<MetronomeSettings>,
        F: FnMut(&SubEvent),
    {
        let mut count = 0;
        while self.next_time < horizon {
            let current = settings();
            let event = self.schedule_next(&current);
            sink(&event);
            count += 1;
            // A zero-length sub-event would never reach the horizon
            if event.duration <= 0.0 {
                break;
            }
        }
        count
    }

    /// Decide, emit and advance past one sub-event
    pub fn schedule_next(&mut self, settings: &MetronomeSettings) -> SubEvent {
        self.normalize(settings);

        let beat_index = self.beat_index;
        let sub_index = self.sub_index;
        let subdivision = &settings.subdivision;

        let is_main_beat = sub_index == 0;
        let is_sound_beat = settings.will_sound(beat_index);
        let is_rest_position = subdivision.is_rest(sub_index);
        let is_muted_beat = subdivision.mutes_beat(beat_index);
        let is_accent = is_main_beat && settings.accents.is_accent(beat_index);

        let should_sound = if is_main_beat {
            is_sound_beat && !is_rest_position && !is_muted_beat
        } else {
            !is_rest_position && !is_muted_beat
        };

        let click = should_sound.then_some(if is_accent {
            ClickType::Accent
        } else if is_main_beat {
            ClickType::Regular
        } else {
            ClickType::Subdivision
        });

        let beat = (is_main_beat && is_sound_beat).then_some(BeatMark {
            beat_number: beat_index + 1,
            is_accent,
        });

        // Silent sub-events still take their full share of the beat
        let duration = settings.sub_event_duration(sub_index);
        let event = SubEvent {
            time: self.next_time,
            beat_index,
            sub_index,
            duration,
            click,
            beat,
        };

        self.next_time += duration;
        self.sub_index += 1;
        if self.sub_index >= subdivision.len() {
            self.sub_index = 0;
            self.beat_index = (self.beat_index + 1) % settings.time_signature.beats.max(1);
        }

        event
    }

    /// Re-fit indices after the meter or pattern shrank under a running cursor
    fn normalize(&mut self, settings: &MetronomeSettings) {
        let beats = settings.time_signature.beats.max(1);
        if self.sub_index >= settings.subdivision.len() {
            self.sub_index = 0;
            self.beat_index += 1;
        }
        if self.beat_index >= beats {
            self.beat_index = 0;
        }
    }
}
