// Metronome engine - Drives the lookahead scheduler and visual sync against an audio clock
//
// Threads:
// - Control thread: configure / start / stop, swaps the settings snapshot
// - Tick loop: keeps the lookahead window filled at a fixed cadence
// - Frame loop: moves the beat highlight and delivers beat notifications
//
// Both loops share `Playback` under one mutex. Settings are an immutable
// snapshot behind an `Arc`, replaced whole and read once per sub-event.

use crate::audio::backend::{AudioBackend, lock};
use crate::config::{DriveMode, EngineConfig};
use crate::engine::callbacks::MetronomeCallbacks;
use crate::engine::history::{BeatHistory, DEFAULT_NEAR_BEAT_TOLERANCE_MS};
use crate::engine::request::{BeatIndicator, ConfigureRequest};
use crate::error::{EngineError, Result};
use crate::messaging::notification::{
    BeatNotification, BeatTimestamp, MetronomeState, wall_clock_millis,
};
use crate::sequencer::pattern::AccentMap;
use crate::sequencer::scheduler::{BeatMark, LookaheadScheduler, ScheduledEvent};
use crate::sequencer::settings::MetronomeSettings;
use crate::sequencer::subdivision;
use crate::sequencer::timeline::{Tempo, TimeSignature};
use crate::sequencer::transport::AtomicPlaybackState;
use crate::sequencer::visual::VisualSync;
use log::{debug, error, info, warn};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// Audible main beat waiting for the audio clock to reach it
#[derive(Debug, Clone, Copy)]
struct PendingBeat {
    time: f64,
    mark: BeatMark,
}

/// Everything owned by a running session; reset on start and stop
#[derive(Debug, Default)]
struct Playback {
    scheduler: LookaheadScheduler,
    visual: VisualSync,
    pending_beats: VecDeque<PendingBeat>,
}

impl Playback {
    fn reset(&mut self, now: f64) {
        self.scheduler.reset(now);
        self.visual.clear();
        self.pending_beats.clear();
    }
}

struct Shared<B> {
    backend: B,
    config: EngineConfig,
    settings: Mutex<Arc<MetronomeSettings>>,
    transport: AtomicPlaybackState,
    playback: Mutex<Playback>,
    history: Mutex<BeatHistory>,
    callbacks: Mutex<Arc<MetronomeCallbacks>>,
}

impl<B: AudioBackend> Shared<B> {
    fn settings(&self) -> Arc<MetronomeSettings> {
        Arc::clone(&lock(&self.settings))
    }

    fn callbacks(&self) -> Arc<MetronomeCallbacks> {
        Arc::clone(&lock(&self.callbacks))
    }

    /// One scheduler pass: commit every sub-event before now + lookahead
    fn tick(&self, session: u64) -> usize {
        if !self.transport.is_current(session) {
            return 0;
        }
        let horizon = self.backend.current_time() + self.config.lookahead_secs;

        let mut playback = lock(&self.playback);
        // Stop may have run while this tick waited for the lock
        if !self.transport.is_current(session) {
            return 0;
        }
        let Playback {
            scheduler,
            visual,
            pending_beats,
        } = &mut *playback;

        scheduler.schedule_until(
            horizon,
            || self.settings(),
            |event| {
                if let Some(click_type) = event.click {
                    self.backend.schedule_click(event.time, click_type);
                }
                if let Some(mark) = event.beat {
                    pending_beats.push_back(PendingBeat {
                        time: event.time,
                        mark,
                    });
                }
                if event.is_main_beat() {
                    visual.push(ScheduledEvent {
                        time: event.time,
                        beat_index: event.beat_index,
                    });
                }
            },
        )
    }

    /// One display frame: advance the highlight and deliver due beats
    fn frame(&self, session: u64) -> Option<usize> {
        if !self.transport.is_current(session) {
            return None;
        }
        let now = self.backend.current_time();

        let (beat, due) = {
            let mut playback = lock(&self.playback);
            if !self.transport.is_current(session) {
                return None;
            }
            let beat = playback.visual.update(now);
            let mut due = Vec::new();
            while let Some(pending) = playback.pending_beats.front().copied() {
                if pending.time > now {
                    break;
                }
                playback.pending_beats.pop_front();
                due.push(pending);
            }
            (beat, due)
        };

        if !due.is_empty() {
            self.deliver_beats(&due, now);
        }
        beat
    }

    fn deliver_beats(&self, due: &[PendingBeat], now: f64) {
        let wall_now = wall_clock_millis();
        let callbacks = self.callbacks();

        for pending in due {
            // Back-date by how late this frame is relative to the click
            let lateness_ms = ((now - pending.time).max(0.0) * 1000.0).round() as i64;
            let notification = BeatNotification {
                beat_number: pending.mark.beat_number,
                is_accent: pending.mark.is_accent,
                audio_time: pending.time,
                timestamp: wall_now - lateness_ms,
            };
            lock(&self.history).record(BeatTimestamp {
                audio_time: notification.audio_time,
                wall_time: notification.timestamp,
                is_accent: notification.is_accent,
            });
            callbacks.beat(&notification);
        }
    }

    fn state(&self) -> MetronomeState {
        let settings = self.settings();
        let playback = self.transport.get();
        let current_beat = lock(&self.playback).visual.current_beat();
        MetronomeState {
            playback,
            is_playing: playback.is_running(),
            tempo: settings.tempo.bpm(),
            time_signature: settings.time_signature.name,
            subdivision_id: settings.subdivision.id,
            accents: settings.accents.as_slice().to_vec(),
            current_beat,
        }
    }

    fn notify_state_change(&self) {
        let state = self.state();
        self.callbacks().state_changed(&state);
    }

    /// Replace the settings snapshot; observers hear about it only if something changed
    fn update_settings<F>(&self, update: F) -> Result<()>
    where
        F: FnOnce(&MetronomeSettings) -> Result<MetronomeSettings>,
    {
        let changed = {
            let mut current = lock(&self.settings);
            let next = update(&current)?;
            let changed = next != **current;
            if changed {
                *current = Arc::new(next);
            }
            changed
        };
        if changed {
            self.notify_state_change();
        }
        Ok(())
    }
}

/// Sample-accurate metronome bound to an audio backend
///
/// With [`DriveMode::Threaded`] the engine runs its own tick and frame loops
/// between `start` and `stop`. With [`DriveMode::Manual`] the host calls
/// [`tick`](Self::tick) and [`frame`](Self::frame) from its own timers.
pub struct MetronomeEngine<B: AudioBackend> {
    shared: Arc<Shared<B>>,
    loops: Mutex<Vec<JoinHandle<()>>>,
}

impl<B: AudioBackend> MetronomeEngine<B> {
    pub fn new(backend: B, config: EngineConfig) -> Self {
        let config = config.sanitized();
        backend.set_volume(config.volume);

        Self {
            shared: Arc::new(Shared {
                backend,
                history: Mutex::new(BeatHistory::with_capacity(config.beat_history)),
                config,
                settings: Mutex::new(Arc::new(MetronomeSettings::default())),
                transport: AtomicPlaybackState::new(),
                playback: Mutex::new(Playback::default()),
                callbacks: Mutex::new(Arc::new(MetronomeCallbacks::default())),
            }),
            loops: Mutex::new(Vec::new()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.shared.backend
    }

    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    /// Current parameter snapshot
    pub fn settings(&self) -> Arc<MetronomeSettings> {
        self.shared.settings()
    }

    pub fn set_callbacks(&self, callbacks: MetronomeCallbacks) {
        *lock(&self.shared.callbacks) = Arc::new(callbacks);
    }

    /// Update every parameter at once; applies from the next sub-event
    ///
    /// An unknown time signature is rejected and nothing changes. A subdivision
    /// not offered for the meter falls back to the meter's first pattern.
    pub fn configure(&self, request: ConfigureRequest) -> Result<()> {
        let time_signature = TimeSignature::from_name(&request.time_signature)
            .ok_or_else(|| EngineError::UnknownTimeSignature(request.time_signature.clone()))?;
        let subdivision = subdivision::find(&time_signature, &request.subdivision_id)
            .unwrap_or_else(|| {
                let fallback = subdivision::default_for(&time_signature);
                warn!(
                    "Subdivision '{}' not offered for {}, using '{}'",
                    request.subdivision_id, time_signature, fallback.id
                );
                fallback
            });
        let tempo = Tempo::new(request.tempo);
        if tempo.bpm() != request.tempo {
            warn!("Tempo {} out of range, clamped to {}", request.tempo, tempo);
        }

        self.shared.update_settings(|current| {
            let mut next = if current.time_signature != time_signature
                || current.subdivision != subdivision
            {
                MetronomeSettings::new(tempo, time_signature, subdivision)
            } else {
                current.with_tempo(tempo)
            };
            if let Some(flags) = &request.accent_overrides {
                next.accents = AccentMap::from_flags(flags, time_signature.beats);
            }
            Ok(next)
        })
    }

    /// Change tempo only (clamped to 20..=300); manual accents survive
    pub fn set_tempo(&self, bpm: u32) {
        let tempo = Tempo::new(bpm);
        // The closure cannot fail
        let _ = self
            .shared
            .update_settings(|current| Ok(current.with_tempo(tempo)));
    }

    /// Change meter; a new meter starts on its first subdivision with fresh accents
    pub fn set_time_signature(&self, name: &str) -> Result<()> {
        let time_signature = TimeSignature::from_name(name)
            .ok_or_else(|| EngineError::UnknownTimeSignature(name.to_string()))?;
        self.shared
            .update_settings(|current| Ok(current.with_time_signature(time_signature)))
    }

    /// Change subdivision within the current meter; accents are regenerated when
    /// the pattern changes
    pub fn set_subdivision(&self, id: &str) -> Result<()> {
        self.shared.update_settings(|current| {
            let subdivision = subdivision::find(&current.time_signature, id)
                .ok_or_else(|| EngineError::UnknownSubdivision(id.to_string()))?;
            Ok(current.with_subdivision(subdivision))
        })
    }

    /// Flip one accent. Out-of-range indices are ignored and return false.
    pub fn toggle_accent(&self, beat_index: usize) -> bool {
        let mut toggled = false;
        let _ = self.shared.update_settings(|current| {
            let mut next = current.clone();
            toggled = next.accents.toggle(beat_index);
            Ok(next)
        });
        if !toggled {
            warn!("Ignoring accent toggle for beat {}", beat_index);
        }
        toggled
    }

    pub fn set_volume(&self, volume: f32) {
        self.shared.backend.set_volume(volume);
    }

    /// Begin playback from beat 0
    ///
    /// Returns false without side effects when already running or when the
    /// audio output cannot be resumed.
    pub fn start(&self) -> bool {
        if self.shared.transport.is_running() {
            debug!("Start ignored, metronome already running");
            return false;
        }
        if let Err(e) = self.shared.backend.resume() {
            warn!("Cannot start metronome, audio output unavailable: {}", e);
            return false;
        }

        let session = {
            let mut playback = lock(&self.shared.playback);
            if self.shared.transport.is_running() {
                return false;
            }
            let now = self.shared.backend.current_time();
            playback.reset(now + self.shared.config.start_offset_secs);
            self.shared.transport.begin()
        };

        let scheduled = self.shared.tick(session);
        debug!("Session {} started, {} sub-events in first pass", session, scheduled);

        if self.shared.config.drive == DriveMode::Threaded
            && let Err(e) = self.spawn_loops(session)
        {
            error!("Failed to spawn metronome loops: {}", e);
            self.halt();
            return false;
        }

        let settings = self.settings();
        info!(
            "Metronome started: {}, {}, subdivision {}",
            settings.tempo, settings.time_signature, settings.subdivision.id
        );
        self.shared.notify_state_change();
        true
    }

    /// Halt playback and reset the position. Clicks already handed to the
    /// audio output play out.
    pub fn stop(&self) {
        if self.halt() {
            info!("Metronome stopped");
            self.shared.notify_state_change();
        }
    }

    /// Start when stopped, stop when running. Returns whether it is now running.
    pub fn toggle(&self) -> bool {
        if self.is_running() {
            self.stop();
            false
        } else {
            self.start()
        }
    }

    /// Scheduler pass for manually driven engines. Returns the number of
    /// sub-events scheduled (0 when stopped).
    pub fn tick(&self) -> usize {
        self.shared.tick(self.shared.transport.session())
    }

    /// Visual pass for manually driven engines. Returns the new current beat
    /// when it moved this frame.
    pub fn frame(&self) -> Option<usize> {
        self.shared.frame(self.shared.transport.session())
    }

    pub fn is_running(&self) -> bool {
        self.shared.transport.is_running()
    }

    pub fn state(&self) -> MetronomeState {
        self.shared.state()
    }

    /// Beat index currently highlighted, `None` when stopped or before the first beat
    pub fn current_beat(&self) -> Option<usize> {
        lock(&self.shared.playback).visual.current_beat()
    }

    pub fn accents(&self) -> Vec<bool> {
        self.settings().accents.as_slice().to_vec()
    }

    /// Per-beat display flags for the current measure
    pub fn beat_indicators(&self) -> Vec<BeatIndicator> {
        let settings = self.settings();
        let current = self.current_beat();
        (0..settings.time_signature.beats)
            .map(|beat_index| BeatIndicator {
                will_sound: settings.will_sound(beat_index),
                is_accent: settings.accents.is_accent(beat_index),
                is_current: current == Some(beat_index),
            })
            .collect()
    }

    /// Snapshot of the scheduling cursor and position
    pub fn scheduler(&self) -> LookaheadScheduler {
        lock(&self.shared.playback).scheduler.clone()
    }

    /// Main-beat events waiting for the visual loop
    pub fn pending_events(&self) -> usize {
        lock(&self.shared.playback).visual.pending()
    }

    /// Beats fired in the last `window_ms` milliseconds
    pub fn recent_beat_timestamps(&self, window_ms: i64) -> Vec<BeatTimestamp> {
        lock(&self.shared.history).recent(window_ms, wall_clock_millis())
    }

    /// Whether a beat fired within 25ms of `wall_time_ms`
    pub fn is_near_beat(&self, wall_time_ms: i64) -> bool {
        self.is_near_beat_within(wall_time_ms, DEFAULT_NEAR_BEAT_TOLERANCE_MS)
    }

    pub fn is_near_beat_within(&self, wall_time_ms: i64, tolerance_ms: i64) -> bool {
        lock(&self.shared.history).is_near(wall_time_ms, tolerance_ms)
    }

    pub fn clear_beat_history(&self) {
        lock(&self.shared.history).clear();
    }

    fn spawn_loops(&self, session: u64) -> std::io::Result<()> {
        let mut loops = lock(&self.loops);

        let shared = Arc::clone(&self.shared);
        loops.push(
            thread::Builder::new()
                .name("metronome-tick".to_string())
                .spawn(move || {
                    let interval = shared.config.tick_interval();
                    while shared.transport.is_current(session) {
                        thread::park_timeout(interval);
                        shared.tick(session);
                    }
                })?,
        );

        let shared = Arc::clone(&self.shared);
        loops.push(
            thread::Builder::new()
                .name("metronome-frame".to_string())
                .spawn(move || {
                    let interval = shared.config.frame_interval();
                    while shared.transport.is_current(session) {
                        thread::park_timeout(interval);
                        shared.frame(session);
                    }
                })?,
        );

        Ok(())
    }

    fn join_loops(&self) {
        let handles: Vec<JoinHandle<()>> = lock(&self.loops).drain(..).collect();
        let current = thread::current().id();
        for handle in handles {
            // Stopped from a callback running on this loop; it exits on its own
            if handle.thread().id() == current {
                continue;
            }
            handle.thread().unpark();
            if handle.join().is_err() {
                error!("Metronome loop panicked");
            }
        }
    }

    /// End the session and reset playback. Returns whether it was running.
    fn halt(&self) -> bool {
        let was_running = self.shared.transport.end();
        self.join_loops();
        *lock(&self.shared.playback) = Playback::default();
        was_running
    }
}

impl<B: AudioBackend> Drop for MetronomeEngine<B> {
    fn drop(&mut self) {
        self.halt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::backend::OfflineBackend;
    use crate::sequencer::metronome::ClickType;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn manual_engine() -> MetronomeEngine<OfflineBackend> {
        MetronomeEngine::new(
            OfflineBackend::new(),
            EngineConfig {
                drive: DriveMode::Manual,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_initial_state() {
        let engine = manual_engine();
        let state = engine.state();
        assert!(!state.is_playing);
        assert_eq!(state.tempo, 120);
        assert_eq!(state.time_signature, "4/4");
        assert_eq!(state.subdivision_id, "1");
        assert_eq!(state.accents, vec![true, false, false, false]);
        assert_eq!(state.current_beat, None);
        assert_eq!(engine.backend().volume(), 0.5);
    }

    #[test]
    fn test_start_schedules_first_window() {
        let engine = manual_engine();
        assert!(engine.start());
        assert!(engine.is_running());

        // Lookahead 0.1s covers only the first beat
        let clicks = engine.backend().clicks();
        assert_eq!(clicks.len(), 1);
        assert_eq!(clicks[0].time, 0.0);
        assert_eq!(clicks[0].click_type, ClickType::Accent);
        assert_eq!(engine.pending_events(), 1);
    }

    #[test]
    fn test_start_twice_is_ignored() {
        let engine = manual_engine();
        assert!(engine.start());
        assert!(!engine.start());
        assert_eq!(engine.backend().clicks().len(), 1);
    }

    #[test]
    fn test_start_with_unavailable_audio() {
        let engine = MetronomeEngine::new(
            OfflineBackend::unavailable(),
            EngineConfig {
                drive: DriveMode::Manual,
                ..Default::default()
            },
        );
        assert!(!engine.start());
        assert!(!engine.state().is_playing);
        assert_eq!(engine.tick(), 0);
        assert!(engine.backend().clicks().is_empty());
    }

    #[test]
    fn test_tick_when_stopped_is_noop() {
        let engine = manual_engine();
        assert_eq!(engine.tick(), 0);
        assert_eq!(engine.frame(), None);
    }

    #[test]
    fn test_frame_follows_audio_clock() {
        let engine = manual_engine();
        engine.start();
        assert_eq!(engine.frame(), Some(0));

        engine.backend().set_time(0.45);
        engine.tick();
        assert_eq!(engine.frame(), None);
        assert_eq!(engine.current_beat(), Some(0));

        engine.backend().set_time(0.5);
        assert_eq!(engine.frame(), Some(1));
        assert_eq!(engine.current_beat(), Some(1));
    }

    #[test]
    fn test_stop_resets_position() {
        let engine = manual_engine();
        engine.start();
        engine.backend().set_time(1.2);
        engine.tick();
        engine.frame();

        engine.stop();
        assert!(!engine.is_running());
        assert_eq!(engine.scheduler(), LookaheadScheduler::new());
        assert_eq!(engine.pending_events(), 0);
        assert_eq!(engine.current_beat(), None);
    }

    #[test]
    fn test_toggle() {
        let engine = manual_engine();
        assert!(engine.toggle());
        assert!(!engine.toggle());
        assert!(!engine.is_running());
    }

    #[test]
    fn test_toggle_accent_out_of_range() {
        let engine = manual_engine();
        assert!(engine.toggle_accent(2));
        assert_eq!(engine.accents(), vec![true, false, true, false]);
        assert!(!engine.toggle_accent(4));
        assert_eq!(engine.accents(), vec![true, false, true, false]);
    }

    #[test]
    fn test_configure_unknown_time_signature() {
        let engine = manual_engine();
        let result = engine.configure(ConfigureRequest::new(90, "5/4", "1"));
        assert!(matches!(result, Err(EngineError::UnknownTimeSignature(_))));
        assert_eq!(engine.state().tempo, 120);
    }

    #[test]
    fn test_configure_subdivision_fallback() {
        let engine = manual_engine();
        engine
            .configure(ConfigureRequest::new(100, "6/8", "3"))
            .unwrap();
        let state = engine.state();
        assert_eq!(state.time_signature, "6/8");
        assert_eq!(state.subdivision_id, "c1");
        assert_eq!(state.accents, vec![true, false, false, true, false, false]);
    }

    #[test]
    fn test_configure_keeps_manual_accents_on_tempo_change() {
        let engine = manual_engine();
        engine.toggle_accent(1);
        engine
            .configure(ConfigureRequest::new(90, "4/4", "1"))
            .unwrap();
        assert_eq!(engine.accents(), vec![true, true, false, false]);
        assert_eq!(engine.state().tempo, 90);
    }

    #[test]
    fn test_reselecting_meter_or_subdivision_keeps_manual_accents() {
        let engine = manual_engine();
        engine.toggle_accent(2);
        engine.set_time_signature("4/4").unwrap();
        assert_eq!(engine.accents(), vec![true, false, true, false]);

        engine.toggle_accent(1);
        engine.set_subdivision("1").unwrap();
        assert_eq!(engine.accents(), vec![true, true, true, false]);
    }

    #[test]
    fn test_meter_change_resets_subdivision() {
        let engine = manual_engine();
        engine.set_subdivision("4").unwrap();
        engine.toggle_accent(1);
        engine.set_time_signature("3/4").unwrap();
        assert_eq!(engine.state().subdivision_id, "1");
        assert_eq!(engine.accents(), vec![true, false, false]);
    }

    #[test]
    fn test_configure_accent_overrides_resized() {
        let engine = manual_engine();
        engine
            .configure(ConfigureRequest::new(120, "3/4", "2").with_accents(vec![false, true]))
            .unwrap();
        assert_eq!(engine.accents(), vec![false, true, false]);
    }

    #[test]
    fn test_set_subdivision_unknown() {
        let engine = manual_engine();
        assert!(matches!(
            engine.set_subdivision("c1"),
            Err(EngineError::UnknownSubdivision(_))
        ));
        assert!(engine.set_subdivision("4").is_ok());
        assert_eq!(engine.settings().subdivision.len(), 4);
    }

    #[test]
    fn test_state_change_notifications() {
        let engine = manual_engine();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        engine.set_callbacks(MetronomeCallbacks::new().on_state_change(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        engine.set_tempo(100);
        engine.set_tempo(100); // unchanged, no notification
        engine.start();
        engine.stop();
        engine.stop(); // already stopped
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_beat_indicators() {
        let engine = manual_engine();
        engine
            .configure(ConfigureRequest::new(120, "6/8", "c3"))
            .unwrap();
        let indicators = engine.beat_indicators();
        let sounding: Vec<bool> = indicators.iter().map(|i| i.will_sound).collect();
        assert_eq!(sounding, vec![true, false, true, true, false, true]);
        assert!(indicators.iter().all(|i| !i.is_current));
    }

    #[test]
    fn test_beats_recorded_in_history() {
        let engine = manual_engine();
        engine.start();
        engine.frame();

        let recent = engine.recent_beat_timestamps(10_000);
        assert_eq!(recent.len(), 1);
        assert!(recent[0].is_accent);
        assert!(engine.is_near_beat(recent[0].wall_time + 20));
        assert!(!engine.is_near_beat_within(recent[0].wall_time + 20, 10));
    }

    #[test]
    fn test_threaded_start_stop() {
        let engine = MetronomeEngine::new(OfflineBackend::new(), EngineConfig::default());
        assert!(engine.start());
        std::thread::sleep(std::time::Duration::from_millis(30));
        engine.stop();
        assert!(!engine.is_running());
        assert_eq!(engine.scheduler(), LookaheadScheduler::new());
    }
}
