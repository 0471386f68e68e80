// Integration test: Engine lifecycle
//
// Start/stop contract, unavailable audio, threaded loops against a clock
// moving in real time.

use practice_metronome::audio::backend::OfflineBackend;
use practice_metronome::{
    ConfigureRequest, DriveMode, EngineConfig, LookaheadScheduler, MetronomeCallbacks,
    MetronomeEngine, PlaybackState,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

fn manual_config() -> EngineConfig {
    EngineConfig {
        drive: DriveMode::Manual,
        ..Default::default()
    }
}

#[test]
fn test_stop_is_idempotent() {
    let engine = MetronomeEngine::new(OfflineBackend::new(), manual_config());
    let initial = engine.state();

    engine.stop();
    engine.stop();
    assert_eq!(engine.state(), initial);
    assert_eq!(engine.scheduler(), LookaheadScheduler::new());
    assert_eq!(engine.pending_events(), 0);

    engine.start();
    for i in 1..30 {
        engine.backend().set_time(i as f64 * 0.025);
        engine.tick();
        engine.frame();
    }
    engine.stop();
    engine.stop();
    assert_eq!(engine.state(), initial);
    assert_eq!(engine.scheduler(), LookaheadScheduler::new());
    assert_eq!(engine.pending_events(), 0);
}

#[test]
fn test_stop_keeps_committed_clicks() {
    let engine = MetronomeEngine::new(OfflineBackend::new(), manual_config());
    engine.start();
    engine.backend().set_time(0.45);
    engine.tick();
    engine.stop();

    // The click at 0.5 was already handed to the output
    assert_eq!(engine.backend().clicks().len(), 2);
    engine.backend().set_time(0.6);
    assert_eq!(engine.tick(), 0);
    assert_eq!(engine.frame(), None);
    assert_eq!(engine.backend().clicks().len(), 2);
}

#[test]
fn test_unavailable_audio_stays_stopped() {
    let engine = MetronomeEngine::new(OfflineBackend::unavailable(), manual_config());
    let notifications = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&notifications);
    engine.set_callbacks(MetronomeCallbacks::new().on_state_change(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    assert!(!engine.start());
    assert!(!engine.toggle());
    assert_eq!(engine.state().playback, PlaybackState::Stopped);
    assert_eq!(notifications.load(Ordering::SeqCst), 0);

    // Once the platform allows audio, start works
    engine.backend().set_available(true);
    assert!(engine.start());
    assert!(engine.state().is_playing);
    assert_eq!(notifications.load(Ordering::SeqCst), 1);
}

#[test]
fn test_state_change_reports_parameters() {
    let engine = MetronomeEngine::new(OfflineBackend::new(), manual_config());
    let last = Arc::new(std::sync::Mutex::new(None));
    let sink = Arc::clone(&last);
    engine.set_callbacks(MetronomeCallbacks::new().on_state_change(move |state| {
        *sink.lock().unwrap() = Some(state.clone());
    }));

    engine
        .configure(ConfigureRequest::new(96, "3/4", "3"))
        .unwrap();
    let state = last.lock().unwrap().clone().unwrap();
    assert_eq!(state.tempo, 96);
    assert_eq!(state.time_signature, "3/4");
    assert_eq!(state.subdivision_id, "3");
    assert!(!state.is_playing);
}

#[test]
fn test_callback_may_stop_engine() {
    let engine = Arc::new(MetronomeEngine::new(OfflineBackend::new(), manual_config()));
    let handle = Arc::downgrade(&engine);
    engine.set_callbacks(MetronomeCallbacks::new().on_beat(move |_| {
        if let Some(engine) = handle.upgrade() {
            engine.stop();
        }
    }));

    engine.start();
    engine.frame();
    assert!(!engine.is_running());
}

#[test]
fn test_threaded_loops_follow_clock() {
    let engine = MetronomeEngine::new(OfflineBackend::new(), EngineConfig::default());
    let beats = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&beats);
    engine.set_callbacks(MetronomeCallbacks::new().on_beat(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    assert!(engine.start());
    let started = Instant::now();
    while started.elapsed() < Duration::from_millis(700) {
        engine.backend().set_time(started.elapsed().as_secs_f64());
        std::thread::sleep(Duration::from_millis(2));
    }
    engine.stop();

    let times: Vec<f64> = engine.backend().clicks().iter().map(|c| c.time).collect();
    assert!(times.len() >= 2, "clicks: {:?}", times);
    assert_eq!(&times[..2], &[0.0, 0.5]);
    assert!(times.iter().all(|t| (t / 0.5).fract() == 0.0));
    assert!(beats.load(Ordering::SeqCst) >= 2);
}

#[test]
fn test_beat_history_masking_window() {
    let engine = MetronomeEngine::new(OfflineBackend::new(), manual_config());
    engine.start();
    for i in 1..=40 {
        engine.backend().set_time(i as f64 * 0.025);
        engine.tick();
        engine.frame();
    }

    let recent = engine.recent_beat_timestamps(60_000);
    assert_eq!(recent.len(), 3);
    assert!(recent[0].is_accent);
    assert!(recent.windows(2).all(|w| w[0].audio_time < w[1].audio_time));
    assert!(engine.is_near_beat(recent[2].wall_time));

    engine.clear_beat_history();
    assert!(engine.recent_beat_timestamps(60_000).is_empty());
}
