// Metronome engine - Public contract for host applications
//
// Architecture:
// - MetronomeEngine: start/stop, live parameters, tick and frame loops
// - ConfigureRequest / BeatIndicator: what the host sends and draws
// - MetronomeCallbacks: state-change and beat observers
// - BeatHistory: recently fired beats for recording features
//
// Timing never comes from the loops themselves: the scheduler commits clicks
// against the backend's audio clock, and the frame loop only reflects events
// whose time has been reached on that clock.

pub mod callbacks;
pub mod history;
pub mod metronome_engine;
pub mod request;

pub use callbacks::{BeatCallback, MetronomeCallbacks, StateChangeCallback};
pub use history::{BeatHistory, DEFAULT_HISTORY_LEN, DEFAULT_NEAR_BEAT_TOLERANCE_MS};
pub use metronome_engine::MetronomeEngine;
pub use request::{BeatIndicator, ConfigureRequest};
