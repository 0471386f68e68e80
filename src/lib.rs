// Practice Metronome - Library exports for the host binary, tests and benchmarks

pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod messaging;
pub mod sequencer;

// Re-export commonly used types for convenience
pub use audio::backend::{AudioBackend, OfflineBackend, RecordedClick};
pub use audio::cpal_backend::CpalBackend;
pub use audio::export::{ClickTrackExporter, ExportSampleFormat, ExportSettings};
pub use audio::timing::AudioTiming;
pub use config::{DriveMode, EngineConfig};
pub use engine::{BeatIndicator, ConfigureRequest, MetronomeCallbacks, MetronomeEngine};
pub use error::{EngineError, Result};
pub use messaging::notification::{BeatNotification, BeatTimestamp, MetronomeState};
pub use sequencer::{
    AccentMap, ClickType, LookaheadScheduler, MetronomeSettings, PlaybackState,
    SubdivisionPattern, TEMPO_PRESETS, Tempo, TimeSignature, resolve_accents,
    resolve_main_beats, will_sound,
};
