// Sequencer module - Metronome timing core
// Meter catalog, pattern resolution, lookahead scheduling and visual sync

pub mod metronome;
pub mod pattern;
pub mod scheduler;
pub mod settings;
pub mod subdivision;
pub mod timeline;
pub mod transport;
pub mod visual;

pub use metronome::{ClickPlayer, ClickType, MetronomeSound, ScheduledClick};
pub use pattern::{AccentMap, resolve_accents, resolve_main_beats, will_sound};
pub use scheduler::{BeatMark, LookaheadScheduler, ScheduledEvent, SubEvent};
pub use settings::MetronomeSettings;
pub use subdivision::SubdivisionPattern;
pub use timeline::{TEMPO_PRESETS, Tempo, TempoPreset, TimeSignature};
pub use transport::{AtomicPlaybackState, PlaybackState};
pub use visual::VisualSync;
