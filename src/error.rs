// Error types for the metronome engine and its audio backends

/// Engine error types
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("No audio output device found")]
    NoDevice,

    #[error("Audio device not found: {0}")]
    DeviceNotFound(String),

    #[error("Audio output unavailable: {0}")]
    Unavailable(String),

    #[error("Audio configuration error: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),

    #[error("Failed to build audio stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("Failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("Unsupported sample format: {0}. Supported formats: F32, I16, U16")]
    UnsupportedSampleFormat(String),

    #[error("Unknown time signature: {0}")]
    UnknownTimeSignature(String),

    #[error("Unknown subdivision: {0}")]
    UnknownSubdivision(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON error: {0}")]
    Ron(#[from] ron::Error),

    #[error("RON parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Invalid export duration: {0}s")]
    InvalidDuration(f64),

    #[error("Invalid export settings: {0}")]
    InvalidExportSettings(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
