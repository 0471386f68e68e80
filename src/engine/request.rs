// Engine requests - Parameter updates from the host and per-beat display info

use serde::{Deserialize, Serialize};

/// Full parameter update
///
/// Names follow the catalogs: `time_signature` such as "6/8", `subdivision_id`
/// such as "2" or "c1".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigureRequest {
    pub tempo: u32,
    pub time_signature: String,
    pub subdivision_id: String,
    /// Manual accent map applied after any regeneration
    #[serde(default)]
    pub accent_overrides: Option<Vec<bool>>,
}

impl ConfigureRequest {
    pub fn new(tempo: u32, time_signature: impl Into<String>, subdivision_id: impl Into<String>) -> Self {
        Self {
            tempo,
            time_signature: time_signature.into(),
            subdivision_id: subdivision_id.into(),
            accent_overrides: None,
        }
    }

    pub fn with_accents(mut self, accents: Vec<bool>) -> Self {
        self.accent_overrides = Some(accents);
        self
    }
}

/// How one beat cell should be drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BeatIndicator {
    /// Same predicate the scheduler uses to emit the main-beat click
    pub will_sound: bool,
    pub is_accent: bool,
    pub is_current: bool,
}
