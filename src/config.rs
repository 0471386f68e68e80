// Engine configuration - Scheduler cadence, lookahead and output settings
// Stored as RON so it can sit next to other user preferences

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Who drives the scheduler tick and the visual frame loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DriveMode {
    /// The engine spawns its own tick and frame threads on start
    #[default]
    Threaded,
    /// The host calls `tick()` and `frame()` from its own timers
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How far ahead of the audio clock events are committed (seconds)
    pub lookahead_secs: f64,
    /// Scheduler tick cadence, independent of tempo
    pub tick_interval_ms: u64,
    /// Visual loop cadence (display refresh)
    pub frame_interval_ms: u64,
    /// Delay between start and the first beat (seconds)
    pub start_offset_secs: f64,
    /// Master click volume (0.0 to 1.0)
    pub volume: f32,
    /// Number of fired beats remembered for masking queries
    pub beat_history: usize,
    pub drive: DriveMode,
    /// Output device name; default device when `None`
    pub device_name: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lookahead_secs: 0.1,
            tick_interval_ms: 25,
            frame_interval_ms: 16,
            start_offset_secs: 0.0,
            volume: 0.5,
            beat_history: 50,
            drive: DriveMode::Threaded,
            device_name: None,
        }
    }
}

impl EngineConfig {
    /// Per-user config location, e.g. `~/.config/practice-metronome/config.ron`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("practice-metronome").join("config.ron"))
    }

    /// Load the per-user config if there is one, defaults otherwise
    ///
    /// A config file that exists but cannot be parsed is logged and ignored.
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path().filter(|path| path.exists()) else {
            return Self::default();
        };
        match Self::load(&path) {
            Ok(config) => {
                log::debug!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load from a RON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(ron::from_str(&content)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    /// Copy with values forced into workable ranges
    ///
    /// The tick must stay well under the shortest beat (200ms at 300 BPM) and
    /// shorter than the lookahead window, or the window could run dry.
    pub fn sanitized(&self) -> Self {
        let lookahead_secs = if self.lookahead_secs.is_finite() {
            self.lookahead_secs.clamp(0.02, 1.0)
        } else {
            0.1
        };
        let max_tick_ms = ((lookahead_secs * 1000.0) as u64 / 2).clamp(1, 100);
        Self {
            lookahead_secs,
            tick_interval_ms: self.tick_interval_ms.clamp(1, max_tick_ms),
            frame_interval_ms: self.frame_interval_ms.clamp(1, 100),
            start_offset_secs: self.start_offset_secs.max(0.0),
            volume: self.volume.clamp(0.0, 1.0),
            beat_history: self.beat_history.max(1),
            drive: self.drive,
            device_name: self.device_name.clone(),
        }
    }
}
