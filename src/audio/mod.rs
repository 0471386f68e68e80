// Audio module - Host audio clock, CPAL output and offline rendering

pub mod backend;
pub mod cpal_backend;
pub mod device;
pub mod dsp_utils;
pub mod export;
pub mod format_conversion;
pub mod parameters;
pub mod status;
pub mod timing;

pub use backend::{AudioBackend, OfflineBackend, RecordedClick};
pub use cpal_backend::CpalBackend;
pub use device::{AudioDeviceInfo, AudioDeviceManager};
pub use export::{ClickTrackExporter, ExportSampleFormat, ExportSettings, ExportSummary};
pub use timing::AudioTiming;
