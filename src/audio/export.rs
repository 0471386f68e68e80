// Click track export - Offline rendering of the metronome to WAV
//
// Runs the same lookahead scheduler as live playback, but against a clock
// that advances one render block at a time, as fast as the CPU allows.

use crate::audio::dsp_utils::condition;
use crate::audio::format_conversion::f32_to_i16;
use crate::error::{EngineError, Result};
use crate::sequencer::metronome::{ClickPlayer, ScheduledClick};
use crate::sequencer::scheduler::LookaheadScheduler;
use crate::sequencer::settings::MetronomeSettings;
use hound::{WavSpec, WavWriter};
use log::{debug, info};
use std::io::{Seek, Write};
use std::path::Path;
use std::sync::Arc;

/// Sample encoding of the exported file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportSampleFormat {
    /// 16-bit signed integer PCM
    #[default]
    Int16,
    /// 32-bit IEEE float
    Float32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    /// Sample rate (Hz)
    pub sample_rate: u32,
    /// 1 = mono, 2 = stereo (same signal on both channels)
    pub channels: u16,
    pub sample_format: ExportSampleFormat,
    /// Master click volume (0.0 to 1.0)
    pub volume: f32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            sample_format: ExportSampleFormat::Int16,
            volume: 0.5,
        }
    }
}

impl ExportSettings {
    fn wav_spec(&self) -> WavSpec {
        match self.sample_format {
            ExportSampleFormat::Int16 => WavSpec {
                channels: self.channels,
                sample_rate: self.sample_rate,
                bits_per_sample: 16,
                sample_format: hound::SampleFormat::Int,
            },
            ExportSampleFormat::Float32 => WavSpec {
                channels: self.channels,
                sample_rate: self.sample_rate,
                bits_per_sample: 32,
                sample_format: hound::SampleFormat::Float,
            },
        }
    }

    fn validate(&self) -> Result<()> {
        if !(1..=2).contains(&self.channels) {
            return Err(EngineError::InvalidExportSettings(format!(
                "{} channels (expected 1 or 2)",
                self.channels
            )));
        }
        if self.sample_rate == 0 {
            return Err(EngineError::InvalidExportSettings(
                "sample rate must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Progress callback for export (reports 0.0 to 1.0)
pub type ProgressCallback = Box<dyn FnMut(f32) + Send>;

/// What an export produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    /// Frames written per channel
    pub frames: u64,
    /// Clicks that sounded
    pub clicks: usize,
}

pub struct ClickTrackExporter {
    settings: ExportSettings,
}

fn check_duration(duration_seconds: f64) -> Result<()> {
    if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
        return Err(EngineError::InvalidDuration(duration_seconds));
    }
    Ok(())
}

impl ClickTrackExporter {
    /// Frames rendered per scheduling pass
    const BLOCK_SIZE: usize = 512;

    pub fn new(settings: ExportSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Render `duration_seconds` of the metronome into a WAV file at `path`
    pub fn export(
        &self,
        metronome: &MetronomeSettings,
        duration_seconds: f64,
        path: impl AsRef<Path>,
        progress_callback: Option<ProgressCallback>,
    ) -> Result<ExportSummary> {
        self.settings.validate()?;
        check_duration(duration_seconds)?;
        let path = path.as_ref();
        let writer = WavWriter::create(path, self.settings.wav_spec())?;

        info!(
            "Exporting click track: {:.2}s at {} ({}) to {}",
            duration_seconds,
            metronome.tempo,
            metronome.time_signature,
            path.display()
        );

        let summary = self.write(metronome, duration_seconds, writer, progress_callback)?;
        info!("Export complete: {} frames, {} clicks", summary.frames, summary.clicks);
        Ok(summary)
    }

    /// Render to any seekable writer (file, in-memory cursor)
    pub fn write<W: Write + Seek>(
        &self,
        metronome: &MetronomeSettings,
        duration_seconds: f64,
        mut writer: WavWriter<W>,
        mut progress_callback: Option<ProgressCallback>,
    ) -> Result<ExportSummary> {
        self.settings.validate()?;
        let channels = self.settings.channels;
        let sample_format = self.settings.sample_format;
        let summary = self.render_blocks(metronome, duration_seconds, |block, done, total| {
            for &sample in block {
                for _ in 0..channels {
                    match sample_format {
                        ExportSampleFormat::Int16 => writer.write_sample(f32_to_i16(sample))?,
                        ExportSampleFormat::Float32 => writer.write_sample(sample)?,
                    }
                }
            }
            if let Some(callback) = progress_callback.as_mut() {
                callback(done as f32 / total as f32);
            }
            Ok(())
        })?;

        writer.finalize()?;
        Ok(summary)
    }

    /// Render the mono click signal into memory
    pub fn render(&self, metronome: &MetronomeSettings, duration_seconds: f64) -> Result<Vec<f32>> {
        let mut output = Vec::new();
        self.render_blocks(metronome, duration_seconds, |block, _, _| {
            output.extend_from_slice(block);
            Ok(())
        })?;
        Ok(output)
    }

    fn render_blocks<F>(
        &self,
        metronome: &MetronomeSettings,
        duration_seconds: f64,
        mut emit: F,
    ) -> Result<ExportSummary>
    where
        F: FnMut(&[f32], u64, u64) -> Result<()>,
    {
        check_duration(duration_seconds)?;

        let sample_rate = self.settings.sample_rate as f64;
        let total_frames = (duration_seconds * sample_rate).round() as u64;
        let settings = Arc::new(metronome.clone());

        let mut player = ClickPlayer::new(self.settings.sample_rate as f32);
        player.set_volume(self.settings.volume);
        let mut scheduler = LookaheadScheduler::new();
        scheduler.reset(0.0);

        let mut block = vec![0.0f32; Self::BLOCK_SIZE];
        let mut position: u64 = 0;
        let mut clicks = 0;

        while position < total_frames {
            let frames = Self::BLOCK_SIZE.min((total_frames - position) as usize);
            // Everything that starts inside this block
            let block_end = (position + frames as u64) as f64 / sample_rate;

            scheduler.schedule_until(
                block_end,
                || settings.clone(),
                |event| {
                    if let Some(click_type) = event.click {
                        let sample_time = (event.time * sample_rate).round() as u64;
                        if sample_time < total_frames
                            && player.enqueue(ScheduledClick {
                                sample_time,
                                click_type,
                            })
                        {
                            clicks += 1;
                        }
                    }
                },
            );

            let output = &mut block[..frames];
            player.process_buffer(position, output);
            for sample in output.iter_mut() {
                *sample = condition(*sample);
            }

            position += frames as u64;
            emit(output, position, total_frames)?;
        }

        debug!("Rendered {} frames, {} clicks", total_frames, clicks);
        Ok(ExportSummary {
            frames: total_frames,
            clicks,
        })
    }
}
