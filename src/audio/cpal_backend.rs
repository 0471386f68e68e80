// CPAL output backend - Real-time click rendering on the host audio device
//
// The stream lives on its own thread: on some hosts (CoreAudio) `cpal::Stream`
// is neither Send nor Sync, so the backend only keeps the Send halves (clock,
// command producer) and tells the stream thread when to shut down.
//
// The audio clock is the frame counter advanced by the output callback, so a
// click scheduled at time t is rendered at frame round(t * sample_rate) exactly.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use log::{debug, error, info, warn};
use ringbuf::traits::{Consumer, Producer};
use std::sync::Mutex;
use std::sync::mpsc;
use std::thread::JoinHandle;

use crate::audio::backend::{AudioBackend, lock};
use crate::audio::device::AudioDeviceManager;
use crate::audio::dsp_utils::condition;
use crate::audio::format_conversion::write_mono_to_interleaved_frame;
use crate::audio::parameters::SharedVolume;
use crate::audio::status::{AtomicDeviceStatus, DeviceStatus};
use crate::audio::timing::AudioTiming;
use crate::error::{EngineError, Result};
use crate::messaging::channels::{CommandConsumer, CommandProducer, create_command_channel};
use crate::messaging::command::AudioCommand;
use crate::sequencer::metronome::{ClickPlayer, ClickType, ScheduledClick};

/// Sized for 100ms of sixteenths at 300 BPM with a wide margin
const COMMAND_RINGBUFFER_CAPACITY: usize = 512;

/// Live connection to an output stream
struct OutputHandle {
    timing: AudioTiming,
    commands: CommandProducer,
    shutdown: mpsc::Sender<()>,
    thread: Option<JoinHandle<()>>,
}

pub struct CpalBackend {
    device_name: Option<String>,
    output: Mutex<Option<OutputHandle>>,
    pub volume: SharedVolume,
    pub status: AtomicDeviceStatus,
}

impl CpalBackend {
    /// Backend for the named output device, or the default device when `None`
    ///
    /// Nothing is opened until `resume` is called.
    pub fn new(device_name: Option<String>, volume: f32) -> Self {
        Self {
            device_name,
            output: Mutex::new(None),
            volume: SharedVolume::new(volume),
            status: AtomicDeviceStatus::new(DeviceStatus::Disconnected),
        }
    }

    /// Sample rate of the open stream
    pub fn sample_rate(&self) -> Option<f32> {
        lock(&self.output)
            .as_ref()
            .map(|output| output.timing.sample_rate())
    }

    /// Stop the stream and release the device
    pub fn close(&self) {
        let handle = lock(&self.output).take();
        if let Some(mut handle) = handle {
            let _ = handle.commands.try_push(AudioCommand::Reset);
            let _ = handle.shutdown.send(());
            if let Some(thread) = handle.thread.take() {
                let _ = thread.join();
            }
            self.status.set(DeviceStatus::Disconnected);
            debug!("Audio output closed");
        }
    }

    fn open(&self) -> Result<OutputHandle> {
        self.status.set(DeviceStatus::Connecting);

        let (ready_tx, ready_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let device_name = self.device_name.clone();
        let volume = self.volume.clone();
        let status = self.status.clone();

        let thread = std::thread::Builder::new()
            .name("metronome-output".to_string())
            .spawn(move || {
                match Self::start_stream(device_name.as_deref(), volume, status) {
                    Ok((stream, timing, commands)) => {
                        if ready_tx.send(Ok((timing, commands))).is_err() {
                            return;
                        }
                        // Keep the stream alive until asked to close
                        let _ = shutdown_rx.recv();
                        drop(stream);
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                    }
                }
            })?;

        match ready_rx.recv() {
            Ok(Ok((timing, commands))) => Ok(OutputHandle {
                timing,
                commands,
                shutdown: shutdown_tx,
                thread: Some(thread),
            }),
            Ok(Err(e)) => {
                let _ = thread.join();
                self.status.set(DeviceStatus::Error);
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                self.status.set(DeviceStatus::Error);
                Err(EngineError::Unavailable(
                    "audio output thread exited".to_string(),
                ))
            }
        }
    }

    fn find_device(device_name: Option<&str>) -> Result<Device> {
        let manager = AudioDeviceManager::new();
        match device_name {
            Some(name) => manager
                .get_output_device_by_name(name)
                .ok_or_else(|| EngineError::DeviceNotFound(name.to_string())),
            None => manager
                .get_default_output_device()
                .ok_or(EngineError::NoDevice),
        }
    }

    fn start_stream(
        device_name: Option<&str>,
        volume: SharedVolume,
        status: AtomicDeviceStatus,
    ) -> Result<(Stream, AudioTiming, CommandProducer)> {
        let device = Self::find_device(device_name)?;
        let supported_config = device.default_output_config()?;
        let sample_format = supported_config.sample_format();
        let sample_rate = supported_config.sample_rate().0 as f32;
        let channels = supported_config.channels() as usize;
        let config: StreamConfig = supported_config.into();

        info!(
            "Audio device: {} ({} Hz, {} channels, {:?})",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate,
            channels,
            sample_format
        );

        let timing = AudioTiming::new(sample_rate);
        let (command_tx, command_rx) = create_command_channel(COMMAND_RINGBUFFER_CAPACITY);
        let player = ClickPlayer::new(sample_rate);

        let stream = match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32>(
                &device, &config, channels, command_rx, player, timing.clone(), volume, status.clone(),
            ),
            SampleFormat::I16 => Self::build_stream::<i16>(
                &device, &config, channels, command_rx, player, timing.clone(), volume, status.clone(),
            ),
            SampleFormat::U16 => Self::build_stream::<u16>(
                &device, &config, channels, command_rx, player, timing.clone(), volume, status.clone(),
            ),
            other => Err(EngineError::UnsupportedSampleFormat(format!("{:?}", other))),
        }?;

        stream.play()?;
        status.set(DeviceStatus::Connected);

        Ok((stream, timing, command_tx))
    }

    /// Build an output stream for any sample type (f32, i16, u16)
    ///
    /// Clicks are mixed in f32 and converted when written to the device buffer.
    #[allow(clippy::too_many_arguments)]
    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        channels: usize,
        mut command_rx: CommandConsumer,
        mut player: ClickPlayer,
        timing: AudioTiming,
        volume: SharedVolume,
        status: AtomicDeviceStatus,
    ) -> Result<Stream>
    where
        T: SizedSample + FromSample<f32> + Send + 'static,
    {
        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                // No allocations, no I/O, no blocking locks past this point
                while let Some(command) = command_rx.try_pop() {
                    match command {
                        AudioCommand::Click(click) => {
                            // Queue full means the scheduler ran far ahead; drop the click
                            let _ = player.enqueue(click);
                        }
                        AudioCommand::Reset => player.clear(),
                    }
                }

                player.set_volume(volume.get());
                let start = timing.current_sample();
                let mut frames = 0;
                for (i, frame) in data.chunks_mut(channels).enumerate() {
                    let sample = condition(player.render_sample(start + i as u64));
                    write_mono_to_interleaved_frame(sample, frame);
                    frames += 1;
                }
                timing.advance(frames);
            },
            move |err| {
                // Runs outside the audio callback, logging is fine here
                error!("Audio stream error: {}", err);
                status.set(DeviceStatus::Error);
            },
            None,
        )?;

        Ok(stream)
    }
}

impl AudioBackend for CpalBackend {
    fn resume(&self) -> Result<()> {
        {
            let output = lock(&self.output);
            if output.is_some() && self.status.get() == DeviceStatus::Connected {
                return Ok(());
            }
        }
        if self.status.get() == DeviceStatus::Error {
            warn!("Audio output in error state, reopening");
            self.close();
        }

        let handle = self.open()?;
        *lock(&self.output) = Some(handle);
        Ok(())
    }

    fn current_time(&self) -> f64 {
        lock(&self.output)
            .as_ref()
            .map_or(0.0, |output| output.timing.current_seconds())
    }

    fn schedule_click(&self, time: f64, click_type: ClickType) {
        let mut output = lock(&self.output);
        if let Some(output) = output.as_mut() {
            let click = ScheduledClick {
                sample_time: output.timing.seconds_to_samples(time),
                click_type,
            };
            if output.commands.try_push(AudioCommand::Click(click)).is_err() {
                warn!("Click command queue full, dropping click at {:.3}s", time);
            }
        }
    }

    fn set_volume(&self, volume: f32) {
        self.volume.set(volume);
    }
}

impl Drop for CpalBackend {
    fn drop(&mut self) {
        self.close();
    }
}
