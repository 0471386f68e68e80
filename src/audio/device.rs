// Output devices - Enumerate and select CPAL output devices

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host};

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct AudioDeviceInfo {
    pub id: String,
    pub name: String,
    pub is_default: bool,
}

pub struct AudioDeviceManager {
    host: Host,
}

impl AudioDeviceManager {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    /// Name of the audio host in use (ALSA, CoreAudio, WASAPI...)
    pub fn host_name(&self) -> &'static str {
        self.host.id().name()
    }

    /// Every output device the host reports, default device flagged
    pub fn list_output_devices(&self) -> Vec<AudioDeviceInfo> {
        let default_name = self
            .host
            .default_output_device()
            .and_then(|d| d.name().ok())
            .unwrap_or_default();

        match self.host.output_devices() {
            Ok(devices) => devices
                .filter_map(|device| device.name().ok())
                .enumerate()
                .map(|(index, name)| AudioDeviceInfo {
                    id: format!("audio_out_{}", index),
                    is_default: name == default_name,
                    name,
                })
                .collect(),
            Err(e) => {
                log::warn!("Could not enumerate output devices: {}", e);
                Vec::new()
            }
        }
    }

    pub fn get_default_output_device(&self) -> Option<Device> {
        self.host.default_output_device()
    }

    pub fn get_output_device_by_name(&self, device_name: &str) -> Option<Device> {
        self.host
            .output_devices()
            .ok()?
            .find(|device| device.name().is_ok_and(|name| name == device_name))
    }
}

impl Default for AudioDeviceManager {
    fn default() -> Self {
        Self::new()
    }
}
