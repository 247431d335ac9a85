//! Input device enumeration and selection.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::Device;

use super::error::AudioError;

#[derive(Debug, Clone)]
pub struct AudioDeviceInfo {
    pub name: String,
    pub is_default: bool,
}

pub fn list_input_devices() -> Result<Vec<AudioDeviceInfo>, AudioError> {
    let host = cpal::default_host();
    let default_name = host
        .default_input_device()
        .and_then(|d| d.name().ok());

    let devices = host
        .input_devices()
        .map_err(AudioError::from)?
        .filter_map(|d| {
            let name = d.name().ok()?;
            let is_default = default_name.as_deref() == Some(name.as_str());
            Some(AudioDeviceInfo { name, is_default })
        })
        .collect();
    Ok(devices)
}

/// Select the capture device per the device-selection policy: prefer the
/// first input whose name contains "monitor"; otherwise the default input;
/// otherwise the first input with at least one input channel.
pub fn select_input_device() -> Result<Device, AudioError> {
    let host = cpal::default_host();
    let mut inputs: Vec<Device> = host
        .input_devices()
        .map_err(AudioError::from)?
        .collect();

    if let Some(monitor) = inputs.iter().find(|d| {
        d.name()
            .map(|n| n.to_lowercase().contains("monitor"))
            .unwrap_or(false)
    }) {
        return Ok(monitor.clone());
    }

    if let Some(default) = host.default_input_device() {
        return Ok(default);
    }

    if let Some(first) = inputs.iter().position(|d| {
        d.supported_input_configs()
            .map(|mut cfgs| cfgs.next().is_some())
            .unwrap_or(false)
    }) {
        return Ok(inputs.remove(first));
    }

    Err(AudioError::device_error("no input device available"))
}
