//! Errors raised by audio format validation and the stream hub's device layer.

use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("invalid audio format: {0}")]
    InvalidFormat(String),

    #[error("audio device error: {0}")]
    DeviceError(String),
}

impl AudioError {
    pub fn invalid_format(msg: impl fmt::Display) -> Self {
        Self::InvalidFormat(msg.to_string())
    }

    pub fn device_error(msg: impl fmt::Display) -> Self {
        Self::DeviceError(msg.to_string())
    }
}

impl From<cpal::BuildStreamError> for AudioError {
    fn from(err: cpal::BuildStreamError) -> Self {
        AudioError::DeviceError(err.to_string())
    }
}

impl From<cpal::PlayStreamError> for AudioError {
    fn from(err: cpal::PlayStreamError) -> Self {
        AudioError::DeviceError(err.to_string())
    }
}

impl From<cpal::DevicesError> for AudioError {
    fn from(err: cpal::DevicesError) -> Self {
        AudioError::DeviceError(err.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for AudioError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        AudioError::DeviceError(err.to_string())
    }
}
