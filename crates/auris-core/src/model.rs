//! Canonical data model shared by every component of the pipeline.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::hub::AudioError;

/// Sample representation of a stream, fixed for the lifetime of that
/// stream. Capture and storage are f32-only throughout this crate; the
/// type exists so `AudioFormat`/`Recording` carry it explicitly rather
/// than leaving it implicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleDtype {
    Float32,
}

/// Immutable description of a stream's sample layout.
///
/// A stream has exactly one `AudioFormat` for its lifetime; construction
/// fails rather than producing a format with a non-positive field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub blocksize: u32,
    pub dtype: SampleDtype,
}

impl AudioFormat {
    pub fn new(
        sample_rate: u32,
        channels: u16,
        blocksize: u32,
        dtype: SampleDtype,
    ) -> Result<Self, AudioError> {
        if sample_rate == 0 {
            return Err(AudioError::invalid_format("sample_rate must be positive"));
        }
        if channels == 0 {
            return Err(AudioError::invalid_format("channels must be positive"));
        }
        if blocksize == 0 {
            return Err(AudioError::invalid_format("blocksize must be positive"));
        }
        Ok(Self {
            sample_rate,
            channels,
            blocksize,
            dtype,
        })
    }

    /// Frames produced per second by a device honoring this format.
    pub fn fps(&self) -> f64 {
        self.sample_rate as f64 / self.blocksize as f64
    }
}

/// One chunk of audio as produced by the hub.
///
/// `data` is interleaved samples, `channels` wide, `num_samples` long per
/// channel. Consumers must treat it as read-only; sharing the underlying
/// buffer across subscribers is permitted.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub data: std::sync::Arc<Vec<f32>>,
    pub format: AudioFormat,
    pub timestamp_ns: u128,
    pub sequence: u64,
}

impl AudioFrame {
    pub fn new(data: Vec<f32>, format: AudioFormat, timestamp_ns: u128, sequence: u64) -> Self {
        Self {
            data: std::sync::Arc::new(data),
            format,
            timestamp_ns,
            sequence,
        }
    }

    pub fn num_samples(&self) -> usize {
        self.data.len() / self.format.channels as usize
    }

    pub fn duration_seconds(&self) -> f64 {
        self.num_samples() as f64 / self.format.sample_rate as f64
    }

    /// Mono float32 view in `[-1.0, 1.0]`, averaging channels if interleaved.
    pub fn as_mono_float32(&self) -> Vec<f32> {
        let channels = self.format.channels as usize;
        if channels <= 1 {
            return self.data.as_ref().clone();
        }
        self.data
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    }

    /// Mono int16 view, clipped to `[-1.0, 1.0]` before scaling.
    pub fn as_mono_int16(&self) -> Vec<i16> {
        self.as_mono_float32()
            .into_iter()
            .map(|s| (s.clamp(-1.0, 1.0) * 32767.0).round() as i16)
            .collect()
    }
}

/// An audio recording, either still in memory or already persisted to disk.
///
/// Invariant: at least one of `data`/`path` is set. After encoding, `path`
/// is set and `data` is cleared; clearing `data` while `path` is empty is a
/// programmer error and is prevented by `clear_data`.
#[derive(Debug, Clone)]
pub struct Recording {
    pub data: Option<Vec<f32>>,
    pub path: Option<PathBuf>,
    pub sample_rate: u32,
    pub channels: u16,
    pub dtype: SampleDtype,
    pub blocksize: Option<u32>,
    pub device_name: Option<String>,
    pub captured_at: SystemTime,
}

impl Recording {
    pub fn raw(data: Vec<f32>, format: AudioFormat, device_name: Option<String>) -> Self {
        Self {
            data: Some(data),
            path: None,
            sample_rate: format.sample_rate,
            channels: format.channels,
            dtype: format.dtype,
            blocksize: Some(format.blocksize),
            device_name,
            captured_at: SystemTime::now(),
        }
    }

    /// Canonical id for this recording: the string form of `path`.
    pub fn id(&self) -> Option<String> {
        self.path.as_ref().map(|p| p.to_string_lossy().into_owned())
    }

    /// Release the in-memory buffer. Forbidden unless `path` is set.
    pub fn clear_data(&mut self) -> Result<(), AudioError> {
        if self.path.is_none() {
            return Err(AudioError::invalid_format(
                "cannot clear recording data before a path is set",
            ));
        }
        self.data = None;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub recording_path: Option<PathBuf>,
    pub generated_at: SystemTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub created_at: SystemTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WakeEvent {
    pub detected: bool,
    pub scores: std::collections::HashMap<String, f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VadEvent {
    SpeechStart,
    SpeechEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListenerState {
    Idle,
    Armed,
    Listening,
}

#[derive(Debug, Clone)]
pub enum ListenerEvent {
    StateChange(ListenerState),
    Result {
        recording: Recording,
        transcript: Transcript,
    },
    Error(String),
}

pub(crate) fn now_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
}
