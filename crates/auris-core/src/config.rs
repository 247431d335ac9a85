//! Ambient service configuration: a `.env` overlay plus a JSON settings
//! file, every field individually defaulted so a missing or partial file
//! still yields a fully valid configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{AurisError, Result};
use crate::model::{AudioFormat, SampleDtype};

const CONFIG_PATH_ENV: &str = "AURIS_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "./auris.config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_channels")]
    pub channels: u16,
    #[serde(default = "default_blocksize")]
    pub blocksize: u32,
    #[serde(default = "default_dtype")]
    pub dtype: SampleDtype,
}

fn default_sample_rate() -> u32 {
    16_000
}
fn default_channels() -> u16 {
    1
}
fn default_blocksize() -> u32 {
    512
}
fn default_dtype() -> SampleDtype {
    SampleDtype::Float32
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            blocksize: default_blocksize(),
            dtype: default_dtype(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    #[serde(default = "default_max_duration_seconds")]
    pub max_duration_seconds: f64,
}

fn default_max_duration_seconds() -> f64 {
    300.0
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            max_duration_seconds: default_max_duration_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerTuningConfig {
    #[serde(default = "default_wake_threshold")]
    pub wake_threshold: f32,
    #[serde(default)]
    pub wake_models: Vec<String>,
    #[serde(default = "default_vad_threshold")]
    pub vad_threshold: f32,
    #[serde(default = "default_vad_speech_pad_ms")]
    pub vad_speech_pad_ms: f64,
    #[serde(default = "default_armed_timeout_seconds")]
    pub armed_timeout_seconds: f64,
    #[serde(default = "default_max_utterance_seconds")]
    pub max_utterance_seconds: f64,
    #[serde(default = "default_end_hangover_ms")]
    pub end_hangover_ms: f64,
}

fn default_wake_threshold() -> f32 {
    0.5
}
fn default_vad_threshold() -> f32 {
    0.5
}
fn default_vad_speech_pad_ms() -> f64 {
    300.0
}
fn default_armed_timeout_seconds() -> f64 {
    8.0
}
fn default_max_utterance_seconds() -> f64 {
    30.0
}
fn default_end_hangover_ms() -> f64 {
    500.0
}

impl Default for ListenerTuningConfig {
    fn default() -> Self {
        Self {
            wake_threshold: default_wake_threshold(),
            wake_models: vec!["hey-auris".to_string()],
            vad_threshold: default_vad_threshold(),
            vad_speech_pad_ms: default_vad_speech_pad_ms(),
            armed_timeout_seconds: default_armed_timeout_seconds(),
            max_utterance_seconds: default_max_utterance_seconds(),
            end_hangover_ms: default_end_hangover_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderConfig {
    #[serde(default = "default_ffmpeg_bin")]
    pub ffmpeg_bin: String,
    #[serde(default = "default_output_codec")]
    pub output_codec: String,
    #[serde(default = "default_container_ext")]
    pub container_ext: String,
    #[serde(default = "default_tmp_dir")]
    pub tmp_dir: PathBuf,
}

fn default_ffmpeg_bin() -> String {
    "ffmpeg".to_string()
}
fn default_output_codec() -> String {
    "libopus".to_string()
}
fn default_container_ext() -> String {
    "ogg".to_string()
}
fn default_tmp_dir() -> PathBuf {
    std::env::temp_dir().join("auris")
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_bin: default_ffmpeg_bin(),
            output_codec: default_output_codec(),
            container_ext: default_container_ext(),
            tmp_dir: default_tmp_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
    #[serde(default)]
    pub listener: ListenerTuningConfig,
    #[serde(default)]
    pub encoder: EncoderConfig,
}

impl ServiceConfig {
    /// Load `.env`, then a JSON config file named by `AURIS_CONFIG` (falling
    /// back to `./auris.config.json`); a missing file yields defaults.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)?;
        serde_json::from_str(&contents)
            .map_err(|e| AurisError::internal(format!("invalid config at {path:?}: {e}")))
    }

    pub fn audio_format(&self) -> Result<AudioFormat> {
        AudioFormat::new(
            self.audio.sample_rate,
            self.audio.channels,
            self.audio.blocksize,
            self.audio.dtype,
        )
        .map_err(AurisError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_produces_a_valid_audio_format() {
        let config = ServiceConfig::default();
        let format = config.audio_format().unwrap();
        assert_eq!(format.sample_rate, 16_000);
        assert_eq!(format.channels, 1);
    }

    #[test]
    fn partial_json_fills_in_missing_fields_from_defaults() {
        let partial: ServiceConfig = serde_json::from_str(r#"{"listener": {"wake_threshold": 0.9}}"#).unwrap();
        assert_eq!(partial.listener.wake_threshold, 0.9);
        // Everything else in `listener`, and every other section, falls back.
        assert_eq!(partial.listener.armed_timeout_seconds, default_armed_timeout_seconds());
        assert_eq!(partial.audio.sample_rate, default_sample_rate());
        assert_eq!(partial.encoder.ffmpeg_bin, default_ffmpeg_bin());
    }

    #[test]
    fn empty_json_object_is_equivalent_to_defaults() {
        let from_empty: ServiceConfig = serde_json::from_str("{}").unwrap();
        let defaults = ServiceConfig::default();
        assert_eq!(from_empty.audio.sample_rate, defaults.audio.sample_rate);
        assert_eq!(
            from_empty.recording.max_duration_seconds,
            defaults.recording.max_duration_seconds
        );
    }
}
