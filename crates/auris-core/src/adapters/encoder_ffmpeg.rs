//! Encoder port implementation that pipes raw samples to an `ffmpeg`
//! subprocess over stdin, rather than writing an intermediate WAV file
//! first.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::error::{AurisError, Result};
use crate::model::Recording;
use crate::ports::AudioStoragePort;

pub struct FfmpegEncoder {
    ffmpeg_bin: String,
    output_codec: String,
    container_ext: String,
    tmp_dir: PathBuf,
}

impl FfmpegEncoder {
    pub fn new(
        ffmpeg_bin: impl Into<String>,
        output_codec: impl Into<String>,
        container_ext: impl Into<String>,
        tmp_dir: PathBuf,
    ) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
            output_codec: output_codec.into(),
            container_ext: container_ext.into(),
            tmp_dir,
        }
    }

}

impl AudioStoragePort for FfmpegEncoder {
    fn save_recording(&self, mut recording: Recording) -> Result<Recording> {
        let data = recording
            .data
            .take()
            .ok_or_else(|| AurisError::InvalidRecording("recording has no in-memory data".into()))?;

        let out_path = self
            .tmp_dir
            .join(format!("rec-{}.{}", uuid::Uuid::new_v4().simple(), self.container_ext));

        let mut child = Command::new(&self.ffmpeg_bin)
            .args([
                "-y",
                "-f",
                "f32le",
                "-ar",
                &recording.sample_rate.to_string(),
                "-ac",
                &recording.channels.to_string(),
                "-i",
                "pipe:0",
                "-c:a",
                &self.output_codec,
            ])
            .arg(&out_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AurisError::EncodeFailed(format!("failed to spawn ffmpeg: {e}")))?;

        {
            let stdin = child
                .stdin
                .as_mut()
                .ok_or_else(|| AurisError::EncodeFailed("ffmpeg stdin unavailable".into()))?;
            for &sample in &data {
                stdin
                    .write_all(&sample.to_le_bytes())
                    .map_err(|e| AurisError::EncodeFailed(format!("failed to write to ffmpeg stdin: {e}")))?;
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| AurisError::EncodeFailed(format!("failed to wait on ffmpeg: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            return Err(AurisError::EncodeFailed(stderr));
        }

        recording.path = Some(out_path);
        recording.clear_data().map_err(AurisError::from)?;
        Ok(recording)
    }
}
