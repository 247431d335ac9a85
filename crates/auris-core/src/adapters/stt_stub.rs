//! Placeholder speech-to-text port implementation.
//!
//! Stands in for a model-backed or cloud backend. Swapping this out for a
//! real transcriber requires no change to `SpeechToTextPort` or its
//! callers.

use std::time::SystemTime;

use crate::error::{AurisError, Result};
use crate::model::{Recording, Transcript};
use crate::ports::SpeechToTextPort;

pub struct StubTranscriber;

impl SpeechToTextPort for StubTranscriber {
    fn transcribe_recording(&self, recording: &Recording) -> Result<Transcript> {
        let path = recording
            .path
            .as_ref()
            .ok_or_else(|| AurisError::InvalidRecording("recording has no path".into()))?;

        let len = std::fs::metadata(path)
            .map_err(|e| AurisError::TranscribeFailed(e.to_string()))?
            .len();

        Ok(Transcript {
            text: format!("[stub transcript: {len} bytes captured]"),
            recording_path: Some(path.clone()),
            generated_at: SystemTime::now(),
        })
    }
}
