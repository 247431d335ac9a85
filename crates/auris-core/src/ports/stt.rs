use crate::error::Result;
use crate::model::{Recording, Transcript};

/// Persisted recording in, transcript out.
pub trait SpeechToTextPort: Send + Sync {
    fn transcribe_recording(&self, recording: &Recording) -> Result<Transcript>;
}
