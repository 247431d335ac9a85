//! Transcription service (C9): a thin adapter over the STT port enforcing
//! preconditions the port itself does not.

use std::sync::Arc;

use crate::error::{AurisError, Result};
use crate::model::{Recording, Transcript};
use crate::ports::SpeechToTextPort;

pub struct TranscriptionService {
    stt: Arc<dyn SpeechToTextPort>,
}

impl TranscriptionService {
    pub fn new(stt: Arc<dyn SpeechToTextPort>) -> Self {
        Self { stt }
    }

    pub fn transcribe(&self, recording: &Recording) -> Result<Transcript> {
        if recording.data.is_none() && recording.path.is_none() {
            return Err(AurisError::InvalidRecording(
                "recording has neither in-memory data nor a path".into(),
            ));
        }

        let mut transcript = self.stt.transcribe_recording(recording)?;
        if transcript.recording_path.is_none() {
            transcript.recording_path = recording.path.clone();
        }
        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AudioFormat, SampleDtype};
    use std::path::PathBuf;
    use std::time::SystemTime;

    struct FixedStt;
    impl SpeechToTextPort for FixedStt {
        fn transcribe_recording(&self, _recording: &Recording) -> Result<Transcript> {
            Ok(Transcript {
                text: "hello".into(),
                recording_path: None,
                generated_at: SystemTime::now(),
            })
        }
    }

    fn format() -> AudioFormat {
        AudioFormat::new(16000, 1, 512, SampleDtype::Float32).unwrap()
    }

    #[test]
    fn fills_in_recording_path_when_port_omits_it() {
        let service = TranscriptionService::new(Arc::new(FixedStt));
        let mut recording = Recording::raw(vec![0.0; 512], format(), None);
        recording.path = Some(PathBuf::from("/tmp/c.ogg"));
        recording.data = None;
        let transcript = service.transcribe(&recording).unwrap();
        assert_eq!(transcript.recording_path, Some(PathBuf::from("/tmp/c.ogg")));
    }

    #[test]
    fn rejects_recording_with_neither_data_nor_path() {
        let service = TranscriptionService::new(Arc::new(FixedStt));
        let mut recording = Recording::raw(vec![0.0; 512], format(), None);
        recording.data = None;
        recording.path = None;
        assert!(matches!(
            service.transcribe(&recording),
            Err(AurisError::InvalidRecording(_))
        ));
    }
}
