//! Recording registry (C11): the one long-lived mutable singleton in the
//! core. Owned by the recorder service; other components reach it only
//! through that owner.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{AurisError, Result};
use crate::model::Recording;

#[derive(Default)]
pub struct RecordingRegistry {
    recordings: Mutex<HashMap<String, Recording>>,
}

impl RecordingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a persisted recording under its canonical id. Returns the
    /// id it was stored under.
    pub fn store(&self, recording: Recording) -> Result<String> {
        let id = recording
            .id()
            .ok_or_else(|| AurisError::InvalidRecording("recording has no path".into()))?;
        self.recordings.lock().unwrap().insert(id.clone(), recording);
        Ok(id)
    }

    /// Defensive-copy read: repeated calls with no intervening mutation
    /// return an equal value.
    pub fn get(&self, id: &str) -> Result<Recording> {
        self.recordings
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| AurisError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AudioFormat, SampleDtype};
    use std::path::PathBuf;

    fn persisted(path: &str) -> Recording {
        let format = AudioFormat::new(16000, 1, 512, SampleDtype::Float32).unwrap();
        let mut recording = Recording::raw(vec![0.0; 512], format, None);
        recording.path = Some(PathBuf::from(path));
        recording.data = None;
        recording
    }

    #[test]
    fn store_then_get_round_trips() {
        let registry = RecordingRegistry::new();
        let id = registry.store(persisted("/tmp/a.ogg")).unwrap();
        let fetched = registry.get(&id).unwrap();
        assert_eq!(fetched.path, Some(PathBuf::from("/tmp/a.ogg")));
    }

    #[test]
    fn get_unknown_id_is_not_found() {
        let registry = RecordingRegistry::new();
        assert!(matches!(
            registry.get("missing"),
            Err(AurisError::NotFound(_))
        ));
    }

    #[test]
    fn storing_without_a_path_is_rejected() {
        let format = AudioFormat::new(16000, 1, 512, SampleDtype::Float32).unwrap();
        let registry = RecordingRegistry::new();
        let in_memory = Recording::raw(vec![0.0; 512], format, None);
        assert!(matches!(
            registry.store(in_memory),
            Err(AurisError::InvalidRecording(_))
        ));
    }

    #[test]
    fn repeated_get_is_idempotent() {
        let registry = RecordingRegistry::new();
        let id = registry.store(persisted("/tmp/b.ogg")).unwrap();
        let first = registry.get(&id).unwrap();
        let second = registry.get(&id).unwrap();
        assert_eq!(first.path, second.path);
    }
}
