//! Manual recorder service (C7): start/stop capture as an independent
//! subscriber of the stream hub.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use tracing::info;

use crate::error::{AurisError, Result};
use crate::hub::StreamHub;
use crate::model::Recording;
use crate::ports::AudioStoragePort;
use crate::registry::RecordingRegistry;

const RECORDER_SUBSCRIBER_NAME: &str = "recorder";
const RECORDER_MAX_FRAMES: usize = 4096;
const CAPTURE_READ_TIMEOUT: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, serde::Serialize)]
pub struct RecordingStarted {
    pub started_at: SystemTime,
    pub max_duration_seconds: f64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RecordingStopped {
    pub recording_id: String,
    pub path: std::path::PathBuf,
    pub captured_at: SystemTime,
}

struct Session {
    started_at: SystemTime,
    stop: Arc<AtomicBool>,
    samples: Arc<Mutex<Vec<f32>>>,
    join: Option<std::thread::JoinHandle<()>>,
}

pub struct RecorderService {
    hub: Arc<StreamHub>,
    encoder: Arc<dyn AudioStoragePort>,
    registry: Arc<RecordingRegistry>,
    max_duration_seconds: f64,
    session: Mutex<Option<Session>>,
}

impl RecorderService {
    pub fn new(
        hub: Arc<StreamHub>,
        encoder: Arc<dyn AudioStoragePort>,
        registry: Arc<RecordingRegistry>,
        max_duration_seconds: f64,
    ) -> Self {
        Self {
            hub,
            encoder,
            registry,
            max_duration_seconds,
            session: Mutex::new(None),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.session.lock().unwrap().is_some()
    }

    pub fn start_recording(&self) -> Result<RecordingStarted> {
        let mut guard = self.session.lock().unwrap();
        if guard.is_some() {
            return Err(AurisError::SessionAlreadyActive);
        }
        if !self.hub.is_running() {
            return Err(AurisError::StreamNotRunning);
        }

        let reader = self
            .hub
            .subscribe(RECORDER_SUBSCRIBER_NAME, Some(RECORDER_MAX_FRAMES));
        let stop = Arc::new(AtomicBool::new(false));
        let samples = Arc::new(Mutex::new(Vec::new()));

        let thread_stop = stop.clone();
        let thread_samples = samples.clone();
        let join = std::thread::spawn(move || {
            while !thread_stop.load(Ordering::SeqCst) {
                if let Some(frame) = reader.read(Some(CAPTURE_READ_TIMEOUT)) {
                    thread_samples.lock().unwrap().extend_from_slice(&frame.data);
                }
            }
            reader.close();
        });

        let started_at = SystemTime::now();
        *guard = Some(Session {
            started_at,
            stop,
            samples,
            join: Some(join),
        });

        info!("recorder session started");
        Ok(RecordingStarted {
            started_at,
            max_duration_seconds: self.max_duration_seconds,
        })
    }

    pub fn stop_recording(&self) -> Result<RecordingStopped> {
        let mut session = {
            let mut guard = self.session.lock().unwrap();
            guard.take().ok_or(AurisError::StreamNotRunning)?
        };

        // The capture loop observes `stop` on its next read, which is bounded
        // by CAPTURE_READ_TIMEOUT, so this join returns well within 5s.
        session.stop.store(true, Ordering::SeqCst);
        if let Some(join) = session.join.take() {
            let _ = join.join();
        }

        let format = self.hub.audio_format();
        let data = std::mem::take(&mut *session.samples.lock().unwrap());
        if data.is_empty() {
            return Err(AurisError::NoAudioCaptured);
        }

        let raw = Recording::raw(data, format, None);
        let persisted = self
            .encoder
            .save_recording(raw)
            .map_err(|e| AurisError::EncodeFailed(e.to_string()))?;

        let recording_id = self.registry.store(persisted.clone())?;
        let path = persisted
            .path
            .clone()
            .ok_or_else(|| AurisError::Internal("encoder returned no path".into()))?;

        info!(recording_id = %recording_id, "recorder session stopped");
        Ok(RecordingStopped {
            recording_id,
            path,
            captured_at: persisted.captured_at,
        })
    }

    pub fn get_recording(&self, id: &str) -> Result<Recording> {
        self.registry.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AudioFormat, AudioFrame, SampleDtype};
    use std::path::PathBuf;

    struct NoopEncoder;
    impl AudioStoragePort for NoopEncoder {
        fn save_recording(&self, mut recording: Recording) -> Result<Recording> {
            recording.path = Some(PathBuf::from("/tmp/auris-recorder-test.ogg"));
            recording.data = None;
            Ok(recording)
        }
    }

    fn format() -> AudioFormat {
        AudioFormat::new(1600, 1, 160, SampleDtype::Float32).unwrap()
    }

    fn harness() -> (Arc<StreamHub>, RecorderService) {
        let hub = Arc::new(StreamHub::new(format()));
        hub.force_running_for_test();
        let recorder = RecorderService::new(
            hub.clone(),
            Arc::new(NoopEncoder),
            Arc::new(RecordingRegistry::new()),
            30.0,
        );
        (hub, recorder)
    }

    #[test]
    fn start_stop_round_trip_persists_captured_audio() {
        let (hub, recorder) = harness();
        recorder.start_recording().expect("starts");
        for seq in 0..3u64 {
            hub.push_test_frame(AudioFrame::new(vec![0.1; 160], format(), seq as u128, seq));
            std::thread::sleep(Duration::from_millis(5));
        }
        let stopped = recorder.stop_recording().expect("stops");
        assert_eq!(stopped.path, PathBuf::from("/tmp/auris-recorder-test.ogg"));
    }

    #[test]
    fn stop_with_no_captured_audio_fails() {
        let (_hub, recorder) = harness();
        recorder.start_recording().expect("starts");
        assert!(matches!(
            recorder.stop_recording(),
            Err(AurisError::NoAudioCaptured)
        ));
    }

    #[test]
    fn double_start_fails_with_session_already_active() {
        let (_hub, recorder) = harness();
        recorder.start_recording().expect("starts");
        assert!(matches!(
            recorder.start_recording(),
            Err(AurisError::SessionAlreadyActive)
        ));
        let _ = recorder.stop_recording();
    }

    #[test]
    fn start_without_running_hub_fails() {
        let hub = Arc::new(StreamHub::new(format()));
        let recorder = RecorderService::new(
            hub,
            Arc::new(NoopEncoder),
            Arc::new(RecordingRegistry::new()),
            30.0,
        );
        assert!(matches!(
            recorder.start_recording(),
            Err(AurisError::StreamNotRunning)
        ));
    }
}
