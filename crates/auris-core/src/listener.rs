//! Listener state machine (C8): IDLE -> ARMED -> LISTENING -> IDLE, driven
//! by the wake-word and VAD ports over frames read from the hub.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant, SystemTime};

use tracing::{info, warn};

use crate::error::{AurisError, Result};
use crate::hub::StreamHub;
use crate::model::{AudioFrame, ListenerEvent, ListenerState, Recording};
use crate::ports::{AudioStoragePort, SpeechToTextPort, VadPort, WakeWordPort};
use crate::registry::RecordingRegistry;

const LISTENER_SUBSCRIBER_NAME: &str = "listener";
const LISTENER_MAX_FRAMES: usize = 4096;
const READ_TIMEOUT: Duration = Duration::from_millis(100);
/// Exceeds the worst-case concurrent utterance count (typically 1); only
/// `state_change` events are ever dropped to make room under this cap.
const EVENT_QUEUE_CAPACITY: usize = 16;

#[derive(Clone, Copy, Debug)]
pub struct ListenerConfig {
    pub armed_timeout_seconds: f64,
    pub max_utterance_seconds: f64,
    pub vad_speech_pad_ms: f64,
    pub end_hangover_ms: f64,
}

struct EventQueue {
    events: Mutex<VecDeque<ListenerEvent>>,
    available: Condvar,
}

impl EventQueue {
    fn new() -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    fn push_state_change(&self, event: ListenerEvent) {
        let mut q = self.events.lock().unwrap();
        q.push_back(event);
        while q.len() > EVENT_QUEUE_CAPACITY {
            q.pop_front();
        }
        self.available.notify_one();
    }

    /// `result`/`error` events must always be delivered.
    fn push_reliable(&self, event: ListenerEvent) {
        let mut q = self.events.lock().unwrap();
        q.push_back(event);
        self.available.notify_one();
    }
}

/// Read-side handle for a listener session's event stream.
pub struct EventReader {
    queue: Arc<EventQueue>,
}

impl EventReader {
    pub fn read(&self, timeout: Duration) -> Option<ListenerEvent> {
        let mut q = self.queue.events.lock().unwrap();
        if let Some(event) = q.pop_front() {
            return Some(event);
        }
        let (guard, _) = self.queue.available.wait_timeout(q, timeout).unwrap();
        q = guard;
        q.pop_front()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ListenerStarted {
    pub state: ListenerState,
    pub started_at: SystemTime,
}

struct Session {
    stop: Arc<AtomicBool>,
    state: Arc<Mutex<ListenerState>>,
    join: Option<std::thread::JoinHandle<()>>,
}

pub struct ListenerService {
    hub: Arc<StreamHub>,
    wake: Arc<Mutex<Box<dyn WakeWordPort>>>,
    vad: Arc<Mutex<Box<dyn VadPort>>>,
    encoder: Arc<dyn AudioStoragePort>,
    stt: Arc<dyn SpeechToTextPort>,
    registry: Arc<RecordingRegistry>,
    config: ListenerConfig,
    queue: Arc<EventQueue>,
    session: Mutex<Option<Session>>,
}

impl ListenerService {
    pub fn new(
        hub: Arc<StreamHub>,
        wake: Box<dyn WakeWordPort>,
        vad: Box<dyn VadPort>,
        encoder: Arc<dyn AudioStoragePort>,
        stt: Arc<dyn SpeechToTextPort>,
        registry: Arc<RecordingRegistry>,
        config: ListenerConfig,
    ) -> Self {
        Self {
            hub,
            wake: Arc::new(Mutex::new(wake)),
            vad: Arc::new(Mutex::new(vad)),
            encoder,
            stt,
            registry,
            config,
            queue: Arc::new(EventQueue::new()),
            session: Mutex::new(None),
        }
    }

    pub fn is_listening(&self) -> bool {
        self.session.lock().unwrap().is_some()
    }

    pub fn state(&self) -> ListenerState {
        self.session
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| *s.state.lock().unwrap())
            .unwrap_or(ListenerState::Idle)
    }

    /// A handle to this listener's event stream. Valid across any number of
    /// start/stop cycles; obtain once and hold for the life of the process.
    pub fn events(&self) -> EventReader {
        EventReader {
            queue: self.queue.clone(),
        }
    }

    /// Start the state machine.
    pub fn start(&self) -> Result<ListenerStarted> {
        let mut guard = self.session.lock().unwrap();
        if guard.is_some() {
            return Err(AurisError::SessionAlreadyActive);
        }
        if !self.hub.is_running() {
            return Err(AurisError::StreamNotRunning);
        }

        let reader = self
            .hub
            .subscribe(LISTENER_SUBSCRIBER_NAME, Some(LISTENER_MAX_FRAMES));
        let stop = Arc::new(AtomicBool::new(false));
        let state = Arc::new(Mutex::new(ListenerState::Idle));
        let queue = self.queue.clone();

        let fps = self.hub.audio_format().fps();
        let pre_roll_max =
            (((self.config.vad_speech_pad_ms / 1000.0 * fps).round() as i64) + 5).max(1) as usize;
        let hangover_max =
            ((self.config.end_hangover_ms / 1000.0 * fps).round() as i64).max(1) as usize;
        let max_utterance_frames =
            ((self.config.max_utterance_seconds * fps).round() as i64).max(1) as usize;

        let worker = Worker {
            hub: self.hub.clone(),
            reader,
            stop: stop.clone(),
            state: state.clone(),
            queue: queue.clone(),
            wake: self.wake.clone(),
            vad: self.vad.clone(),
            encoder: self.encoder.clone(),
            stt: self.stt.clone(),
            registry: self.registry.clone(),
            armed_timeout: Duration::from_secs_f64(self.config.armed_timeout_seconds.max(0.0)),
            pre_roll_max,
            hangover_max,
            max_utterance_frames,
        };

        let join = std::thread::spawn(move || worker.run());

        let started_at = SystemTime::now();
        *guard = Some(Session {
            stop,
            state,
            join: Some(join),
        });

        info!("listener session started");
        Ok(ListenerStarted {
            state: ListenerState::Idle,
            started_at,
        })
    }

    /// Signal the loop, wait for it to exit, and reset to IDLE. No events
    /// are emitted after this call returns.
    pub fn stop(&self) -> Result<()> {
        let mut session = {
            let mut guard = self.session.lock().unwrap();
            guard.take().ok_or(AurisError::StreamNotRunning)?
        };
        session.stop.store(true, Ordering::SeqCst);
        if let Some(join) = session.join.take() {
            let _ = join.join();
        }
        Ok(())
    }
}

struct Worker {
    hub: Arc<StreamHub>,
    reader: crate::hub::Reader,
    stop: Arc<AtomicBool>,
    state: Arc<Mutex<ListenerState>>,
    queue: Arc<EventQueue>,
    wake: Arc<Mutex<Box<dyn WakeWordPort>>>,
    vad: Arc<Mutex<Box<dyn VadPort>>>,
    encoder: Arc<dyn AudioStoragePort>,
    stt: Arc<dyn SpeechToTextPort>,
    registry: Arc<RecordingRegistry>,
    armed_timeout: Duration,
    pre_roll_max: usize,
    hangover_max: usize,
    max_utterance_frames: usize,
}

impl Worker {
    fn set_state(&self, new_state: ListenerState) {
        *self.state.lock().unwrap() = new_state;
        self.queue
            .push_state_change(ListenerEvent::StateChange(new_state));
    }

    fn reset_detectors(&self) {
        self.wake.lock().unwrap().reset();
        self.vad.lock().unwrap().reset();
    }

    fn run(self) {
        let mut pre_roll: VecDeque<AudioFrame> = VecDeque::new();
        let mut utterance: Vec<AudioFrame> = Vec::new();
        let mut hangover: Vec<AudioFrame> = Vec::new();
        let mut in_hangover = false;
        let mut armed_at: Option<Instant> = None;

        loop {
            if self.stop.load(Ordering::SeqCst) {
                break;
            }
            let frame = match self.reader.read(Some(READ_TIMEOUT)) {
                Some(f) => f,
                None => continue,
            };

            let current = *self.state.lock().unwrap();
            match current {
                ListenerState::Idle => {
                    let wake_event = match self.wake.lock().unwrap().detect(&frame) {
                        Ok(e) => e,
                        Err(err) => {
                            warn!(error = %err, "wake-word detection failed");
                            continue;
                        }
                    };
                    if wake_event.detected {
                        self.vad.lock().unwrap().reset();
                        pre_roll.clear();
                        armed_at = Some(Instant::now());
                        self.set_state(ListenerState::Armed);
                    }
                }
                ListenerState::Armed => {
                    if let Some(started) = armed_at {
                        if started.elapsed() > self.armed_timeout {
                            self.reset_detectors();
                            pre_roll.clear();
                            armed_at = None;
                            self.set_state(ListenerState::Idle);
                            continue;
                        }
                    }
                    let vad_event = match self.vad.lock().unwrap().process(&frame) {
                        Ok(e) => e,
                        Err(err) => {
                            warn!(error = %err, "vad processing failed");
                            continue;
                        }
                    };
                    if vad_event == Some(crate::model::VadEvent::SpeechStart) {
                        utterance = pre_roll.drain(..).collect();
                        utterance.push(frame);
                        in_hangover = false;
                        hangover.clear();
                        armed_at = None;
                        self.set_state(ListenerState::Listening);
                    } else {
                        pre_roll.push_back(frame);
                        while pre_roll.len() > self.pre_roll_max {
                            pre_roll.pop_front();
                        }
                    }
                }
                ListenerState::Listening => {
                    if in_hangover {
                        hangover.push(frame);
                        if hangover.len() >= self.hangover_max {
                            utterance.append(&mut hangover);
                            self.finalize(std::mem::take(&mut utterance));
                            in_hangover = false;
                            self.reset_detectors();
                            self.set_state(ListenerState::Idle);
                        }
                        continue;
                    }

                    let vad_event = match self.vad.lock().unwrap().process(&frame) {
                        Ok(e) => e,
                        Err(err) => {
                            warn!(error = %err, "vad processing failed");
                            continue;
                        }
                    };
                    if vad_event == Some(crate::model::VadEvent::SpeechEnd) {
                        in_hangover = true;
                        hangover.clear();
                        hangover.push(frame);
                    } else {
                        utterance.push(frame);
                    }

                    if utterance.len() >= self.max_utterance_frames {
                        self.finalize(std::mem::take(&mut utterance));
                        in_hangover = false;
                        hangover.clear();
                        self.reset_detectors();
                        self.set_state(ListenerState::Idle);
                    }
                }
            }
        }

        self.reader.close();
    }

    fn finalize(&self, utterance: Vec<AudioFrame>) {
        let format = self.hub.audio_format();
        let mut samples = Vec::new();
        for frame in &utterance {
            samples.extend_from_slice(&frame.data);
        }
        if samples.is_empty() {
            self.queue.push_reliable(ListenerEvent::Error(
                "no audio captured for utterance".into(),
            ));
            return;
        }

        let raw = Recording::raw(samples, format, None);
        let persisted = match self.encoder.save_recording(raw) {
            Ok(r) => r,
            Err(err) => {
                self.queue.push_reliable(ListenerEvent::Error(err.to_string()));
                return;
            }
        };

        if let Err(err) = self.registry.store(persisted.clone()) {
            self.queue.push_reliable(ListenerEvent::Error(err.to_string()));
            return;
        }

        match self.stt.transcribe_recording(&persisted) {
            Ok(transcript) => self.queue.push_reliable(ListenerEvent::Result {
                recording: persisted,
                transcript,
            }),
            Err(err) => self.queue.push_reliable(ListenerEvent::Error(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque as Deque;
    use std::path::PathBuf;

    use crate::model::{SampleDtype, VadEvent, WakeEvent};
    use crate::ports::{AudioStoragePort, SpeechToTextPort, VadPort, WakeWordPort};

    struct ScriptedWake {
        script: Deque<bool>,
    }
    impl WakeWordPort for ScriptedWake {
        fn detect(&mut self, _frame: &AudioFrame) -> Result<WakeEvent> {
            Ok(WakeEvent {
                detected: self.script.pop_front().unwrap_or(false),
                scores: Default::default(),
            })
        }
        fn reset(&mut self) {}
        fn active_models(&self) -> &[String] {
            &[]
        }
    }

    struct ScriptedVad {
        script: Deque<Option<VadEvent>>,
    }
    impl VadPort for ScriptedVad {
        fn process(&mut self, _frame: &AudioFrame) -> Result<Option<VadEvent>> {
            Ok(self.script.pop_front().flatten())
        }
        fn reset(&mut self) {}
        fn required_frame_size(&self) -> usize {
            1
        }
    }

    struct NoopEncoder;
    impl AudioStoragePort for NoopEncoder {
        fn save_recording(&self, mut recording: Recording) -> Result<Recording> {
            recording.path = Some(PathBuf::from(format!(
                "/tmp/auris-test-{}.raw",
                recording.data.as_ref().map(|d| d.len()).unwrap_or(0)
            )));
            recording.data = None;
            Ok(recording)
        }
    }

    struct FixedStt;
    impl SpeechToTextPort for FixedStt {
        fn transcribe_recording(&self, _recording: &Recording) -> Result<crate::model::Transcript> {
            Ok(crate::model::Transcript {
                text: "hello world".into(),
                recording_path: None,
                generated_at: SystemTime::now(),
            })
        }
    }

    fn format() -> AudioFormat {
        AudioFormat::new(1600, 1, 160, SampleDtype::Float32).unwrap()
    }

    fn frame(sequence: u64) -> AudioFrame {
        AudioFrame::new(vec![0.1; 160], format(), sequence as u128, sequence)
    }

    fn service(
        hub: Arc<StreamHub>,
        wake_script: Vec<bool>,
        vad_script: Vec<Option<VadEvent>>,
    ) -> ListenerService {
        hub.force_running_for_test();
        ListenerService::new(
            hub,
            Box::new(ScriptedWake { script: wake_script.into() }),
            Box::new(ScriptedVad { script: vad_script.into() }),
            Arc::new(NoopEncoder),
            Arc::new(FixedStt),
            Arc::new(RecordingRegistry::new()),
            ListenerConfig {
                armed_timeout_seconds: 5.0,
                max_utterance_seconds: 100.0,
                vad_speech_pad_ms: 0.0,
                end_hangover_ms: 100.0,
            },
        )
    }

    fn drain_events(reader: &EventReader, timeout: Duration) -> Vec<ListenerEvent> {
        let mut events = Vec::new();
        while let Some(event) = reader.read(timeout) {
            events.push(event);
        }
        events
    }

    #[test]
    fn full_utterance_cycle_produces_result_and_returns_to_idle() {
        let hub = Arc::new(StreamHub::new(format()));
        let wake_script = vec![false, true];
        let vad_script = vec![
            None,                         // armed, buffered into pre-roll
            None,                         // armed, buffered into pre-roll
            Some(VadEvent::SpeechStart),  // armed -> listening
            None,                         // listening, accumulate
            Some(VadEvent::SpeechEnd),    // listening -> hangover
        ];
        let svc = service(hub.clone(), wake_script, vad_script);
        let reader = svc.events();

        svc.start().expect("listener starts");
        for seq in 0..8u64 {
            hub.push_test_frame(frame(seq));
            std::thread::sleep(Duration::from_millis(5));
        }

        let events = drain_events(&reader, Duration::from_millis(500));
        let states: Vec<ListenerState> = events
            .iter()
            .filter_map(|e| match e {
                ListenerEvent::StateChange(s) => Some(*s),
                _ => None,
            })
            .collect();
        assert_eq!(
            states,
            vec![ListenerState::Armed, ListenerState::Listening, ListenerState::Idle]
        );
        assert!(events.iter().any(|e| matches!(e, ListenerEvent::Result { .. })));

        svc.stop().expect("listener stops");
    }

    #[test]
    fn start_twice_fails_with_session_already_active() {
        let hub = Arc::new(StreamHub::new(format()));
        let svc = service(hub, vec![], vec![]);
        svc.start().expect("first start succeeds");
        assert!(matches!(svc.start(), Err(AurisError::SessionAlreadyActive)));
        svc.stop().unwrap();
    }

    #[test]
    fn start_without_running_hub_fails() {
        let hub = Arc::new(StreamHub::new(format()));
        // Deliberately not calling force_running_for_test.
        let svc = ListenerService::new(
            hub,
            Box::new(ScriptedWake { script: Deque::new() }),
            Box::new(ScriptedVad { script: Deque::new() }),
            Arc::new(NoopEncoder),
            Arc::new(FixedStt),
            Arc::new(RecordingRegistry::new()),
            ListenerConfig {
                armed_timeout_seconds: 5.0,
                max_utterance_seconds: 100.0,
                vad_speech_pad_ms: 0.0,
                end_hangover_ms: 100.0,
            },
        );
        assert!(matches!(svc.start(), Err(AurisError::StreamNotRunning)));
    }

    #[test]
    fn stop_without_active_session_fails() {
        let hub = Arc::new(StreamHub::new(format()));
        let svc = service(hub, vec![], vec![]);
        assert!(matches!(svc.stop(), Err(AurisError::StreamNotRunning)));
    }
}
