//! Core audio capture and transcription pipeline: stream hub, listener
//! state machine, manual recorder, and the ports each is built against.

pub mod adapters;
pub mod config;
pub mod enhancement;
pub mod error;
pub mod hub;
pub mod listener;
pub mod model;
pub mod ports;
pub mod recorder;
pub mod registry;
pub mod transcription;

pub use config::ServiceConfig;
pub use enhancement::EnhancementService;
pub use error::{AurisError, Result};
pub use hub::StreamHub;
pub use listener::{ListenerConfig, ListenerService, ListenerStarted};
pub use model::{
    AudioFormat, AudioFrame, ListenerEvent, ListenerState, Note, Recording, SampleDtype,
    Transcript, VadEvent, WakeEvent,
};
pub use ports::{AudioStoragePort, SpeechToTextPort, TextToTextPort, VadPort, WakeWordPort};
pub use recorder::{RecorderService, RecordingStarted, RecordingStopped};
pub use registry::RecordingRegistry;
pub use transcription::TranscriptionService;
