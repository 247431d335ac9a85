//! Unified error types for auris-core
//!
//! # Error Hierarchy
//!
//! ```text
//! AurisError
//!   ├── Audio(AudioError)   - device, stream and format errors
//!   ├── SessionAlreadyActive
//!   ├── StreamNotRunning
//!   ├── NoAudioCaptured
//!   ├── EncodeFailed
//!   ├── InvalidRecording
//!   ├── NotFound
//!   ├── EmptyTranscript
//!   ├── TranscribeFailed
//!   ├── EnhanceFailed
//!   ├── Io(std::io::Error)
//!   └── Internal(String)
//! ```

pub use crate::hub::AudioError;

/// Top-level error type for auris-core operations.
#[derive(Debug, thiserror::Error)]
pub enum AurisError {
    #[error("audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("a session of this kind is already active")]
    SessionAlreadyActive,

    #[error("the audio stream is not running")]
    StreamNotRunning,

    #[error("no audio was captured for this session")]
    NoAudioCaptured,

    #[error("failed to encode recording: {0}")]
    EncodeFailed(String),

    #[error("recording is invalid: {0}")]
    InvalidRecording(String),

    #[error("no recording found with id {0}")]
    NotFound(String),

    #[error("transcript text is empty")]
    EmptyTranscript,

    #[error("transcription failed: {0}")]
    TranscribeFailed(String),

    #[error("enhancement failed: {0}")]
    EnhanceFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AurisError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Convenience result type using AurisError.
pub type Result<T> = std::result::Result<T, AurisError>;
