//! Capability contracts the core depends on but does not implement.
//!
//! Each port is a small, named capability reached through `Arc<dyn Trait>`,
//! with every concrete implementation registered once at startup (see
//! `crate::adapters`).

mod encoder;
mod enhance;
mod stt;
mod vad;
mod wake;

pub use encoder::AudioStoragePort;
pub use enhance::TextToTextPort;
pub use stt::SpeechToTextPort;
pub use vad::VadPort;
pub use wake::WakeWordPort;
