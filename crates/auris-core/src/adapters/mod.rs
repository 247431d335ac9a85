//! Concrete implementations of the ports in `crate::ports`. These are the
//! ambient, swappable edges of the system; the composition root wires
//! exactly one of each behind its trait object.

mod encoder_ffmpeg;
mod enhance_template;
mod stt_stub;
mod vad_silero;
mod wake_energy;

pub use encoder_ffmpeg::FfmpegEncoder;
pub use enhance_template::TemplateEnhancer;
pub use stt_stub::StubTranscriber;
pub use vad_silero::SileroVad;
pub use wake_energy::EnergyWakeWord;
