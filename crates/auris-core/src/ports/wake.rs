use crate::error::Result;
use crate::model::{AudioFrame, WakeEvent};

/// Frame-in, wake-word-detection-out. Stateful across calls; variable-size
/// int16 mono frames.
pub trait WakeWordPort: Send + Sync {
    fn detect(&mut self, frame: &AudioFrame) -> Result<WakeEvent>;

    /// Clear model state only (no accumulator to clear, unlike the VAD port).
    fn reset(&mut self);

    fn active_models(&self) -> &[String];
}
