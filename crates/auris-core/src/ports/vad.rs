use crate::error::Result;
use crate::model::{AudioFrame, VadEvent};

/// Frame-in, optional speech-start/speech-end transition out.
///
/// Implementations hide the underlying detector's fixed 512-sample frame
/// requirement: `process` accepts any frame size, buffers the mono-float32
/// view internally, and reports the transition produced by the complete
/// 512-sample chunks consumed from this call. `speech_end` is sticky: it is
/// never shadowed by a later `speech_start` produced in the same call.
pub trait VadPort: Send + Sync {
    fn process(&mut self, frame: &AudioFrame) -> Result<Option<VadEvent>>;

    /// Clear model state *and* the sample accumulator.
    fn reset(&mut self);

    /// The detector's required chunk size, in samples.
    fn required_frame_size(&self) -> usize;
}
