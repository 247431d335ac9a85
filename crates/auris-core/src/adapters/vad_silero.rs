//! VAD port implementation wrapping the Silero model via `voice_activity_detector`.

use voice_activity_detector::VoiceActivityDetector;

use crate::error::{AurisError, Result};
use crate::model::{AudioFrame, VadEvent};
use crate::ports::VadPort;

/// The underlying detector requires exactly this many samples per call, at
/// 16 kHz.
pub const VAD_CHUNK_SIZE: usize = 512;
const VAD_SAMPLE_RATE: i64 = 16_000;

pub struct SileroVad {
    detector: VoiceActivityDetector,
    threshold: f32,
    accumulator: Vec<f32>,
    is_speaking: bool,
}

impl SileroVad {
    pub fn new(threshold: f32) -> Result<Self> {
        let detector = VoiceActivityDetector::builder()
            .sample_rate(VAD_SAMPLE_RATE)
            .chunk_size(VAD_CHUNK_SIZE)
            .build()
            .map_err(|e| AurisError::internal(format!("failed to build VAD detector: {e}")))?;

        Ok(Self {
            detector,
            threshold: threshold.clamp(0.0, 1.0),
            accumulator: Vec::with_capacity(VAD_CHUNK_SIZE * 2),
            is_speaking: false,
        })
    }
}

impl VadPort for SileroVad {
    fn process(&mut self, frame: &AudioFrame) -> Result<Option<VadEvent>> {
        self.accumulator.extend(frame.as_mono_float32());

        let mut last_event = None;
        while self.accumulator.len() >= VAD_CHUNK_SIZE {
            let chunk: Vec<f32> = self.accumulator.drain(..VAD_CHUNK_SIZE).collect();
            let probability = self.detector.predict(chunk.iter().copied());
            let is_voice = probability >= self.threshold;

            let event = match (self.is_speaking, is_voice) {
                (false, true) => {
                    self.is_speaking = true;
                    Some(VadEvent::SpeechStart)
                }
                (true, false) => {
                    self.is_speaking = false;
                    Some(VadEvent::SpeechEnd)
                }
                _ => None,
            };

            if let Some(event) = event {
                // speech_end is sticky: once seen in this call, it is never
                // shadowed by a later speech_start produced from the same call.
                if last_event != Some(VadEvent::SpeechEnd) {
                    last_event = Some(event);
                }
            }
        }

        Ok(last_event)
    }

    fn reset(&mut self) {
        self.accumulator.clear();
        self.is_speaking = false;
    }

    fn required_frame_size(&self) -> usize {
        VAD_CHUNK_SIZE
    }
}
