//! Placeholder wake-word port implementation.
//!
//! No Rust wake-word model crate exists in this codebase's dependency
//! ecosystem, so this adapter scores each configured model name by a
//! simple RMS-energy heuristic against a per-model threshold. It fulfils
//! the `WakeWordPort` contract exactly; swapping in a model-backed
//! implementation (e.g. an ONNX-based OpenWakeWord port) requires no
//! change to the trait or its callers.

use std::collections::HashMap;

use crate::error::Result;
use crate::model::{AudioFrame, WakeEvent};
use crate::ports::WakeWordPort;

pub struct EnergyWakeWord {
    models: Vec<String>,
    threshold: f32,
}

impl EnergyWakeWord {
    pub fn new(models: Vec<String>, threshold: f32) -> Self {
        Self { models, threshold }
    }

    fn rms(samples: &[i16]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
        ((sum_sq / samples.len() as f64).sqrt() / i16::MAX as f64) as f32
    }
}

impl WakeWordPort for EnergyWakeWord {
    fn detect(&mut self, frame: &AudioFrame) -> Result<WakeEvent> {
        let energy = Self::rms(&frame.as_mono_int16());
        let scores: HashMap<String, f32> = self
            .models
            .iter()
            .map(|name| (name.clone(), energy))
            .collect();
        let detected = scores.values().any(|&score| score >= self.threshold);
        Ok(WakeEvent { detected, scores })
    }

    fn reset(&mut self) {}

    fn active_models(&self) -> &[String] {
        &self.models
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AudioFormat, AudioFrame, SampleDtype};

    fn frame(samples: Vec<f32>) -> AudioFrame {
        let format = AudioFormat::new(16000, 1, samples.len() as u32, SampleDtype::Float32).unwrap();
        AudioFrame::new(samples, format, 0, 0)
    }

    #[test]
    fn silence_never_detects() {
        let mut wake = EnergyWakeWord::new(vec!["hey-auris".into()], 0.1);
        let event = wake.detect(&frame(vec![0.0; 512])).unwrap();
        assert!(!event.detected);
    }

    #[test]
    fn loud_frame_crosses_threshold() {
        let mut wake = EnergyWakeWord::new(vec!["hey-auris".into()], 0.1);
        let event = wake.detect(&frame(vec![0.9; 512])).unwrap();
        assert!(event.detected);
        assert_eq!(event.scores.len(), 1);
    }

    #[test]
    fn scores_are_reported_per_model() {
        let mut wake = EnergyWakeWord::new(vec!["a".into(), "b".into()], 0.5);
        let event = wake.detect(&frame(vec![0.9; 512])).unwrap();
        assert_eq!(event.scores.len(), 2);
        assert!(event.scores.contains_key("a"));
        assert!(event.scores.contains_key("b"));
    }
}
