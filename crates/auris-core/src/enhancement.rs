//! Enhancement service (C10): a thin adapter over the text-to-text port
//! enforcing preconditions the port itself does not.

use std::sync::Arc;

use crate::error::{AurisError, Result};
use crate::model::Note;
use crate::ports::TextToTextPort;

pub struct EnhancementService {
    enhancer: Arc<dyn TextToTextPort>,
}

impl EnhancementService {
    pub fn new(enhancer: Arc<dyn TextToTextPort>) -> Self {
        Self { enhancer }
    }

    pub fn enhance(&self, text: &str) -> Result<Note> {
        if text.trim().is_empty() {
            return Err(AurisError::EmptyTranscript);
        }
        self.enhancer.enhance(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    struct FixedEnhancer;
    impl TextToTextPort for FixedEnhancer {
        fn enhance(&self, text: &str) -> Result<Note> {
            Ok(Note {
                title: text.chars().take(10).collect(),
                body: text.to_string(),
                tags: vec!["note".into(), "voice".into(), "auto".into()],
                created_at: SystemTime::now(),
            })
        }
    }

    #[test]
    fn empty_text_is_rejected_before_reaching_the_port() {
        let service = EnhancementService::new(Arc::new(FixedEnhancer));
        assert!(matches!(
            service.enhance("   "),
            Err(AurisError::EmptyTranscript)
        ));
    }

    #[test]
    fn non_empty_text_is_enhanced() {
        let service = EnhancementService::new(Arc::new(FixedEnhancer));
        let note = service.enhance("buy milk tomorrow").unwrap();
        assert_eq!(note.body, "buy milk tomorrow");
        assert!(note.tags.len() >= 3 && note.tags.len() <= 5);
    }
}
