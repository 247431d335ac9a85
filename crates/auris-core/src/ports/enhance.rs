use crate::error::Result;
use crate::model::Note;

/// Transcript text in, a titled `Note` out. Implementations must return
/// `tags` whose length is within `[3, 5]`.
pub trait TextToTextPort: Send + Sync {
    fn enhance(&self, text: &str) -> Result<Note>;
}
