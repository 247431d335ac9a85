use crate::error::Result;
use crate::model::Recording;

/// In-memory recording in, persisted recording out.
///
/// `save_recording` must return a recording whose `path` is set and whose
/// `data` has been released. The core is agnostic to container and codec;
/// implementations may shell out to an external subprocess.
pub trait AudioStoragePort: Send + Sync {
    fn save_recording(&self, recording: Recording) -> Result<Recording>;
}
