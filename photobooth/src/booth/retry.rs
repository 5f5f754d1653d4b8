//! Retry queue items for failed uploads.

use std::sync::Arc;

/// A failed upload waiting for the background sweep to re-attempt it.
/// Bytes are shared so re-queueing an item never copies the image.
#[derive(Debug, Clone)]
pub struct RetryItem {
    /// Session the photo belongs to.
    pub session_id: String,
    /// Photo id assigned when the upload was first attempted; kept across
    /// retries so the photo has one identity.
    pub photo_id: String,
    /// Original filename, used for the storage object name.
    pub filename: String,
    /// Raw image bytes.
    pub bytes: Arc<Vec<u8>>,
    /// Upload attempts made so far (synchronous and swept).
    pub attempts: u32,
}

impl RetryItem {
    /// Create an item after the initial synchronous attempts failed.
    pub fn new(
        session_id: String,
        photo_id: String,
        filename: String,
        bytes: Arc<Vec<u8>>,
        attempts: u32,
    ) -> Self {
        Self {
            session_id,
            photo_id,
            filename,
            bytes,
            attempts,
        }
    }
}
