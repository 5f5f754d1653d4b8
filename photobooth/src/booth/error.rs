//! Domain error taxonomy.

use thiserror::Error;

/// Errors surfaced by booth operations and the upload pipeline.
#[derive(Debug, Error)]
pub enum BoothError {
    /// A session is already active.
    #[error("A session is already active")]
    Conflict,

    /// The operation requires an active session and there is none.
    #[error("No active session")]
    InvalidState,

    /// Finish was requested for a session with zero photos.
    #[error("Cannot finish a session with no photos")]
    EmptySession,

    /// Unknown session, photo or short id.
    #[error("Not found")]
    NotFound,

    /// Local capture failed after bounded retries.
    #[error("Camera capture failed")]
    CaptureFailed,

    /// Upload request carried no files.
    #[error("No files uploaded")]
    NoFiles,

    /// File failed the image allow-list check.
    #[error("Only image files (JPEG, PNG, GIF, WebP) are allowed")]
    InvalidFileType,

    /// Remote storage rejected or never answered an upload; retryable.
    #[error("Remote storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A queued upload exceeded the retry ceiling and was dropped.
    #[error("Upload retries exhausted")]
    PermanentFailure,
}
