//! Session model representing one photobooth run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Photo;

/// Status of the capture side of a session, reported by whoever is
/// operating the camera (local strategy or remote agent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Ready for the next capture.
    Ready,
    /// Camera is currently capturing.
    Capturing,
    /// Captured photo is being uploaded.
    Uploading,
    /// The last capture or upload failed.
    Error,
}

impl SessionStatus {
    /// Convert status to its wire string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "Ready",
            Self::Capturing => "Capturing",
            Self::Uploading => "Uploading",
            Self::Error => "Error",
        }
    }

    /// Parse status from a wire string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Ready" | "ready" => Some(Self::Ready),
            "Capturing" | "capturing" => Some(Self::Capturing),
            "Uploading" | "uploading" => Some(Self::Uploading),
            "Error" | "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A session is one photobooth run, identified by a short id and holding
/// zero or more photos. At most one session is active at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Short base-36 identifier (e.g. "0001").
    pub id: String,
    /// Photos captured during this session, in upload-completion order.
    pub photos: Vec<Photo>,
    /// Whether this session is the currently active one.
    pub active: bool,
    /// Capture status as last reported.
    pub status: SessionStatus,
    /// When the session was started.
    pub created_at: DateTime<Utc>,
    /// Countdown target (epoch milliseconds) when a synchronized
    /// countdown is running, cleared once it fires.
    pub countdown_target: Option<u64>,
    /// When the record becomes eligible for removal (set on finish).
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Create a new active session.
    pub fn new(id: String) -> Self {
        Self {
            id,
            photos: Vec::new(),
            active: true,
            status: SessionStatus::Ready,
            created_at: Utc::now(),
            countdown_target: None,
            expires_at: None,
        }
    }
}
