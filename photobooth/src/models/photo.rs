//! Photo model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single captured photo, owned by exactly one session. Photos are
/// appended on upload and never mutated afterwards; they can only be
/// removed by an explicit delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    /// Unique photo identifier, assigned at creation (UUIDv7).
    pub id: String,
    /// URL the photo is served from.
    pub url: String,
    /// Identifier of the object in remote storage.
    pub storage_id: String,
    /// When the photo was captured/uploaded.
    pub captured_at: DateTime<Utc>,
}

impl Photo {
    /// Create a photo with a freshly assigned id.
    pub fn new(url: String, storage_id: String) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            url,
            storage_id,
            captured_at: Utc::now(),
        }
    }

    /// Create a photo under a pre-assigned id (upload pipeline allocates
    /// ids before pushing to storage so retries keep the same identity).
    pub fn with_id(id: String, url: String, storage_id: String) -> Self {
        Self {
            id,
            url,
            storage_id,
            captured_at: Utc::now(),
        }
    }
}
