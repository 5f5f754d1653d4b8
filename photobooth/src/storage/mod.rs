//! Remote photo storage collaborators.
//!
//! The server only ever talks to storage through [`Storage`], so the
//! HTTP-backed implementation can be swapped for the in-memory one in
//! development, simulated mode and tests.

mod http;
mod memory;

pub use http::HttpStorage;
pub use memory::MemoryStorage;

use crate::booth::BoothError;
use crate::config::Config;

/// Result of a successful storage upload.
#[derive(Debug, Clone)]
pub struct StoredPhoto {
    /// Public URL the photo is served from.
    pub url: String,
    /// Identifier of the object in storage.
    pub storage_id: String,
}

/// The configured storage backend.
#[derive(Clone)]
pub enum Storage {
    /// Remote HTTP object storage.
    Http(HttpStorage),
    /// In-memory storage served back by this process.
    Memory(MemoryStorage),
}

impl Storage {
    /// Pick a backend from the configuration: HTTP when an upload URL is
    /// configured, in-memory otherwise.
    pub fn from_config(config: &Config) -> Self {
        match &config.storage_upload_url {
            Some(url) => Self::Http(HttpStorage::new(url.clone())),
            None => Self::Memory(MemoryStorage::new(config.public_url.clone())),
        }
    }

    /// Push one photo into storage under the given photo id.
    pub async fn upload(
        &self,
        photo_id: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<StoredPhoto, BoothError> {
        match self {
            Self::Http(storage) => storage.upload(photo_id, filename, bytes).await,
            Self::Memory(storage) => storage.upload(photo_id, filename, bytes),
        }
    }

    /// Fetch a stored object by photo id. Only the in-memory backend
    /// serves objects out of this process; HTTP-stored photos are fetched
    /// from their own URLs.
    pub fn fetch_local(&self, photo_id: &str) -> Option<(String, Vec<u8>)> {
        match self {
            Self::Http(_) => None,
            Self::Memory(storage) => storage.fetch(photo_id),
        }
    }
}

/// Guess a content type from a filename extension.
pub(crate) fn content_type_for(filename: &str) -> &'static str {
    let ext = filename.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}
