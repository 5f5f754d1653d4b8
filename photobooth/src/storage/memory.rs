//! In-memory storage backend.
//!
//! Objects live in a shared map and are served back through the server's
//! `/uploads/{photoId}` route. Used in development, simulated mode and
//! tests; tests can arm a number of injected failures to exercise the
//! retry paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use super::{content_type_for, StoredPhoto};
use crate::booth::BoothError;

#[derive(Debug, Clone)]
struct StoredObject {
    content_type: String,
    bytes: Vec<u8>,
}

/// Storage backend holding objects in process memory.
#[derive(Clone)]
pub struct MemoryStorage {
    objects: Arc<Mutex<HashMap<String, StoredObject>>>,
    base_url: String,
    failures_remaining: Arc<AtomicU32>,
}

impl MemoryStorage {
    /// Create an empty backend serving objects under `base_url`.
    pub fn new(base_url: String) -> Self {
        Self {
            objects: Arc::new(Mutex::new(HashMap::new())),
            base_url,
            failures_remaining: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Create a backend whose next `failures` uploads fail as
    /// unavailable.
    pub fn failing(base_url: String, failures: u32) -> Self {
        let storage = Self::new(base_url);
        storage.failures_remaining.store(failures, Ordering::SeqCst);
        storage
    }

    /// Store one photo.
    pub fn upload(
        &self,
        photo_id: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<StoredPhoto, BoothError> {
        if self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(BoothError::StorageUnavailable(
                "injected storage failure".to_string(),
            ));
        }

        let object = StoredObject {
            content_type: content_type_for(filename).to_string(),
            bytes: bytes.to_vec(),
        };
        self.objects
            .lock()
            .expect("storage map poisoned")
            .insert(photo_id.to_string(), object);

        Ok(StoredPhoto {
            url: format!(
                "{}/uploads/{photo_id}",
                self.base_url.trim_end_matches('/')
            ),
            storage_id: format!("booth/{photo_id}"),
        })
    }

    /// Fetch a stored object by photo id.
    pub fn fetch(&self, photo_id: &str) -> Option<(String, Vec<u8>)> {
        self.objects
            .lock()
            .expect("storage map poisoned")
            .get(photo_id)
            .map(|object| (object.content_type.clone(), object.bytes.clone()))
    }

    /// Number of stored objects.
    pub fn object_count(&self) -> usize {
        self.objects.lock().expect("storage map poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_and_fetch() {
        let storage = MemoryStorage::new("http://localhost:3000".to_string());
        let stored = storage.upload("p1", "shot.png", b"png-bytes").unwrap();
        assert_eq!(stored.url, "http://localhost:3000/uploads/p1");
        assert_eq!(stored.storage_id, "booth/p1");

        let (content_type, bytes) = storage.fetch("p1").unwrap();
        assert_eq!(content_type, "image/png");
        assert_eq!(bytes, b"png-bytes");
        assert!(storage.fetch("p2").is_none());
    }

    #[test]
    fn test_injected_failures_then_recovery() {
        let storage = MemoryStorage::failing("http://localhost:3000".to_string(), 2);
        assert!(storage.upload("p1", "a.jpg", b"x").is_err());
        assert!(storage.upload("p1", "a.jpg", b"x").is_err());
        assert!(storage.upload("p1", "a.jpg", b"x").is_ok());
        assert_eq!(storage.object_count(), 1);
    }
}
