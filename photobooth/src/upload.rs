//! Upload pipeline.
//!
//! Receives file bytes (or a URL already in storage), pushes them to the
//! storage collaborator and records results on the target session.
//! Uploads within a batch run concurrently and are appended in
//! completion order. A failed upload is retried synchronously a few
//! times, then handed to the retry queue, which a background sweep drains
//! on a fixed interval; items past the retry ceiling are dropped and
//! logged, never surfaced to a client whose request already completed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::booth::{Booth, BoothError, RetryItem};
use crate::config::Config;
use crate::models::Photo;
use crate::storage::{Storage, StoredPhoto};

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// One file received for upload.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    /// Client-supplied filename.
    pub filename: String,
    /// Client-supplied content type, when the transport carries one.
    pub content_type: Option<String>,
    /// Raw image bytes, shared so retries never copy.
    pub bytes: Arc<Vec<u8>>,
}

/// Result of an upload batch. Partial success is allowed and reported.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// Session the batch targeted.
    pub session_id: String,
    /// True when the upload itself allocated the session.
    pub legacy: bool,
    /// Files stored and recorded.
    pub uploaded: usize,
    /// Files handed to the retry queue.
    pub queued_for_retry: usize,
    /// Photo count on the session after the batch.
    pub photo_count: usize,
}

/// Check a file against the image allow-list. Runs before any storage
/// write.
pub fn validate_image(file: &IncomingFile) -> Result<(), BoothError> {
    let ext = file
        .filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .ok_or(BoothError::InvalidFileType)?;
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(BoothError::InvalidFileType);
    }
    if let Some(content_type) = &file.content_type {
        if !ALLOWED_MIME_TYPES.contains(&content_type.as_str()) {
            return Err(BoothError::InvalidFileType);
        }
    }
    Ok(())
}

/// Upload a batch of files into the resolved session.
pub async fn upload_files(
    booth: &RwLock<Booth>,
    storage: &Storage,
    config: &Config,
    explicit_session: Option<&str>,
    files: Vec<IncomingFile>,
) -> Result<UploadOutcome, BoothError> {
    if files.is_empty() {
        return Err(BoothError::NoFiles);
    }
    for file in &files {
        validate_image(file)?;
    }

    let target = booth
        .write()
        .await
        .resolve_upload_target(explicit_session, config.session_expiry);
    let session_id = target.session_id.clone();

    let mut set = JoinSet::new();
    for file in files {
        let storage = storage.clone();
        let attempts = config.upload_attempts;
        let delay = config.upload_retry_delay;
        set.spawn(async move {
            let photo_id = Uuid::now_v7().to_string();
            let result =
                upload_with_retries(&storage, &photo_id, &file, attempts, delay).await;
            (photo_id, file, result)
        });
    }

    let mut uploaded = 0;
    let mut queued_for_retry = 0;
    while let Some(joined) = set.join_next().await {
        let Ok((photo_id, file, result)) = joined else {
            continue;
        };
        match result {
            Ok(stored) => {
                let photo = Photo::with_id(photo_id, stored.url, stored.storage_id);
                match booth.write().await.append_photo(&session_id, photo) {
                    Ok(_) => uploaded += 1,
                    // Session cancelled mid-batch; the stored object is
                    // orphaned but the rest of the batch still proceeds.
                    Err(_) => tracing::warn!(
                        session_id = %session_id,
                        "uploaded photo but session is gone"
                    ),
                }
            }
            Err(err) => {
                tracing::warn!(
                    session_id = %session_id,
                    photo_id = %photo_id,
                    error = %err,
                    "upload failed after synchronous retries"
                );
                booth.write().await.push_retry(RetryItem::new(
                    session_id.clone(),
                    photo_id,
                    file.filename,
                    file.bytes,
                    config.upload_attempts,
                ));
                queued_for_retry += 1;
            }
        }
    }

    let photo_count = booth
        .read()
        .await
        .session(&session_id)
        .map_or(0, |s| s.photos.len());

    Ok(UploadOutcome {
        session_id,
        legacy: target.legacy,
        uploaded,
        queued_for_retry,
        photo_count,
    })
}

/// Record a photo that is already in storage (the remote agent uploaded
/// it directly and reports the result here).
pub async fn upload_by_url(
    booth: &RwLock<Booth>,
    config: &Config,
    session_id: &str,
    photo_url: String,
    storage_id: String,
) -> Result<UploadOutcome, BoothError> {
    let target = booth
        .write()
        .await
        .resolve_upload_target(Some(session_id), config.session_expiry);
    let photo = Photo::new(photo_url, storage_id);
    let photo_count = booth.write().await.append_photo(&target.session_id, photo)?;
    Ok(UploadOutcome {
        session_id: target.session_id,
        legacy: target.legacy,
        uploaded: 1,
        queued_for_retry: 0,
        photo_count,
    })
}

async fn upload_with_retries(
    storage: &Storage,
    photo_id: &str,
    file: &IncomingFile,
    attempts: u32,
    delay: Duration,
) -> Result<StoredPhoto, BoothError> {
    for attempt in 1..=attempts {
        match storage.upload(photo_id, &file.filename, &file.bytes).await {
            Ok(stored) => return Ok(stored),
            Err(err) => {
                tracing::warn!(photo_id, attempt, error = %err, "storage upload failed");
                if attempt < attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
    Err(BoothError::StorageUnavailable(
        "synchronous attempts exhausted".to_string(),
    ))
}

/// One pass over the retry queue: re-attempt every queued upload. On
/// success the photo is recorded best-effort (the session may have
/// expired meanwhile); on renewed failure the item is re-queued with its
/// counter bumped, unless it passed the ceiling, in which case the photo
/// is permanently lost and logged.
pub async fn run_retry_sweep(booth: &RwLock<Booth>, storage: &Storage, config: &Config) {
    let items = booth.write().await.drain_retries();
    if items.is_empty() {
        return;
    }
    tracing::info!(count = items.len(), "retry sweep started");

    for mut item in items {
        match storage
            .upload(&item.photo_id, &item.filename, &item.bytes)
            .await
        {
            Ok(stored) => {
                let photo =
                    Photo::with_id(item.photo_id.clone(), stored.url, stored.storage_id);
                match booth.write().await.append_photo(&item.session_id, photo) {
                    Ok(_) => tracing::info!(
                        session_id = %item.session_id,
                        photo_id = %item.photo_id,
                        "queued upload recovered"
                    ),
                    Err(_) => tracing::warn!(
                        session_id = %item.session_id,
                        photo_id = %item.photo_id,
                        "queued upload stored but session is gone"
                    ),
                }
            }
            Err(err) => {
                item.attempts += 1;
                if item.attempts > config.retry_ceiling {
                    tracing::error!(
                        session_id = %item.session_id,
                        photo_id = %item.photo_id,
                        attempts = item.attempts,
                        error = %err,
                        "upload dropped after retry ceiling, photo lost"
                    );
                } else {
                    booth.write().await.push_retry(item);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn test_config() -> Config {
        Config {
            upload_retry_delay: Duration::from_millis(1),
            ..Config::default()
        }
    }

    fn file(name: &str) -> IncomingFile {
        IncomingFile {
            filename: name.to_string(),
            content_type: None,
            bytes: Arc::new(vec![0xff, 0xd8, 0xff]),
        }
    }

    #[test]
    fn test_validate_image_allow_list() {
        assert!(validate_image(&file("shot.jpg")).is_ok());
        assert!(validate_image(&file("shot.PNG")).is_ok());
        assert!(validate_image(&file("notes.txt")).is_err());
        assert!(validate_image(&file("no-extension")).is_err());

        let mut bad_mime = file("shot.jpg");
        bad_mime.content_type = Some("text/plain".to_string());
        assert!(validate_image(&bad_mime).is_err());
    }

    #[tokio::test]
    async fn test_upload_appends_to_active_session() {
        let booth = RwLock::new(Booth::new());
        let storage = Storage::Memory(MemoryStorage::new("http://test".to_string()));
        let config = test_config();
        let id = booth.write().await.start_session().unwrap();

        let outcome = upload_files(&booth, &storage, &config, None, vec![file("a.jpg")])
            .await
            .unwrap();
        assert_eq!(outcome.session_id, id);
        assert_eq!(outcome.uploaded, 1);
        assert_eq!(outcome.photo_count, 1);
        assert!(!outcome.legacy);
    }

    #[tokio::test]
    async fn test_transient_failure_recovers_within_sync_retries() {
        let booth = RwLock::new(Booth::new());
        let storage =
            Storage::Memory(MemoryStorage::failing("http://test".to_string(), 2));
        let config = test_config();
        booth.write().await.start_session().unwrap();

        let outcome = upload_files(&booth, &storage, &config, None, vec![file("a.jpg")])
            .await
            .unwrap();
        assert_eq!(outcome.uploaded, 1);
        assert_eq!(outcome.queued_for_retry, 0);
    }

    #[tokio::test]
    async fn test_exhausted_sync_retries_queue_for_sweep() {
        let booth = RwLock::new(Booth::new());
        let storage =
            Storage::Memory(MemoryStorage::failing("http://test".to_string(), 3));
        let config = test_config();
        booth.write().await.start_session().unwrap();

        let outcome = upload_files(&booth, &storage, &config, None, vec![file("a.jpg")])
            .await
            .unwrap();
        assert_eq!(outcome.uploaded, 0);
        assert_eq!(outcome.queued_for_retry, 1);
        assert_eq!(outcome.photo_count, 0);
        assert_eq!(booth.read().await.retry_len(), 1);

        // Storage has recovered; the sweep records the photo.
        run_retry_sweep(&booth, &storage, &config).await;
        assert_eq!(booth.read().await.retry_len(), 0);
        let snapshot = booth.read().await.active_session().unwrap().photos.len();
        assert_eq!(snapshot, 1);
    }

    #[tokio::test]
    async fn test_sweep_drops_item_past_ceiling() {
        let booth = RwLock::new(Booth::new());
        let storage =
            Storage::Memory(MemoryStorage::failing("http://test".to_string(), u32::MAX));
        let config = test_config();
        let id = booth.write().await.start_session().unwrap();

        booth.write().await.push_retry(RetryItem::new(
            id.clone(),
            "photo-1".to_string(),
            "a.jpg".to_string(),
            Arc::new(vec![1]),
            config.upload_attempts,
        ));

        // Each sweep bumps the counter; past the ceiling the item is gone.
        for _ in 0..=config.retry_ceiling {
            run_retry_sweep(&booth, &storage, &config).await;
        }
        assert_eq!(booth.read().await.retry_len(), 0);
        assert!(booth.read().await.session(&id).unwrap().photos.is_empty());
    }

    #[tokio::test]
    async fn test_rejects_empty_batch_and_bad_type_before_any_write() {
        let booth = RwLock::new(Booth::new());
        let memory = MemoryStorage::new("http://test".to_string());
        let storage = Storage::Memory(memory.clone());
        let config = test_config();

        assert!(matches!(
            upload_files(&booth, &storage, &config, None, Vec::new()).await,
            Err(BoothError::NoFiles)
        ));
        assert!(matches!(
            upload_files(&booth, &storage, &config, None, vec![file("virus.exe")]).await,
            Err(BoothError::InvalidFileType)
        ));
        assert_eq!(memory.object_count(), 0);
    }

    #[tokio::test]
    async fn test_upload_without_session_allocates_one() {
        let booth = RwLock::new(Booth::new());
        let storage = Storage::Memory(MemoryStorage::new("http://test".to_string()));
        let config = test_config();

        let outcome = upload_files(&booth, &storage, &config, None, vec![file("a.jpg")])
            .await
            .unwrap();
        assert!(outcome.legacy);
        assert_eq!(outcome.photo_count, 1);
        assert!(booth.read().await.session(&outcome.session_id).is_some());
    }
}
