//! Capture strategies.
//!
//! A trigger request turns into a photo one of three ways: a canned
//! image (simulated mode), the camera command running on this machine
//! (local mode), or a command queued for the remote agent (remote mode,
//! handled by the server since it only touches booth state).

mod process;

pub use process::{spawn_process, ProcessOptions, ProcessResult};

use std::path::PathBuf;

use chrono::Utc;
use rand::prelude::IndexedRandom;
use uuid::Uuid;

use crate::booth::BoothError;
use crate::config::Config;
use crate::models::Photo;

/// Canned images substituted for a real capture in simulated mode.
const CANNED_IMAGE_URLS: &[&str] = &[
    "https://picsum.photos/seed/booth-1/1200/800",
    "https://picsum.photos/seed/booth-2/1200/800",
    "https://picsum.photos/seed/booth-3/1200/800",
    "https://picsum.photos/seed/booth-4/1200/800",
];

/// Build a photo for a simulated capture.
pub fn simulated_photo() -> Photo {
    let mut rng = rand::rng();
    let url = CANNED_IMAGE_URLS
        .choose(&mut rng)
        .unwrap_or(&CANNED_IMAGE_URLS[0]);
    Photo::new(
        (*url).to_string(),
        format!("simulated/{}", Uuid::now_v7()),
    )
}

/// Run the camera command into a temp file, retrying a bounded number of
/// times with a fixed delay before surfacing `CaptureFailed`. Returns
/// the path of the captured image.
pub async fn capture_local(config: &Config) -> Result<PathBuf, BoothError> {
    let path = std::env::temp_dir().join(format!(
        "camera-{}.jpg",
        Utc::now().timestamp_millis()
    ));

    for attempt in 1..=config.capture_attempts {
        let options = ProcessOptions::new(&config.camera_command)
            .arg("--capture-image-and-download")
            .arg("--force-overwrite")
            .arg("--filename")
            .arg(path.display().to_string())
            .timeout(config.capture_timeout);

        match spawn_process(options).await {
            Ok(result) if result.success() && path.exists() => {
                tracing::info!(path = %path.display(), attempt, "camera capture complete");
                return Ok(path);
            }
            Ok(result) => {
                tracing::warn!(
                    attempt,
                    timed_out = result.timed_out,
                    stderr = %result.stderr_string(),
                    "camera capture attempt failed"
                );
            }
            Err(err) => {
                tracing::warn!(attempt, error = %err, "camera command failed to run");
            }
        }
        if attempt < config.capture_attempts {
            tokio::time::sleep(config.capture_retry_delay).await;
        }
    }

    Err(BoothError::CaptureFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_photo_uses_canned_image() {
        let photo = simulated_photo();
        assert!(CANNED_IMAGE_URLS.contains(&photo.url.as_str()));
        assert!(photo.storage_id.starts_with("simulated/"));
        assert!(!photo.id.is_empty());
    }

    #[tokio::test]
    async fn test_capture_local_surfaces_failure() {
        let config = Config {
            camera_command: "false".to_string(),
            capture_attempts: 2,
            capture_retry_delay: std::time::Duration::from_millis(1),
            capture_timeout: std::time::Duration::from_secs(1),
            ..Config::default()
        };
        assert!(matches!(
            capture_local(&config).await,
            Err(BoothError::CaptureFailed)
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_capture_local_picks_up_created_file() {
        // Stand-in camera: a script that writes the requested file.
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-camera.sh");
        std::fs::write(
            &script,
            "#!/bin/sh\nwhile [ \"$1\" != \"--filename\" ]; do shift; done\necho fake > \"$2\"\n",
        )
        .unwrap();
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let config = Config {
            camera_command: script.display().to_string(),
            capture_attempts: 1,
            capture_timeout: std::time::Duration::from_secs(5),
            ..Config::default()
        };
        let path = capture_local(&config).await.unwrap();
        assert!(path.exists());
        std::fs::remove_file(path).unwrap();
    }
}
