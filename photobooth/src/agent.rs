//! Camera-side tools: the remote capture agent and the folder watcher.
//!
//! The agent runs on the machine physically connected to the camera. It
//! long-polls the server for commands, captures on `trigger`, reports
//! status transitions and uploads the result. The watcher is the older
//! tethered workflow: the camera software drops files into a folder and
//! each new file is uploaded as it stabilizes.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use walkdir::WalkDir;

use crate::capture;
use crate::config::Config;
use crate::storage::content_type_for;

const POLL_RETRY_DELAY: Duration = Duration::from_secs(2);
const SCAN_INTERVAL: Duration = Duration::from_secs(2);
const WATCH_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommandPoll {
    command: Option<String>,
    session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentSession {
    active: bool,
    session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadReply {
    success: bool,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    qr_code: Option<String>,
}

/// Options for the remote capture agent.
pub struct AgentOptions {
    /// Server base URL.
    pub server_url: String,
    /// Camera command to run for each capture.
    pub camera_command: String,
}

/// Run the agent loop until interrupted. Network errors are logged and
/// polling continues.
pub async fn run_agent(options: AgentOptions) -> Result<()> {
    let client = reqwest::Client::new();
    let server = options.server_url.trim_end_matches('/').to_string();
    let config = Config {
        camera_command: options.camera_command,
        ..Config::default()
    };
    tracing::info!(server = %server, camera = %config.camera_command, "listening for remote commands");

    loop {
        let poll = client
            .get(format!("{server}/api/session/command"))
            .query(&[("wait", "true")])
            .send()
            .await;
        let response = match poll {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(error = %err, "command poll failed");
                tokio::time::sleep(POLL_RETRY_DELAY).await;
                continue;
            }
        };
        let body = match response.json::<CommandPoll>().await {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(error = %err, "command poll returned junk");
                tokio::time::sleep(POLL_RETRY_DELAY).await;
                continue;
            }
        };

        match body.command.as_deref() {
            Some("trigger") => {
                if let Err(err) =
                    handle_trigger(&client, &server, &config, body.session_id.as_deref()).await
                {
                    tracing::error!(error = %err, "failed to process trigger");
                }
            }
            Some(command) => {
                tracing::info!(command, session_id = ?body.session_id, "session command observed");
            }
            None => {}
        }
    }
}

async fn handle_trigger(
    client: &reqwest::Client,
    server: &str,
    config: &Config,
    command_session: Option<&str>,
) -> Result<()> {
    let current: CurrentSession = client
        .get(format!("{server}/api/session/current"))
        .send()
        .await?
        .json()
        .await?;
    if !current.active {
        tracing::warn!("trigger received but no active session");
        return Ok(());
    }
    let session_id = current
        .session_id
        .context("active session without an id")?;
    // Stale commands from a superseded session are dropped here.
    if command_session.is_some_and(|requested| requested != session_id) {
        tracing::warn!(
            requested = ?command_session,
            current = %session_id,
            "ignoring trigger for superseded session"
        );
        return Ok(());
    }

    tracing::info!(session_id = %session_id, "capturing");
    post_status(client, server, &session_id, "Capturing").await;
    let path = match capture::capture_local(config).await {
        Ok(path) => path,
        Err(err) => {
            post_status(client, server, &session_id, "Error").await;
            return Err(err.into());
        }
    };

    post_status(client, server, &session_id, "Uploading").await;
    let uploaded = upload_capture(client, server, &session_id, &path).await;
    let _ = tokio::fs::remove_file(&path).await;
    match uploaded {
        Ok(()) => {
            post_status(client, server, &session_id, "Ready").await;
            tracing::info!(session_id = %session_id, "photo uploaded");
            Ok(())
        }
        Err(err) => {
            post_status(client, server, &session_id, "Error").await;
            Err(err)
        }
    }
}

/// Best-effort status report; a failed report never aborts a capture.
async fn post_status(client: &reqwest::Client, server: &str, session_id: &str, status: &str) {
    let body = serde_json::json!({ "status": status, "sessionId": session_id });
    if let Err(err) = client
        .post(format!("{server}/api/session/status"))
        .json(&body)
        .send()
        .await
    {
        tracing::warn!(error = %err, status, "status report failed");
    }
}

async fn upload_capture(
    client: &reqwest::Client,
    server: &str,
    session_id: &str,
    path: &Path,
) -> Result<()> {
    let reply = upload_multipart(client, server, Some(session_id), path).await?;
    anyhow::ensure!(reply.success, "server rejected the upload");
    Ok(())
}

async fn upload_multipart(
    client: &reqwest::Client,
    server: &str,
    session_id: Option<&str>,
    path: &Path,
) -> Result<UploadReply> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("capture.jpg")
        .to_string();
    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(filename.clone())
        .mime_str(content_type_for(&filename))?;
    let mut form = reqwest::multipart::Form::new().part("photos", part);
    if let Some(session_id) = session_id {
        form = form.text("sessionId", session_id.to_string());
    }

    let response = client
        .post(format!("{server}/api/upload"))
        .multipart(form)
        .send()
        .await?;
    anyhow::ensure!(
        response.status().is_success(),
        "upload returned {}",
        response.status()
    );
    Ok(response.json::<UploadReply>().await?)
}

/// Options for the folder watcher.
pub struct WatchOptions {
    /// Folder the camera software writes into.
    pub folder: PathBuf,
    /// Server base URL.
    pub server_url: String,
    /// Open the returned QR code image after a legacy upload.
    pub open_qr: bool,
}

/// Watch a folder and upload each new image once its size stops
/// changing between scans (cameras write large files slowly).
pub async fn run_watcher(options: WatchOptions) -> Result<()> {
    std::fs::create_dir_all(&options.folder)
        .with_context(|| format!("Failed to create {}", options.folder.display()))?;
    let client = reqwest::Client::new();
    let server = options.server_url.trim_end_matches('/').to_string();
    tracing::info!(folder = %options.folder.display(), server = %server, "watching for new photos");

    let mut sizes: HashMap<PathBuf, u64> = HashMap::new();
    let mut uploaded: HashSet<PathBuf> = HashSet::new();

    loop {
        for path in scan_folder(&options.folder) {
            if uploaded.contains(&path) {
                continue;
            }
            let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            let stable = sizes.get(&path) == Some(&size) && size > 0;
            sizes.insert(path.clone(), size);
            if !stable {
                continue;
            }

            tracing::info!(path = %path.display(), "new photo detected");
            match upload_watched(&client, &server, &path, &options).await {
                Ok(()) => {
                    uploaded.insert(path);
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "upload failed, will retry");
                }
            }
        }
        tokio::time::sleep(SCAN_INTERVAL).await;
    }
}

fn scan_folder(folder: &Path) -> Vec<PathBuf> {
    WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.path().to_path_buf())
        .filter(|path| {
            let name = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("");
            if name.starts_with('.') {
                return false;
            }
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_ascii_lowercase)
                .is_some_and(|ext| WATCH_EXTENSIONS.contains(&ext.as_str()))
        })
        .collect()
}

async fn upload_watched(
    client: &reqwest::Client,
    server: &str,
    path: &Path,
    options: &WatchOptions,
) -> Result<()> {
    let reply = upload_multipart(client, server, None, path).await?;
    anyhow::ensure!(reply.success, "server rejected the upload");

    if let Some(url) = &reply.download_url {
        tracing::info!(url = %url, "photo shared");
    }
    if let Some(qr) = &reply.qr_code {
        if let Some(payload) = qr.strip_prefix("data:image/png;base64,") {
            let bytes = STANDARD.decode(payload).context("Malformed QR data URL")?;
            let qr_path = options.folder.join("latest-qr.png");
            tokio::fs::write(&qr_path, bytes).await?;
            tracing::info!(path = %qr_path.display(), "QR code saved");
            if options.open_qr {
                let _ = open::that(&qr_path);
            }
        }
    }
    Ok(())
}
