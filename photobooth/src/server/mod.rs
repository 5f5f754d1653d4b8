//! Photobooth coordination server.
//!
//! Architecture:
//! - One process owns all state: the session store, the global
//!   active-session pointer, the command queue and the upload retry queue
//!   (everything in-memory, lost on restart)
//! - Booth screen, remote trigger device and QR display are all plain
//!   HTTP polling clients
//! - The remote camera agent drains the command queue via long-poll and
//!   pushes captured photos back through the upload endpoint
//!
//! Endpoints:
//! - POST /api/session/start - Start a session
//! - GET /api/session/current - Poll session state
//! - POST /api/session/trigger - Request a capture
//! - GET /api/session/command - Agent command poll (long-poll with ?wait=true)
//! - POST /api/session/status - Agent status report
//! - POST /api/session/countdown - Synchronized capture countdown
//! - POST /api/session/finish - Finish and get share link + QR
//! - POST /api/session/cancel - Cancel without a link
//! - DELETE /api/session/photo - Remove one photo
//! - POST /api/upload - Photo upload (multipart or by-url JSON)
//! - GET /health - Health check
//! - GET /{shortId} - Share link: photo redirect or gallery page

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::{
    extract::rejection::JsonRejection,
    extract::{DefaultBodyLimit, FromRequest, Multipart, Path, Query, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::booth::{Booth, BoothError};
use crate::capture;
use crate::config::{CaptureMode, Config};
use crate::models::{CommandKind, Photo, Session, SessionStatus};
use crate::qr;
use crate::storage::Storage;
use crate::upload::{self, IncomingFile};

/// Shared server state.
pub struct ServerState {
    /// All coordination state, behind one lock.
    pub booth: RwLock<Booth>,
    /// Remote storage collaborator.
    pub storage: Storage,
    /// Startup configuration.
    pub config: Config,
    /// Guards against overlapping retry sweep invocations.
    retry_sweep_lock: Mutex<()>,
    /// Guards against overlapping expiry sweep invocations.
    expiry_sweep_lock: Mutex<()>,
}

impl ServerState {
    /// Create server state around a fresh booth.
    pub fn new(config: Config, storage: Storage) -> Self {
        Self {
            booth: RwLock::new(Booth::new()),
            storage,
            config,
            retry_sweep_lock: Mutex::new(()),
            expiry_sweep_lock: Mutex::new(()),
        }
    }
}

// === Request/Response Types ===

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    photo_count: Option<usize>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartResponse {
    success: bool,
    session_id: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct CurrentResponse {
    active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    photo_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    photos: Option<Vec<Photo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    countdown_target: Option<u64>,
}

#[derive(Debug, Serialize)]
struct SimpleResponse {
    success: bool,
}

#[derive(Debug, Serialize)]
struct TriggerResponse {
    success: bool,
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommandPollResponse {
    command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CountdownResponse {
    success: bool,
    countdown_target: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FinishResponse {
    success: bool,
    session_id: String,
    qr_code: String,
    download_url: String,
    photo_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    success: bool,
    session_id: String,
    photo_count: usize,
    uploaded: usize,
    queued_for_retry: usize,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    qr_code: Option<String>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    sessions: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentQuery {
    session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommandQuery {
    wait: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct StatusRequest {
    status: String,
    session_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CountdownRequest {
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct DeletePhotoRequest {
    session_id: String,
    photo_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct UploadByUrlRequest {
    session_id: String,
    photo_url: String,
    storage_id: String,
}

// === Error helpers ===

fn error_reply(err: &BoothError) -> ApiError {
    let status = match err {
        BoothError::Conflict => StatusCode::CONFLICT,
        BoothError::InvalidState
        | BoothError::EmptySession
        | BoothError::NoFiles
        | BoothError::InvalidFileType => StatusCode::BAD_REQUEST,
        BoothError::NotFound => StatusCode::NOT_FOUND,
        BoothError::StorageUnavailable(_) => StatusCode::BAD_GATEWAY,
        BoothError::CaptureFailed | BoothError::PermanentFailure => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let photo_count = matches!(err, BoothError::EmptySession).then_some(0);
    (
        status,
        Json(ErrorResponse {
            success: false,
            error: err.to_string(),
            photo_count,
        }),
    )
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            success: false,
            error: message.into(),
            photo_count: None,
        }),
    )
}

fn internal_error(err: impl std::fmt::Display) -> ApiError {
    tracing::error!(error = %err, "request failed unexpectedly");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            success: false,
            error: "Internal server error".to_string(),
            photo_count: None,
        }),
    )
}

fn require_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(bad_request(rejection.body_text())),
    }
}

fn share_link(config: &Config, session_id: &str) -> String {
    format!("{}/{}", config.public_url.trim_end_matches('/'), session_id)
}

// === Server Lifecycle ===

/// Build the full router.
pub fn build_app(state: Arc<ServerState>) -> Router {
    let share_links = Router::new()
        .route("/{short_id}", get(short_link_handler))
        .with_state(state.clone());
    let static_files = ServeDir::new(&state.config.static_dir).fallback(share_links);

    Router::new()
        .route("/api/session/start", post(start_session_handler))
        .route("/api/session/current", get(current_session_handler))
        .route("/api/session/trigger", post(trigger_handler))
        .route("/api/session/command", get(poll_command_handler))
        .route("/api/session/status", post(update_status_handler))
        .route("/api/session/countdown", post(countdown_handler))
        .route("/api/session/finish", post(finish_handler))
        .route("/api/session/cancel", post(cancel_handler))
        .route("/api/session/photo", delete(delete_photo_handler))
        .route("/api/upload", post(upload_handler))
        .route("/health", get(health_handler))
        .route("/uploads/{photo_id}", get(serve_upload_handler))
        .layer(DefaultBodyLimit::max(
            state.config.max_upload_bytes + 1024 * 1024,
        ))
        .layer(CorsLayer::permissive())
        .fallback_service(static_files)
        .with_state(state)
}

/// Spawn the retry and expiry sweeps. Each sweep skips a tick if its
/// previous invocation is still running.
pub fn spawn_background_tasks(state: &Arc<ServerState>) {
    let retry_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(retry_state.config.retry_sweep_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let Ok(_guard) = retry_state.retry_sweep_lock.try_lock() else {
                continue;
            };
            upload::run_retry_sweep(
                &retry_state.booth,
                &retry_state.storage,
                &retry_state.config,
            )
            .await;
        }
    });

    let expiry_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(expiry_state.config.expiry_sweep_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let Ok(_guard) = expiry_state.expiry_sweep_lock.try_lock() else {
                continue;
            };
            expiry_state.booth.write().await.expire_sessions(Utc::now());
        }
    });
}

/// Start the server and serve until shutdown.
pub async fn start_server(config: Config) -> Result<()> {
    let storage = Storage::from_config(&config);
    let state = Arc::new(ServerState::new(config, storage));
    spawn_background_tasks(&state);

    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let app = build_app(state);
    tracing::info!("photobooth server listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

// === Handlers ===

async fn start_session_handler(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<StartResponse>, ApiError> {
    let session_id = state
        .booth
        .write()
        .await
        .start_session()
        .map_err(|err| error_reply(&err))?;
    Ok(Json(StartResponse {
        success: true,
        session_id,
    }))
}

async fn current_session_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<CurrentQuery>,
) -> Json<CurrentResponse> {
    let booth = state.booth.read().await;
    let Some(session) = booth.resolve(query.session_id.as_deref()) else {
        return Json(CurrentResponse::default());
    };
    if !session.active {
        return Json(CurrentResponse::default());
    }
    Json(CurrentResponse {
        active: true,
        session_id: Some(session.id.clone()),
        photo_count: Some(session.photos.len()),
        photos: Some(session.photos.clone()),
        status: Some(session.status.as_str().to_string()),
        countdown_target: session.countdown_target,
    })
}

/// Run one capture according to the configured strategy. Shared by the
/// trigger endpoint and the countdown task.
async fn perform_trigger(state: &Arc<ServerState>) -> Result<String, BoothError> {
    match state.config.capture_mode {
        CaptureMode::Simulated => {
            let mut booth = state.booth.write().await;
            let session_id = booth
                .active_session()
                .map(|s| s.id.clone())
                .ok_or(BoothError::InvalidState)?;
            booth.append_photo(&session_id, capture::simulated_photo())?;
            Ok("Simulated capture complete".to_string())
        }
        CaptureMode::Remote => {
            let mut booth = state.booth.write().await;
            let session_id = booth
                .active_session()
                .map(|s| s.id.clone())
                .ok_or(BoothError::InvalidState)?;
            booth.enqueue_command(CommandKind::Trigger, &session_id);
            Ok("Trigger queued for remote camera".to_string())
        }
        CaptureMode::Local => {
            let session_id = state
                .booth
                .read()
                .await
                .active_session()
                .map(|s| s.id.clone())
                .ok_or(BoothError::InvalidState)?;
            state
                .booth
                .write()
                .await
                .update_status(&session_id, SessionStatus::Capturing);

            let path = match capture::capture_local(&state.config).await {
                Ok(path) => path,
                Err(err) => {
                    state
                        .booth
                        .write()
                        .await
                        .update_status(&session_id, SessionStatus::Error);
                    return Err(err);
                }
            };
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "captured file unreadable");
                    state
                        .booth
                        .write()
                        .await
                        .update_status(&session_id, SessionStatus::Error);
                    return Err(BoothError::CaptureFailed);
                }
            };
            let filename = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("capture.jpg")
                .to_string();
            let _ = tokio::fs::remove_file(&path).await;

            state
                .booth
                .write()
                .await
                .update_status(&session_id, SessionStatus::Uploading);
            let file = IncomingFile {
                filename,
                content_type: None,
                bytes: Arc::new(bytes),
            };
            let outcome = upload::upload_files(
                &state.booth,
                &state.storage,
                &state.config,
                Some(&session_id),
                vec![file],
            )
            .await;
            state
                .booth
                .write()
                .await
                .update_status(&session_id, SessionStatus::Ready);
            outcome?;
            Ok("Capture complete".to_string())
        }
    }
}

async fn trigger_handler(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<TriggerResponse>, ApiError> {
    let message = perform_trigger(&state)
        .await
        .map_err(|err| error_reply(&err))?;
    Ok(Json(TriggerResponse {
        success: true,
        message,
    }))
}

/// Command poll for the remote camera agent. With `wait=true` this is a
/// long-poll: an explicit loop with a deadline, sleeping between queue
/// checks so other requests keep flowing, returning `{command: null}`
/// once the maximum wait elapses.
async fn poll_command_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<CommandQuery>,
) -> Json<CommandPollResponse> {
    let wait = query.wait.unwrap_or(false);
    let deadline = Instant::now() + state.config.long_poll_max_wait;
    loop {
        if let Some(command) = state.booth.write().await.poll_command() {
            return Json(CommandPollResponse {
                command: Some(command.kind.as_str().to_string()),
                session_id: Some(command.session_id),
                timestamp: Some(command.issued_at),
            });
        }
        if !wait || Instant::now() >= deadline {
            return Json(CommandPollResponse {
                command: None,
                session_id: None,
                timestamp: None,
            });
        }
        tokio::time::sleep(state.config.long_poll_interval).await;
    }
}

async fn update_status_handler(
    State(state): State<Arc<ServerState>>,
    body: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<SimpleResponse>, ApiError> {
    let request = require_body(body)?;
    let Some(status) = SessionStatus::from_str(&request.status) else {
        return Err(bad_request(format!("Unknown status: {}", request.status)));
    };
    state
        .booth
        .write()
        .await
        .update_status(&request.session_id, status);
    Ok(Json(SimpleResponse { success: true }))
}

async fn countdown_handler(
    State(state): State<Arc<ServerState>>,
    body: Result<Json<CountdownRequest>, JsonRejection>,
) -> Result<Json<CountdownResponse>, ApiError> {
    let request = require_body(body)?;
    let session_id = {
        let booth = state.booth.read().await;
        booth
            .resolve(request.session_id.as_deref())
            .filter(|s| s.active)
            .map(|s| s.id.clone())
            .ok_or_else(|| error_reply(&BoothError::InvalidState))?
    };

    let lead = state.config.countdown_lead;
    let target_ms = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
        + u64::try_from(lead.as_millis()).unwrap_or_default();
    state
        .booth
        .write()
        .await
        .set_countdown(&session_id, target_ms)
        .map_err(|err| error_reply(&err))?;

    let task_state = state.clone();
    tokio::spawn(async move {
        tokio::time::sleep(lead).await;
        task_state.booth.write().await.clear_countdown(&session_id);
        if let Err(err) = perform_trigger(&task_state).await {
            tracing::warn!(session_id = %session_id, error = %err, "countdown trigger failed");
        }
    });

    Ok(Json(CountdownResponse {
        success: true,
        countdown_target: target_ms,
    }))
}

async fn finish_handler(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<FinishResponse>, ApiError> {
    let summary = state
        .booth
        .write()
        .await
        .finish_active(state.config.session_expiry)
        .map_err(|err| error_reply(&err))?;

    let link = share_link(&state.config, &summary.session_id);
    let qr_code = qr::data_url(&link).map_err(internal_error)?;

    Ok(Json(FinishResponse {
        success: true,
        session_id: summary.session_id,
        qr_code,
        download_url: link,
        photo_count: summary.photo_count,
    }))
}

async fn cancel_handler(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<SimpleResponse>, ApiError> {
    state
        .booth
        .write()
        .await
        .cancel_active()
        .map_err(|err| error_reply(&err))?;
    Ok(Json(SimpleResponse { success: true }))
}

async fn delete_photo_handler(
    State(state): State<Arc<ServerState>>,
    body: Result<Json<DeletePhotoRequest>, JsonRejection>,
) -> Result<Json<SimpleResponse>, ApiError> {
    let request = require_body(body)?;
    state
        .booth
        .write()
        .await
        .delete_photo(&request.session_id, &request.photo_id)
        .map_err(|err| error_reply(&err))?;
    Ok(Json(SimpleResponse { success: true }))
}

/// Photo upload: either multipart files (`photos` parts plus an optional
/// `sessionId` field) or a JSON body recording a photo the agent already
/// pushed to storage itself.
async fn upload_handler(
    State(state): State<Arc<ServerState>>,
    request: Request,
) -> Result<Json<UploadResponse>, ApiError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();

    let outcome = if content_type.starts_with("multipart/form-data") {
        let (session_id, files) = read_multipart(&state, request).await?;
        upload::upload_files(
            &state.booth,
            &state.storage,
            &state.config,
            session_id.as_deref(),
            files,
        )
        .await
        .map_err(|err| error_reply(&err))?
    } else {
        let bytes = axum::body::to_bytes(request.into_body(), state.config.max_upload_bytes)
            .await
            .map_err(|err| bad_request(format!("Unreadable request body: {err}")))?;
        if bytes.is_empty() {
            return Err(error_reply(&BoothError::NoFiles));
        }
        let body: UploadByUrlRequest = serde_json::from_slice(&bytes)
            .map_err(|err| bad_request(format!("Invalid request body: {err}")))?;
        upload::upload_by_url(
            &state.booth,
            &state.config,
            &body.session_id,
            body.photo_url,
            body.storage_id,
        )
        .await
        .map_err(|err| error_reply(&err))?
    };

    let message = if outcome.uploaded == 0 && outcome.queued_for_retry > 0 {
        "Upload queued for retry".to_string()
    } else {
        format!("{} photo(s) uploaded", outcome.uploaded)
    };

    let mut response = UploadResponse {
        success: true,
        session_id: outcome.session_id.clone(),
        photo_count: outcome.photo_count,
        uploaded: outcome.uploaded,
        queued_for_retry: outcome.queued_for_retry,
        message,
        download_url: None,
        qr_code: None,
    };
    if outcome.legacy {
        let link = share_link(&state.config, &outcome.session_id);
        response.qr_code = qr::data_url(&link).ok();
        response.download_url = Some(link);
    }
    Ok(Json(response))
}

async fn read_multipart(
    state: &Arc<ServerState>,
    request: Request,
) -> Result<(Option<String>, Vec<IncomingFile>), ApiError> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|err| bad_request(format!("Malformed multipart body: {err}")))?;

    let mut session_id = None;
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| bad_request(format!("Malformed multipart body: {err}")))?
    {
        match field.name() {
            Some("photos" | "photo") => {
                let filename = field.file_name().unwrap_or("capture.jpg").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| bad_request(format!("Unreadable file: {err}")))?;
                if bytes.len() > state.config.max_upload_bytes {
                    return Err(bad_request("File too large"));
                }
                files.push(IncomingFile {
                    filename,
                    content_type,
                    bytes: Arc::new(bytes.to_vec()),
                });
            }
            Some("sessionId") => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| bad_request(format!("Unreadable field: {err}")))?;
                if !value.trim().is_empty() {
                    session_id = Some(value.trim().to_string());
                }
            }
            _ => {}
        }
    }
    Ok((session_id, files))
}

async fn health_handler(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    let sessions = state.booth.read().await.session_count();
    Json(HealthResponse {
        status: "ok",
        sessions,
    })
}

async fn serve_upload_handler(
    State(state): State<Arc<ServerState>>,
    Path(photo_id): Path<String>,
) -> Response {
    match state.storage.fetch_local(&photo_id) {
        Some((content_type, bytes)) => ([(CONTENT_TYPE, content_type)], bytes).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Share link resolution: one photo redirects straight to it, several
/// render a gallery page, anything unknown gets the styled 404.
async fn short_link_handler(
    State(state): State<Arc<ServerState>>,
    Path(short_id): Path<String>,
) -> Response {
    let booth = state.booth.read().await;
    let Some(session) = booth.session(&short_id) else {
        return (StatusCode::NOT_FOUND, Html(not_found_page())).into_response();
    };
    match session.photos.as_slice() {
        [] => (StatusCode::NOT_FOUND, Html(not_found_page())).into_response(),
        [photo] => Redirect::temporary(&photo.url).into_response(),
        _ => Html(gallery_page(session)).into_response(),
    }
}

// === Pages ===

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>
  body {{
    font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
    background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
    min-height: 100vh;
    display: flex;
    justify-content: center;
    align-items: center;
    padding: 20px;
    margin: 0;
  }}
  .container {{
    background: white;
    border-radius: 20px;
    box-shadow: 0 20px 60px rgba(0, 0, 0, 0.3);
    padding: 40px;
    max-width: 800px;
    width: 100%;
    text-align: center;
  }}
  h1 {{ color: #333; margin-bottom: 10px; }}
  p {{ color: #666; }}
  .gallery {{ display: grid; grid-template-columns: repeat(auto-fill, minmax(220px, 1fr)); gap: 16px; margin-top: 24px; }}
  .gallery img {{ width: 100%; border-radius: 10px; box-shadow: 0 10px 30px rgba(0, 0, 0, 0.2); }}
</style>
</head>
<body>
<div class="container">
{body}
</div>
</body>
</html>
"#
    )
}

fn not_found_page() -> String {
    page(
        "Photos Not Found",
        "<h1>Photos Not Available</h1>\n<p>The photos you're looking for are not available or may have been removed.</p>",
    )
}

fn gallery_page(session: &Session) -> String {
    let cards: String = session
        .photos
        .iter()
        .map(|photo| {
            format!(
                "<a href=\"{url}\" download><img src=\"{url}\" alt=\"Session photo\" loading=\"lazy\"></a>",
                url = escape_html(&photo.url)
            )
        })
        .collect();
    let body = format!(
        "<h1>Your Photos</h1>\n<p>Session {id} - {count} photo(s)</p>\n<div class=\"gallery\">{cards}</div>",
        id = escape_html(&session.id),
        count = session.photos.len()
    );
    page("Your Photos", &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<img src="x" onerror='y'>&"#),
            "&lt;img src=&quot;x&quot; onerror=&#039;y&#039;&gt;&amp;"
        );
    }

    #[test]
    fn test_share_link_trims_trailing_slash() {
        let config = Config {
            public_url: "http://booth.local/".to_string(),
            ..Config::default()
        };
        assert_eq!(share_link(&config, "0001"), "http://booth.local/0001");
    }
}
