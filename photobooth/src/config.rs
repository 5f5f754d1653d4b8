//! Runtime configuration.
//!
//! Everything is read once at startup from the process environment, with
//! CLI flags overriding where one exists. Timing constants live here so
//! tests can shrink them.

use std::time::Duration;

/// How a trigger request is turned into a photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Substitute a canned image for a real capture.
    Simulated,
    /// Run the camera command on this machine.
    Local,
    /// Enqueue a command for a remote camera agent to pick up via
    /// long-poll.
    Remote,
}

impl CaptureMode {
    /// Parse from the `CAPTURE_MODE` environment value.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "simulated" => Some(Self::Simulated),
            "local" => Some(Self::Local),
            "remote" => Some(Self::Remote),
            _ => None,
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on.
    pub port: u16,
    /// Public base URL used for share links and photo URLs.
    pub public_url: String,
    /// Capture strategy for trigger requests.
    pub capture_mode: CaptureMode,
    /// Development mode keeps finished sessions around longer for manual
    /// testing.
    pub dev_mode: bool,
    /// Camera command for the local capture strategy and the agent.
    pub camera_command: String,
    /// Remote storage upload endpoint; in-memory storage is used when
    /// unset.
    pub storage_upload_url: Option<String>,
    /// Directory of static assets served at the root, if present.
    pub static_dir: String,

    /// How long a finished session stays resolvable.
    pub session_expiry: Duration,
    /// How often the expiry sweep runs.
    pub expiry_sweep_interval: Duration,
    /// Upper bound on a single long-poll request.
    pub long_poll_max_wait: Duration,
    /// Queue re-check interval while long-polling.
    pub long_poll_interval: Duration,
    /// Per-attempt timeout for a local capture.
    pub capture_timeout: Duration,
    /// Local capture attempts before surfacing failure.
    pub capture_attempts: u32,
    /// Delay between local capture attempts.
    pub capture_retry_delay: Duration,
    /// Synchronous upload attempts before queueing for retry.
    pub upload_attempts: u32,
    /// Delay between synchronous upload attempts.
    pub upload_retry_delay: Duration,
    /// How often the upload retry sweep runs.
    pub retry_sweep_interval: Duration,
    /// Total attempts after which a queued upload is dropped.
    pub retry_ceiling: u32,
    /// Lead time for the synchronized capture countdown.
    pub countdown_lead: Duration,
    /// Per-file upload size cap.
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            public_url: "http://localhost:3000".to_string(),
            capture_mode: CaptureMode::Remote,
            dev_mode: false,
            camera_command: "gphoto2".to_string(),
            storage_upload_url: None,
            static_dir: "public".to_string(),
            session_expiry: Duration::from_secs(60 * 60),
            expiry_sweep_interval: Duration::from_secs(30),
            long_poll_max_wait: Duration::from_secs(25),
            long_poll_interval: Duration::from_millis(250),
            capture_timeout: Duration::from_secs(10),
            capture_attempts: 3,
            capture_retry_delay: Duration::from_secs(1),
            upload_attempts: 3,
            upload_retry_delay: Duration::from_millis(500),
            retry_sweep_interval: Duration::from_secs(30),
            retry_ceiling: 5,
            countdown_lead: Duration::from_secs(3),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Build a config from the process environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(port) = env_var("PORT").and_then(|v| v.parse().ok()) {
            config.port = port;
        }
        config.public_url = env_var("PUBLIC_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", config.port));
        if let Some(mode) = env_var("CAPTURE_MODE").and_then(|v| CaptureMode::from_str(&v)) {
            config.capture_mode = mode;
        }
        config.dev_mode = env_var("PHOTOBOOTH_ENV").as_deref() == Some("development");
        if config.dev_mode {
            // Keep sessions around for manual link testing.
            config.session_expiry = Duration::from_secs(24 * 60 * 60);
        }
        if let Some(cmd) = env_var("CAMERA_COMMAND") {
            config.camera_command = cmd;
        }
        config.storage_upload_url = env_var("STORAGE_UPLOAD_URL");
        if let Some(dir) = env_var("STATIC_DIR") {
            config.static_dir = dir;
        }

        config
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_mode_parse() {
        assert_eq!(CaptureMode::from_str("simulated"), Some(CaptureMode::Simulated));
        assert_eq!(CaptureMode::from_str("local"), Some(CaptureMode::Local));
        assert_eq!(CaptureMode::from_str("remote"), Some(CaptureMode::Remote));
        assert_eq!(CaptureMode::from_str("webcam"), None);
    }
}
