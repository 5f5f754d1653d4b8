//! Async external command execution with a timeout.
//!
//! The camera command (gphoto2 or a stand-in) is a normal child process;
//! this helper runs it, collects stdout/stderr lines and kills it when
//! the per-attempt timeout elapses.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::timeout;

/// Configuration for one command invocation.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// The program to execute.
    pub program: String,
    /// Arguments to pass to the program.
    pub args: Vec<String>,
    /// Working directory for the process.
    pub working_dir: Option<PathBuf>,
    /// Kill the process when this elapses.
    pub timeout: Option<Duration>,
}

impl ProcessOptions {
    /// Create new options for the given program.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set the working directory.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set a timeout for the process.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }
}

/// Result from a completed process.
#[derive(Debug)]
pub struct ProcessResult {
    /// Exit status of the process.
    pub status: Option<ExitStatus>,
    /// All stdout lines collected.
    pub stdout: Vec<String>,
    /// All stderr lines collected.
    pub stderr: Vec<String>,
    /// Whether the process was killed due to timeout.
    pub timed_out: bool,
}

impl ProcessResult {
    /// Check if the process exited successfully.
    pub fn success(&self) -> bool {
        self.status.is_some_and(|s| s.success()) && !self.timed_out
    }

    /// Get stderr as a single string.
    pub fn stderr_string(&self) -> String {
        self.stderr.join("\n")
    }
}

/// Spawn a process, wait for it to complete and collect all output.
pub async fn spawn_process(options: ProcessOptions) -> Result<ProcessResult> {
    let mut cmd = Command::new(&options.program);
    cmd.args(&options.args);
    if let Some(ref dir) = options.working_dir {
        cmd.current_dir(dir);
    }
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut child = cmd
        .spawn()
        .with_context(|| format!("Failed to spawn process: {}", options.program))?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let stdout_handle = tokio::spawn(async move {
        let mut lines = Vec::new();
        if let Some(stdout) = stdout {
            let mut reader = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = reader.next_line().await {
                lines.push(line);
            }
        }
        lines
    });
    let stderr_handle = tokio::spawn(async move {
        let mut lines = Vec::new();
        if let Some(stderr) = stderr {
            let mut reader = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = reader.next_line().await {
                lines.push(line);
            }
        }
        lines
    });

    let mut timed_out = false;
    let status = if let Some(duration) = options.timeout {
        match timeout(duration, child.wait()).await {
            Ok(status) => Some(status.context("Failed to wait for process to exit")?),
            Err(_) => {
                timed_out = true;
                let _ = child.kill().await;
                child.wait().await.ok()
            }
        }
    } else {
        Some(
            child
                .wait()
                .await
                .context("Failed to wait for process to exit")?,
        )
    };

    let stdout = stdout_handle.await.unwrap_or_default();
    let stderr = stderr_handle.await.unwrap_or_default();

    Ok(ProcessResult {
        status,
        stdout,
        stderr,
        timed_out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_echo() {
        let result = spawn_process(ProcessOptions::new("echo").arg("hello world"))
            .await
            .unwrap();

        assert!(result.success());
        assert_eq!(result.stdout, vec!["hello world"]);
        assert!(result.stderr.is_empty());
    }

    #[tokio::test]
    async fn test_spawn_nonexistent() {
        let result = spawn_process(ProcessOptions::new("nonexistent_command_12345")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_spawn_with_timeout() {
        let result = spawn_process(
            ProcessOptions::new("sleep")
                .arg("10")
                .timeout(Duration::from_millis(100)),
        )
        .await
        .unwrap();

        assert!(result.timed_out);
        assert!(!result.success());
    }

    #[tokio::test]
    async fn test_spawn_collects_stderr() {
        let result = spawn_process(ProcessOptions::new("sh").arg("-c").arg("echo error >&2"))
            .await
            .unwrap();

        assert!(result.success());
        assert!(result.stdout.is_empty());
        assert_eq!(result.stderr, vec!["error"]);
    }
}
