//! Commands queued for the remote camera agent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of instruction for the remote camera agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    /// Capture a photo for the named session.
    Trigger,
    /// A session has started.
    SessionStart,
    /// A session has finished.
    SessionFinish,
}

impl CommandKind {
    /// Convert to the wire string used in poll responses.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trigger => "trigger",
            Self::SessionStart => "session_start",
            Self::SessionFinish => "session_finish",
        }
    }

    /// Parse from a wire string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "trigger" => Some(Self::Trigger),
            "session_start" => Some(Self::SessionStart),
            "session_finish" => Some(Self::SessionFinish),
            _ => None,
        }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A queued instruction for the remote camera agent. Every command names
/// its target session so a consumer can check relevance before acting;
/// stale commands left over from a superseded session are drained and
/// discarded by the next poller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    /// What the agent should do.
    pub kind: CommandKind,
    /// The session this command applies to.
    pub session_id: String,
    /// When the command was enqueued.
    pub issued_at: DateTime<Utc>,
}

impl Command {
    /// Create a command targeting the given session.
    pub fn new(kind: CommandKind, session_id: String) -> Self {
        Self {
            kind,
            session_id,
            issued_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            CommandKind::Trigger,
            CommandKind::SessionStart,
            CommandKind::SessionFinish,
        ] {
            assert_eq!(CommandKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(CommandKind::from_str("reboot"), None);
    }
}
