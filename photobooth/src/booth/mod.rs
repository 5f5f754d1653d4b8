//! Booth core - the single owner of all process-wide mutable state.
//!
//! One `Booth` is constructed at startup and holds the session store, the
//! global active-session pointer, the command queue for the remote camera
//! agent and the upload retry queue. Every mutation of that state goes
//! through the methods here; the server wraps the whole thing in an
//! `Arc<RwLock<..>>` and takes the lock only for the duration of a state
//! change, never across I/O.

mod error;
mod retry;
mod short_id;

pub use error::BoothError;
pub use retry::RetryItem;

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::models::{Command, CommandKind, Photo, Session, SessionStatus};

/// Result of finishing the active session.
#[derive(Debug, Clone)]
pub struct FinishSummary {
    /// Id of the finished session.
    pub session_id: String,
    /// Number of photos it holds.
    pub photo_count: usize,
}

/// Target session resolved for an upload batch.
#[derive(Debug, Clone)]
pub struct UploadTarget {
    /// Session the photos will be appended to.
    pub session_id: String,
    /// True when the upload itself allocated the session (legacy
    /// single-photo flow); the response then carries a share link.
    pub legacy: bool,
}

/// In-memory coordination state for one photobooth process.
pub struct Booth {
    sessions: HashMap<String, Session>,
    active_session_id: Option<String>,
    commands: VecDeque<Command>,
    retries: VecDeque<RetryItem>,
    next_session_number: u64,
}

impl Default for Booth {
    fn default() -> Self {
        Self::new()
    }
}

impl Booth {
    /// Create an empty booth. The first session id issued is "0001".
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            active_session_id: None,
            commands: VecDeque::new(),
            retries: VecDeque::new(),
            next_session_number: 1,
        }
    }

    fn allocate_short_id(&mut self) -> String {
        let id = short_id::encode(self.next_session_number);
        self.next_session_number += 1;
        id
    }

    // === Sessions ===

    /// The currently active session, if any.
    pub fn active_session(&self) -> Option<&Session> {
        let id = self.active_session_id.as_deref()?;
        self.sessions.get(id).filter(|s| s.active)
    }

    /// Look up a session by id.
    pub fn session(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    /// Resolve the session a status poll refers to: the explicit id when
    /// given, else the active session.
    pub fn resolve(&self, session_id: Option<&str>) -> Option<&Session> {
        match session_id {
            Some(id) => self.sessions.get(id),
            None => self.active_session(),
        }
    }

    /// Number of sessions currently stored.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Start a new session. Fails with `Conflict` while another session
    /// is active. Enqueues a `session_start` command for the agent.
    pub fn start_session(&mut self) -> Result<String, BoothError> {
        if self.active_session().is_some() {
            return Err(BoothError::Conflict);
        }
        let id = self.allocate_short_id();
        self.sessions.insert(id.clone(), Session::new(id.clone()));
        self.active_session_id = Some(id.clone());
        self.enqueue_command(CommandKind::SessionStart, &id);
        tracing::info!(session_id = %id, "session started");
        Ok(id)
    }

    /// Finish the active session: deactivate it, clear the global
    /// pointer, enqueue a `session_finish` command and stamp the record
    /// for deletion after `expires_after`. The session stays queryable by
    /// id until the expiry sweep removes it, so late link resolution
    /// still works.
    pub fn finish_active(&mut self, expires_after: Duration) -> Result<FinishSummary, BoothError> {
        let id = self
            .active_session()
            .map(|s| s.id.clone())
            .ok_or(BoothError::InvalidState)?;
        let session = self.sessions.get_mut(&id).ok_or(BoothError::InvalidState)?;
        if session.photos.is_empty() {
            return Err(BoothError::EmptySession);
        }
        session.active = false;
        session.countdown_target = None;
        session.expires_at = Some(Utc::now() + expires_after);
        let photo_count = session.photos.len();
        self.active_session_id = None;
        self.enqueue_command(CommandKind::SessionFinish, &id);
        tracing::info!(session_id = %id, photo_count, "session finished");
        Ok(FinishSummary {
            session_id: id,
            photo_count,
        })
    }

    /// Cancel the active session: deactivate and delete immediately. No
    /// share link is generated and no command is enqueued.
    pub fn cancel_active(&mut self) -> Result<String, BoothError> {
        let id = self
            .active_session()
            .map(|s| s.id.clone())
            .ok_or(BoothError::InvalidState)?;
        self.sessions.remove(&id);
        self.active_session_id = None;
        tracing::info!(session_id = %id, "session cancelled");
        Ok(id)
    }

    /// Set the capture status of a session.
    ///
    /// If the session is unknown (the server restarted while a remote
    /// agent still references it) a minimal record is recreated under the
    /// same id, and adopted as the active session when no other session
    /// is active.
    pub fn update_status(&mut self, session_id: &str, status: SessionStatus) {
        if !self.sessions.contains_key(session_id) {
            let mut session = Session::new(session_id.to_string());
            session.active = false;
            self.sessions.insert(session_id.to_string(), session);
            if self.active_session().is_none() {
                if let Some(session) = self.sessions.get_mut(session_id) {
                    session.active = true;
                }
                self.active_session_id = Some(session_id.to_string());
            }
            tracing::warn!(session_id, "recreated session missing from store");
        }
        if let Some(session) = self.sessions.get_mut(session_id) {
            session.status = status;
        }
    }

    /// Stamp a countdown target on a session.
    pub fn set_countdown(&mut self, session_id: &str, target_ms: u64) -> Result<(), BoothError> {
        let session = self
            .sessions
            .get_mut(session_id)
            .ok_or(BoothError::NotFound)?;
        session.countdown_target = Some(target_ms);
        Ok(())
    }

    /// Clear a countdown target once it has fired.
    pub fn clear_countdown(&mut self, session_id: &str) {
        if let Some(session) = self.sessions.get_mut(session_id) {
            session.countdown_target = None;
        }
    }

    // === Photos ===

    /// Append a photo to a session; returns the new photo count.
    pub fn append_photo(&mut self, session_id: &str, photo: Photo) -> Result<usize, BoothError> {
        let session = self
            .sessions
            .get_mut(session_id)
            .ok_or(BoothError::NotFound)?;
        tracing::info!(session_id, photo_id = %photo.id, "photo recorded");
        session.photos.push(photo);
        Ok(session.photos.len())
    }

    /// Remove exactly one photo by id; returns the remaining count.
    pub fn delete_photo(&mut self, session_id: &str, photo_id: &str) -> Result<usize, BoothError> {
        let session = self
            .sessions
            .get_mut(session_id)
            .ok_or(BoothError::NotFound)?;
        let before = session.photos.len();
        session.photos.retain(|p| p.id != photo_id);
        if session.photos.len() == before {
            return Err(BoothError::NotFound);
        }
        Ok(session.photos.len())
    }

    /// Resolve the session an upload batch targets: the explicit id, else
    /// the active session, else a freshly allocated one (legacy flow
    /// where the upload itself creates the session).
    ///
    /// An explicit id naming a session the store no longer has (agent
    /// uploading across a server restart) gets a minimal inactive record
    /// recreated, mirroring `update_status`.
    pub fn resolve_upload_target(
        &mut self,
        explicit: Option<&str>,
        expires_after: Duration,
    ) -> UploadTarget {
        if let Some(id) = explicit {
            if !self.sessions.contains_key(id) {
                let mut session = Session::new(id.to_string());
                session.active = false;
                self.sessions.insert(id.to_string(), session);
                tracing::warn!(session_id = id, "recreated session for upload");
            }
            return UploadTarget {
                session_id: id.to_string(),
                legacy: false,
            };
        }
        if let Some(session) = self.active_session() {
            return UploadTarget {
                session_id: session.id.clone(),
                legacy: false,
            };
        }
        let id = self.allocate_short_id();
        let mut session = Session::new(id.clone());
        session.active = false;
        session.expires_at = Some(Utc::now() + expires_after);
        self.sessions.insert(id.clone(), session);
        tracing::info!(session_id = %id, "allocated session for direct upload");
        UploadTarget {
            session_id: id,
            legacy: true,
        }
    }

    // === Command queue ===

    /// Append a command for the remote camera agent.
    pub fn enqueue_command(&mut self, kind: CommandKind, session_id: &str) {
        self.commands
            .push_back(Command::new(kind, session_id.to_string()));
    }

    /// Pop the oldest pending command. Each command is delivered to at
    /// most one poller.
    pub fn poll_command(&mut self) -> Option<Command> {
        self.commands.pop_front()
    }

    /// Number of commands waiting for a poller.
    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }

    // === Retry queue ===

    /// Queue a failed upload for the background sweep.
    pub fn push_retry(&mut self, item: RetryItem) {
        tracing::warn!(
            session_id = %item.session_id,
            photo_id = %item.photo_id,
            attempts = item.attempts,
            "upload queued for retry"
        );
        self.retries.push_back(item);
    }

    /// Take the whole retry queue; the sweep re-queues what still fails.
    pub fn drain_retries(&mut self) -> Vec<RetryItem> {
        self.retries.drain(..).collect()
    }

    /// Number of uploads waiting for the retry sweep.
    pub fn retry_len(&self) -> usize {
        self.retries.len()
    }

    // === Expiry ===

    /// Remove sessions whose expiry stamp has passed; returns their ids.
    pub fn expire_sessions(&mut self, now: DateTime<Utc>) -> Vec<String> {
        let expired: Vec<String> = self
            .sessions
            .values()
            .filter(|s| s.expires_at.is_some_and(|at| at <= now))
            .map(|s| s.id.clone())
            .collect();
        for id in &expired {
            self.sessions.remove(id);
            if self.active_session_id.as_deref() == Some(id) {
                self.active_session_id = None;
            }
            tracing::info!(session_id = %id, "expired session removed");
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(n: u32) -> Photo {
        Photo::new(
            format!("http://storage.test/p{n}.jpg"),
            format!("booth/p{n}"),
        )
    }

    #[test]
    fn test_start_assigns_sequential_ids() {
        let mut booth = Booth::new();
        let first = booth.start_session().unwrap();
        assert_eq!(first, "0001");
        booth.cancel_active().unwrap();
        let second = booth.start_session().unwrap();
        assert_eq!(second, "0002");
    }

    #[test]
    fn test_start_conflicts_while_active() {
        let mut booth = Booth::new();
        let id = booth.start_session().unwrap();
        assert!(matches!(booth.start_session(), Err(BoothError::Conflict)));
        // The existing session is untouched.
        assert_eq!(booth.active_session().unwrap().id, id);
    }

    #[test]
    fn test_finish_requires_active_session() {
        let mut booth = Booth::new();
        assert!(matches!(
            booth.finish_active(Duration::from_secs(60)),
            Err(BoothError::InvalidState)
        ));
    }

    #[test]
    fn test_finish_rejects_empty_session_and_keeps_it_active() {
        let mut booth = Booth::new();
        booth.start_session().unwrap();
        assert!(matches!(
            booth.finish_active(Duration::from_secs(60)),
            Err(BoothError::EmptySession)
        ));
        assert!(booth.active_session().is_some());
    }

    #[test]
    fn test_finish_deactivates_and_keeps_record_until_expiry() {
        let mut booth = Booth::new();
        let id = booth.start_session().unwrap();
        booth.append_photo(&id, photo(1)).unwrap();
        booth.append_photo(&id, photo(2)).unwrap();

        let summary = booth.finish_active(Duration::from_secs(60)).unwrap();
        assert_eq!(summary.session_id, id);
        assert_eq!(summary.photo_count, 2);
        assert!(booth.active_session().is_none());
        // Still queryable by id until the sweep removes it.
        let session = booth.session(&id).unwrap();
        assert!(!session.active);
        assert!(session.expires_at.is_some());
    }

    #[test]
    fn test_cancel_removes_immediately() {
        let mut booth = Booth::new();
        let id = booth.start_session().unwrap();
        booth.cancel_active().unwrap();
        assert!(booth.session(&id).is_none());
        assert!(booth.active_session().is_none());
    }

    #[test]
    fn test_at_most_one_active_session() {
        let mut booth = Booth::new();
        for _ in 0..5 {
            let id = booth.start_session().unwrap();
            booth.append_photo(&id, photo(0)).unwrap();
            let active: Vec<_> = booth.sessions.values().filter(|s| s.active).collect();
            assert_eq!(active.len(), 1);
            booth.finish_active(Duration::from_secs(60)).unwrap();
        }
    }

    #[test]
    fn test_command_queue_is_fifo() {
        let mut booth = Booth::new();
        let id = booth.start_session().unwrap();
        // start_session enqueued a session_start; drain it first.
        assert_eq!(
            booth.poll_command().unwrap().kind,
            CommandKind::SessionStart
        );
        booth.enqueue_command(CommandKind::Trigger, &id);
        booth.enqueue_command(CommandKind::Trigger, &id);
        booth.enqueue_command(CommandKind::SessionFinish, &id);
        assert_eq!(booth.poll_command().unwrap().kind, CommandKind::Trigger);
        assert_eq!(booth.poll_command().unwrap().kind, CommandKind::Trigger);
        assert_eq!(
            booth.poll_command().unwrap().kind,
            CommandKind::SessionFinish
        );
        assert!(booth.poll_command().is_none());
    }

    #[test]
    fn test_commands_carry_their_session_id() {
        let mut booth = Booth::new();
        let id = booth.start_session().unwrap();
        let cmd = booth.poll_command().unwrap();
        assert_eq!(cmd.session_id, id);
    }

    #[test]
    fn test_delete_photo_removes_exactly_one() {
        let mut booth = Booth::new();
        let id = booth.start_session().unwrap();
        booth.append_photo(&id, photo(1)).unwrap();
        booth.append_photo(&id, photo(2)).unwrap();
        let target = booth.session(&id).unwrap().photos[0].id.clone();

        assert_eq!(booth.delete_photo(&id, &target).unwrap(), 1);
        let remaining = &booth.session(&id).unwrap().photos;
        assert_eq!(remaining.len(), 1);
        assert_ne!(remaining[0].id, target);

        // Unknown id leaves the list unchanged.
        assert!(matches!(
            booth.delete_photo(&id, "nope"),
            Err(BoothError::NotFound)
        ));
        assert_eq!(booth.session(&id).unwrap().photos.len(), 1);
    }

    #[test]
    fn test_update_status_recreates_and_adopts() {
        let mut booth = Booth::new();
        booth.update_status("0042", SessionStatus::Capturing);
        let session = booth.session("0042").unwrap();
        assert_eq!(session.status, SessionStatus::Capturing);
        // No other session was active, so the recreated one is adopted.
        assert_eq!(booth.active_session().unwrap().id, "0042");
    }

    #[test]
    fn test_update_status_does_not_steal_active() {
        let mut booth = Booth::new();
        let id = booth.start_session().unwrap();
        booth.update_status("0999", SessionStatus::Uploading);
        assert_eq!(booth.active_session().unwrap().id, id);
        assert!(!booth.session("0999").unwrap().active);
    }

    #[test]
    fn test_upload_target_prefers_explicit_then_active() {
        let mut booth = Booth::new();
        let id = booth.start_session().unwrap();
        let target = booth.resolve_upload_target(None, Duration::from_secs(60));
        assert_eq!(target.session_id, id);
        assert!(!target.legacy);

        let target = booth.resolve_upload_target(Some("0077"), Duration::from_secs(60));
        assert_eq!(target.session_id, "0077");
        assert!(booth.session("0077").is_some());
    }

    #[test]
    fn test_upload_target_allocates_legacy_session() {
        let mut booth = Booth::new();
        let target = booth.resolve_upload_target(None, Duration::from_secs(60));
        assert!(target.legacy);
        let session = booth.session(&target.session_id).unwrap();
        assert!(!session.active);
        assert!(session.expires_at.is_some());
    }

    #[test]
    fn test_expire_sessions_removes_past_due() {
        let mut booth = Booth::new();
        let id = booth.start_session().unwrap();
        booth.append_photo(&id, photo(1)).unwrap();
        booth.finish_active(Duration::from_secs(0)).unwrap();
        assert!(booth.session(&id).is_some());

        let removed = booth.expire_sessions(Utc::now() + Duration::from_secs(1));
        assert_eq!(removed, vec![id.clone()]);
        assert!(booth.session(&id).is_none());
    }
}
