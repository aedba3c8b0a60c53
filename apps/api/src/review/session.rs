//! Per-client session context.
//!
//! Each browser session owns one `SessionState`. The store hands out copies and
//! applies updates under a short write lock; it is never locked across a provider call.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::review::pipeline::ReviewReport;

#[derive(Debug, Clone, Serialize)]
pub struct SessionState {
    pub session_id: Uuid,
    pub analysis_complete: bool,
    pub analysis_count: u32,
    pub last_result: Option<ReviewReport>,
    #[serde(skip)]
    pub resume_text: String,
    pub updated_at: DateTime<Utc>,
}

impl SessionState {
    fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            analysis_complete: false,
            analysis_count: 0,
            last_result: None,
            resume_text: String::new(),
            updated_at: Utc::now(),
        }
    }

    /// Stores a finished review. Only called once the whole pipeline succeeded.
    pub fn record_success(&mut self, report: ReviewReport, resume_text: String) {
        self.last_result = Some(report);
        self.resume_text = resume_text;
        self.analysis_complete = true;
        self.analysis_count += 1;
        self.updated_at = Utc::now();
    }

    /// "Analyze a different resume": clears the result, keeps the running count.
    pub fn reset(&mut self) {
        self.last_result = None;
        self.resume_text.clear();
        self.analysis_complete = false;
        self.updated_at = Utc::now();
    }
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SessionState>>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// Returns the session for `id`, creating a fresh one when the id is absent or unknown.
    /// Reading a session counts as activity.
    pub async fn get_or_create(&self, id: Option<Uuid>) -> SessionState {
        self.purge_idle().await;
        let mut sessions = self.sessions.write().await;
        if let Some(existing) = id.and_then(|id| sessions.get_mut(&id)) {
            existing.updated_at = Utc::now();
            return existing.clone();
        }
        let session = SessionState::new(Uuid::new_v4());
        debug!("Created session {}", session.session_id);
        sessions.insert(session.session_id, session.clone());
        session
    }

    #[cfg(test)]
    pub async fn get(&self, id: Uuid) -> Option<SessionState> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Applies `f` to the session and returns the updated copy.
    pub async fn update<F>(&self, id: Uuid, f: F) -> Option<SessionState>
    where
        F: FnOnce(&mut SessionState),
    {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id)?;
        f(session);
        session.updated_at = Utc::now();
        Some(session.clone())
    }

    /// Like `update`, but recreates the session under the same id if it was purged meanwhile.
    pub async fn upsert<F>(&self, id: Uuid, f: F) -> SessionState
    where
        F: FnOnce(&mut SessionState),
    {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(id).or_insert_with(|| {
            debug!("Session {id} expired mid-request; recreating it");
            SessionState::new(id)
        });
        f(session);
        session.updated_at = Utc::now();
        session.clone()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn purge_idle(&self) {
        let cutoff = Utc::now() - self.idle_timeout;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.updated_at >= cutoff);
        let purged = before - sessions.len();
        if purged > 0 {
            debug!("Purged {purged} idle sessions");
        }
    }
}
