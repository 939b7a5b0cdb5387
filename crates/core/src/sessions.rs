use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::session::{CallId, Session, SessionPatch};

/// Volatile per-call state keyed by call id.
///
/// None of the operations can fail: a missing entry reads as a fresh
/// default session, and clearing an unknown id is a no-op.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, call_id: &CallId) -> Session;
    async fn merge(&self, call_id: &CallId, patch: SessionPatch);
    async fn clear(&self, call_id: &CallId);
}

struct SessionEntry {
    session: Session,
    touched_at: Instant,
}

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<CallId, SessionEntry>>,
}

impl InMemorySessionStore {
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub async fn evict_idle(&self, max_idle: Duration) -> Vec<CallId> {
        self.evict_idle_at(Instant::now(), max_idle).await
    }

    /// Drops every session whose last merge is older than `max_idle` as of `now`.
    pub async fn evict_idle_at(&self, now: Instant, max_idle: Duration) -> Vec<CallId> {
        let mut sessions = self.sessions.write().await;
        let expired = sessions
            .iter()
            .filter(|(_, entry)| now.saturating_duration_since(entry.touched_at) > max_idle)
            .map(|(call_id, _)| call_id.clone())
            .collect::<Vec<_>>();
        for call_id in &expired {
            sessions.remove(call_id);
        }
        expired
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, call_id: &CallId) -> Session {
        let sessions = self.sessions.read().await;
        sessions.get(call_id).map(|entry| entry.session.clone()).unwrap_or_default()
    }

    async fn merge(&self, call_id: &CallId, patch: SessionPatch) {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.entry(call_id.clone()).or_insert_with(|| SessionEntry {
            session: Session::default(),
            touched_at: Instant::now(),
        });
        entry.session.merge(patch);
        entry.touched_at = Instant::now();
    }

    async fn clear(&self, call_id: &CallId) {
        self.sessions.write().await.remove(call_id);
    }
}
