use super::types::{Session, SessionId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Shared handle to one session. The inner `tokio::sync::Mutex` serializes
/// turns: a second `submit_message` for the same session queues on the lock
/// until the prior turn has committed.
pub type SessionHandle = Arc<tokio::sync::Mutex<Session>>;

/// Registry of live sessions.
///
/// Durable storage technology is a host-application concern; the core keeps
/// sessions in memory and exposes the turn log for export.
pub trait SessionStore: Send + Sync {
    fn insert(&self, session: Session) -> SessionId;
    fn handle(&self, id: SessionId) -> Option<SessionHandle>;
    fn remove(&self, id: SessionId) -> bool;
    fn ids(&self) -> Vec<SessionId>;
}

pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<SessionId, SessionHandle>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn lock_sessions(&self) -> std::sync::MutexGuard<'_, HashMap<SessionId, SessionHandle>> {
        // Session maps hold no invariants across a panic; recover the guard.
        self.sessions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for InMemorySessionStore {
    fn insert(&self, session: Session) -> SessionId {
        let id = session.id;
        self.lock_sessions()
            .insert(id, Arc::new(tokio::sync::Mutex::new(session)));
        id
    }

    fn handle(&self, id: SessionId) -> Option<SessionHandle> {
        self.lock_sessions().get(&id).cloned()
    }

    fn remove(&self, id: SessionId) -> bool {
        self.lock_sessions().remove(&id).is_some()
    }

    fn ids(&self) -> Vec<SessionId> {
        self.lock_sessions().keys().copied().collect()
    }
}
