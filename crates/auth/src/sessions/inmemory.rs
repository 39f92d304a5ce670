//! In-memory session storage for development and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use idlink_core::auth::{is_session_expired, Result, Session, SessionId, SessionRepository};

/// In-memory session store.
///
/// Stores sessions in a HashMap wrapped in `Arc<RwLock<_>>`.
/// Data is not persisted and will be lost when the store is dropped.
/// Expired sessions are evicted when looked up and whenever a new session is
/// created.
#[derive(Debug, Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySessionStore {
    /// Creates a new empty in-memory session store.
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of stored sessions, including expired ones not yet evicted.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionStore {
    async fn create_session(&self, session: &Session) -> Result<()> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| !is_session_expired(s, now));
        sessions.insert(session.id.as_str().to_string(), session.clone());
        Ok(())
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(id.as_str()) {
                Some(session) if !is_session_expired(session, now) => {
                    return Ok(Some(session.clone()))
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }

        let mut sessions = self.sessions.write().await;
        if sessions
            .get(id.as_str())
            .is_some_and(|session| is_session_expired(session, now))
        {
            sessions.remove(id.as_str());
        }
        Ok(None)
    }

    async fn delete_session(&self, id: &SessionId) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(id.as_str());
        Ok(())
    }

    async fn delete_user_sessions(&self, user_id: Uuid) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| s.user_id != user_id);
        Ok(())
    }
}
