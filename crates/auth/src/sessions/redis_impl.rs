//! Redis session storage implementation.

use std::time::Duration;

use async_trait::async_trait;
use fred::prelude::*;
use idlink_core::auth::{AuthError, Result, Session, SessionId, SessionRepository};
use uuid::Uuid;

/// Redis-backed session storage.
///
/// Sessions live under `session:{id}` with a TTL; `user_sessions:{user_id}`
/// tracks the ids belonging to each user for logout-all and deactivation.
/// The set's TTL is pushed forward on every login so it never outlives the
/// newest session it indexes.
pub struct RedisSessionStore {
    pool: Pool,
    session_ttl: Duration,
}

impl RedisSessionStore {
    /// Creates a new Redis session store.
    ///
    /// # Arguments
    ///
    /// * `pool` - Redis connection pool
    /// * `session_ttl` - TTL for session data
    pub fn new(pool: Pool, session_ttl: Duration) -> Self {
        Self { pool, session_ttl }
    }

    fn session_key(id: &SessionId) -> String {
        format!("session:{id}")
    }

    fn user_sessions_key(user_id: Uuid) -> String {
        format!("user_sessions:{user_id}")
    }
}

fn storage_err(e: impl std::fmt::Display) -> AuthError {
    AuthError::Storage(e.to_string())
}

/// Redis rejects `EX 0`, so the expiry is at least one second.
fn expiry_secs(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX).max(1)
}

#[async_trait]
impl SessionRepository for RedisSessionStore {
    async fn create_session(&self, session: &Session) -> Result<()> {
        let key = Self::session_key(&session.id);
        let value = serde_json::to_string(session).map_err(storage_err)?;

        let ttl_secs = expiry_secs(self.session_ttl);

        self.pool
            .set::<(), _, _>(&key, &value, Some(Expiration::EX(ttl_secs)), None, false)
            .await
            .map_err(storage_err)?;

        let user_key = Self::user_sessions_key(session.user_id);
        self.pool
            .sadd::<(), _, _>(&user_key, session.id.as_str())
            .await
            .map_err(storage_err)?;
        self.pool
            .expire::<(), _>(&user_key, ttl_secs, None)
            .await
            .map_err(storage_err)?;

        Ok(())
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>> {
        let key = Self::session_key(id);
        let value: Option<String> = self.pool.get(&key).await.map_err(storage_err)?;

        value
            .map(|json| serde_json::from_str(&json).map_err(storage_err))
            .transpose()
    }

    async fn delete_session(&self, id: &SessionId) -> Result<()> {
        if let Some(session) = self.get_session(id).await? {
            let key = Self::session_key(id);
            self.pool.del::<(), _>(&key).await.map_err(storage_err)?;

            let user_key = Self::user_sessions_key(session.user_id);
            self.pool
                .srem::<(), _, _>(&user_key, id.as_str())
                .await
                .map_err(storage_err)?;
        }

        Ok(())
    }

    async fn delete_user_sessions(&self, user_id: Uuid) -> Result<()> {
        let user_key = Self::user_sessions_key(user_id);

        let session_ids: Vec<String> = self.pool.smembers(&user_key).await.map_err(storage_err)?;

        for id in session_ids {
            let key = Self::session_key(&SessionId::new(id));
            self.pool.del::<(), _>(&key).await.map_err(storage_err)?;
        }

        self.pool
            .del::<(), _>(&user_key)
            .await
            .map_err(storage_err)?;

        Ok(())
    }
}
