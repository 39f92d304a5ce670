//! SQLite session storage implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use idlink_core::auth::{AuthError, Result, Session, SessionId, SessionRepository};
use idlink_core::directory::Role;
use sqlx::SqlitePool;
use uuid::Uuid;

/// SQLite-backed session storage.
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    /// Creates a new SQLite session store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Runs database migrations to create required tables.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                role TEXT NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(())
    }
}

fn storage_err(e: impl std::fmt::Display) -> AuthError {
    AuthError::Storage(e.to_string())
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(storage_err)
}

#[async_trait]
impl SessionRepository for SqliteSessionStore {
    async fn create_session(&self, session: &Session) -> Result<()> {
        sqlx::query(
            "INSERT INTO sessions (id, user_id, role, created_at, expires_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(session.id.as_str())
        .bind(session.user_id.to_string())
        .bind(session.role.as_str())
        .bind(session.created_at.to_rfc3339())
        .bind(session.expires_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(())
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>> {
        let row = sqlx::query_as::<_, (String, String, String, String, String)>(
            "SELECT id, user_id, role, created_at, expires_at FROM sessions WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        let Some((id, user_id, role, created_at, expires_at)) = row else {
            return Ok(None);
        };

        Ok(Some(Session {
            id: SessionId::new(id),
            user_id: Uuid::parse_str(&user_id).map_err(storage_err)?,
            role: role.parse::<Role>().map_err(storage_err)?,
            created_at: parse_timestamp(&created_at)?,
            expires_at: parse_timestamp(&expires_at)?,
        }))
    }

    async fn delete_session(&self, id: &SessionId) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;

        Ok(())
    }

    async fn delete_user_sessions(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup() -> SqliteSessionStore {
        // A single connection keeps the in-memory database alive across queries.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqliteSessionStore::new(pool);
        store.migrate().await.unwrap();
        store
    }

    fn session(id: &str, user_id: Uuid, role: Role) -> Session {
        let now = Utc::now();
        Session {
            id: SessionId::new(id.to_string()),
            user_id,
            role,
            created_at: now,
            expires_at: now + chrono::Duration::days(7),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_roundtrips_fields() {
        let store = setup().await;
        let user_id = Uuid::new_v4();
        let original = session("s-1", user_id, Role::Staff);

        store.create_session(&original).await.unwrap();
        let loaded = store
            .get_session(&SessionId::new("s-1".to_string()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(loaded.user_id, user_id);
        assert_eq!(loaded.role, Role::Staff);
        assert_eq!(loaded.expires_at.timestamp(), original.expires_at.timestamp());
    }

    #[tokio::test]
    async fn test_get_missing_session() {
        let store = setup().await;
        let loaded = store
            .get_session(&SessionId::new("missing".to_string()))
            .await
            .unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_delete_user_sessions_only_touches_that_user() {
        let store = setup().await;
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        store.create_session(&session("a-1", alice, Role::User)).await.unwrap();
        store.create_session(&session("a-2", alice, Role::User)).await.unwrap();
        store.create_session(&session("b-1", bob, Role::User)).await.unwrap();

        store.delete_user_sessions(alice).await.unwrap();

        for id in ["a-1", "a-2"] {
            assert!(store
                .get_session(&SessionId::new(id.to_string()))
                .await
                .unwrap()
                .is_none());
        }
        assert!(store
            .get_session(&SessionId::new("b-1".to_string()))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_delete_session() {
        let store = setup().await;
        store
            .create_session(&session("s-1", Uuid::new_v4(), Role::User))
            .await
            .unwrap();

        store
            .delete_session(&SessionId::new("s-1".to_string()))
            .await
            .unwrap();

        assert!(store
            .get_session(&SessionId::new("s-1".to_string()))
            .await
            .unwrap()
            .is_none());
    }
}
