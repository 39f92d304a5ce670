//! SQLite directory implementation.

use async_trait::async_trait;
use chrono::Utc;
use tokio_rusqlite::Connection;
use uuid::Uuid;

use idlink_core::directory::{NewProfile, RepositoryError, Result, UserDirectory, UserProfile};

use super::conversions::{format_datetime, row_to_profile};
use super::error::{map_tokio_rusqlite_error, map_tokio_rusqlite_error_with_id};
use super::schema;

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

fn select_one(
    conn: &rusqlite::Connection,
    sql: &str,
    key: &str,
) -> rusqlite::Result<Option<UserProfile>> {
    let mut stmt = conn.prepare(sql)?;
    match stmt.query_row([key], row_to_profile) {
        Ok(profile) => Ok(Some(profile)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

fn insert_profile(
    conn: &rusqlite::Connection,
    sql: &str,
    profile: &UserProfile,
) -> rusqlite::Result<usize> {
    conn.execute(
        sql,
        rusqlite::params![
            profile.id.to_string(),
            profile.external_id,
            profile.email,
            profile.first_name,
            profile.last_name,
            profile.display_name,
            profile.active,
            profile.role.as_str(),
            format_datetime(&profile.created_at),
            format_datetime(&profile.updated_at),
        ],
    )
}

/// SQLite-backed user directory.
pub struct SqliteDirectory {
    conn: Connection,
}

impl SqliteDirectory {
    /// Opens (creating if needed) a file-based database and its schema.
    pub async fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    /// Creates a directory over an in-memory database.
    ///
    /// Data is lost when the connection is dropped.
    #[cfg(test)]
    pub async fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    async fn init_schema(conn: &Connection) -> Result<()> {
        conn.call(|conn| {
            conn.execute_batch(schema::CREATE_TABLES)
                .map_err(wrap_err)?;
            Ok(())
        })
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))
    }
}

#[async_trait]
impl UserDirectory for SqliteDirectory {
    async fn get_user(&self, id: Uuid) -> Result<Option<UserProfile>> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| select_one(conn, schema::SELECT_USER_BY_ID, &id_str).map_err(wrap_err))
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "UserProfile", id.to_string()))
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<UserProfile>> {
        let external_id = external_id.to_string();
        let error_id = external_id.clone();

        self.conn
            .call(move |conn| {
                select_one(conn, schema::SELECT_USER_BY_EXTERNAL_ID, &external_id)
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "UserProfile", error_id))
    }

    async fn create_user(&self, profile: &UserProfile) -> Result<()> {
        let profile = profile.clone();
        let external_id = profile.external_id.clone();

        self.conn
            .call(move |conn| {
                insert_profile(conn, schema::INSERT_USER, &profile).map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "UserProfile", external_id))
    }

    async fn find_or_create_by_external_id(&self, new: &NewProfile) -> Result<(UserProfile, bool)> {
        let candidate = UserProfile::from_new(new.clone(), Utc::now());
        let external_id = new.external_id.clone();
        let error_id = external_id.clone();

        // The insert and the read-back run in one closure on the connection's
        // thread, so no other statement can interleave between them.
        self.conn
            .call(move |conn| {
                let inserted = insert_profile(conn, schema::INSERT_USER_IF_ABSENT, &candidate)
                    .map_err(wrap_err)?;

                let profile = select_one(conn, schema::SELECT_USER_BY_EXTERNAL_ID, &external_id)
                    .map_err(wrap_err)?
                    .ok_or_else(|| wrap_err(rusqlite::Error::QueryReturnedNoRows))?;

                Ok((profile, inserted == 1))
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "UserProfile", error_id))
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>> {
        self.conn
            .call(|conn| {
                let mut stmt = conn.prepare(schema::SELECT_ALL_USERS).map_err(wrap_err)?;
                let rows = stmt.query_map([], row_to_profile).map_err(wrap_err)?;

                let mut users = Vec::new();
                for row_result in rows {
                    users.push(row_result.map_err(wrap_err)?);
                }
                Ok(users)
            })
            .await
            .map_err(map_tokio_rusqlite_error)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<UserProfile> {
        let id_str = id.to_string();
        let updated_at = format_datetime(&Utc::now());

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(
                        schema::UPDATE_USER_ACTIVE,
                        rusqlite::params![id_str, active, updated_at],
                    )
                    .map_err(wrap_err)?;
                if rows == 0 {
                    return Err(wrap_err(rusqlite::Error::QueryReturnedNoRows));
                }

                select_one(conn, schema::SELECT_USER_BY_ID, &id_str)
                    .map_err(wrap_err)?
                    .ok_or_else(|| wrap_err(rusqlite::Error::QueryReturnedNoRows))
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "UserProfile", id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idlink_core::directory::Role;

    fn new_profile(external_id: &str, role: Role) -> NewProfile {
        NewProfile {
            external_id: external_id.to_string(),
            email: "a@x.com".to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            display_name: "A B".to_string(),
            active: true,
            role,
        }
    }

    #[tokio::test]
    async fn test_find_or_create_inserts_then_reuses() {
        let directory = SqliteDirectory::new_in_memory().await.unwrap();

        let (created, was_created) = directory
            .find_or_create_by_external_id(&new_profile("abc123", Role::User))
            .await
            .unwrap();
        assert!(was_created);
        assert_eq!(created.email, "a@x.com");
        assert!(created.active);
        assert_eq!(created.role, Role::User);

        let (existing, was_created) = directory
            .find_or_create_by_external_id(&new_profile("abc123", Role::Staff))
            .await
            .unwrap();
        assert!(!was_created);
        assert_eq!(existing.id, created.id);
        assert_eq!(existing.role, Role::User);
    }

    #[tokio::test]
    async fn test_concurrent_find_or_create_yields_one_profile() {
        let directory = std::sync::Arc::new(SqliteDirectory::new_in_memory().await.unwrap());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let directory = directory.clone();
                tokio::spawn(async move {
                    directory
                        .find_or_create_by_external_id(&new_profile("abc123", Role::User))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().1 {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(directory.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_user_duplicate_external_id() {
        let directory = SqliteDirectory::new_in_memory().await.unwrap();
        let now = Utc::now();

        directory
            .create_user(&UserProfile::from_new(new_profile("abc123", Role::User), now))
            .await
            .unwrap();
        let result = directory
            .create_user(&UserProfile::from_new(new_profile("abc123", Role::User), now))
            .await;

        assert!(matches!(
            result,
            Err(RepositoryError::AlreadyExists { ref id, .. }) if id == "abc123"
        ));
    }

    #[tokio::test]
    async fn test_roundtrip_and_lookups() {
        let directory = SqliteDirectory::new_in_memory().await.unwrap();
        let (profile, _) = directory
            .find_or_create_by_external_id(&new_profile("abc123", Role::Staff))
            .await
            .unwrap();

        let by_id = directory.get_user(profile.id).await.unwrap().unwrap();
        assert_eq!(by_id.external_id, "abc123");
        assert_eq!(by_id.role, Role::Staff);
        assert_eq!(by_id.display_name, "A B");

        assert!(directory.get_user(Uuid::new_v4()).await.unwrap().is_none());
        assert!(directory
            .find_by_external_id("other")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_set_active() {
        let directory = SqliteDirectory::new_in_memory().await.unwrap();
        let (profile, _) = directory
            .find_or_create_by_external_id(&new_profile("abc123", Role::User))
            .await
            .unwrap();

        let updated = directory.set_active(profile.id, false).await.unwrap();
        assert!(!updated.active);

        let missing = directory.set_active(Uuid::new_v4(), true).await;
        assert!(matches!(missing, Err(RepositoryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_users_oldest_first() {
        let directory = SqliteDirectory::new_in_memory().await.unwrap();
        for id in ["first", "second", "third"] {
            directory
                .find_or_create_by_external_id(&new_profile(id, Role::User))
                .await
                .unwrap();
        }

        let users = directory.list_users().await.unwrap();
        let ids: Vec<_> = users.iter().map(|u| u.external_id.as_str()).collect();
        assert_eq!(ids, ["first", "second", "third"]);
    }
}
