//! In-memory directory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use idlink_core::directory::{NewProfile, RepositoryError, Result, UserDirectory, UserProfile};

#[derive(Debug, Default)]
struct Profiles {
    by_id: HashMap<Uuid, UserProfile>,
    /// external id -> internal id
    by_external_id: HashMap<String, Uuid>,
}

impl Profiles {
    fn insert(&mut self, profile: UserProfile) {
        self.by_external_id
            .insert(profile.external_id.clone(), profile.id);
        self.by_id.insert(profile.id, profile);
    }

    fn find_by_external_id(&self, external_id: &str) -> Option<&UserProfile> {
        self.by_external_id
            .get(external_id)
            .and_then(|id| self.by_id.get(id))
    }
}

/// In-memory user directory.
///
/// Both indexes live behind a single lock, so `find_or_create_by_external_id`
/// performs its lookup and insert under one write guard.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    profiles: Arc<RwLock<Profiles>>,
}

impl InMemoryDirectory {
    /// Creates a new empty directory.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn get_user(&self, id: Uuid) -> Result<Option<UserProfile>> {
        let profiles = self.profiles.read().await;
        Ok(profiles.by_id.get(&id).cloned())
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<UserProfile>> {
        let profiles = self.profiles.read().await;
        Ok(profiles.find_by_external_id(external_id).cloned())
    }

    async fn create_user(&self, profile: &UserProfile) -> Result<()> {
        let mut profiles = self.profiles.write().await;
        if profiles.by_external_id.contains_key(&profile.external_id) {
            return Err(RepositoryError::AlreadyExists {
                entity_type: "UserProfile",
                id: profile.external_id.clone(),
            });
        }
        if profiles.by_id.contains_key(&profile.id) {
            return Err(RepositoryError::AlreadyExists {
                entity_type: "UserProfile",
                id: profile.id.to_string(),
            });
        }
        profiles.insert(profile.clone());
        Ok(())
    }

    async fn find_or_create_by_external_id(&self, new: &NewProfile) -> Result<(UserProfile, bool)> {
        let mut profiles = self.profiles.write().await;
        if let Some(existing) = profiles.find_by_external_id(&new.external_id) {
            return Ok((existing.clone(), false));
        }

        let profile = UserProfile::from_new(new.clone(), Utc::now());
        profiles.insert(profile.clone());
        Ok((profile, true))
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>> {
        let profiles = self.profiles.read().await;
        let mut users: Vec<UserProfile> = profiles.by_id.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<UserProfile> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .by_id
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound {
                entity_type: "UserProfile",
                id: id.to_string(),
            })?;
        profile.active = active;
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }
}
