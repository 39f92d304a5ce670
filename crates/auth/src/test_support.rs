//! Fakes shared by the crate's tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use idlink_core::directory::{NewProfile, RepositoryError, Result, Role, UserDirectory, UserProfile};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::json;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::SharedSecretConfig;
use crate::verifiers::SharedSecretVerifier;

pub const SECRET: &str = "test-secret";

pub fn verifier() -> Arc<SharedSecretVerifier> {
    Arc::new(SharedSecretVerifier::new(
        &SharedSecretConfig {
            secret: SECRET.to_string(),
            issuer: None,
            audience: None,
        },
        Duration::from_secs(0),
    ))
}

/// Signs `claims` with [`SECRET`], adding an `exp` five minutes out.
pub fn sign(mut claims: serde_json::Value) -> String {
    claims["exp"] = json!(Utc::now().timestamp() + 300);
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

/// Directory fake that counts the profiles it creates.
#[derive(Default)]
pub struct RecordingDirectory {
    profiles: Mutex<HashMap<String, UserProfile>>,
    creates: AtomicUsize,
}

impl RecordingDirectory {
    pub async fn seed(&self, external_id: &str, role: Role, active: bool) -> UserProfile {
        let profile = UserProfile::from_new(
            NewProfile {
                external_id: external_id.to_string(),
                email: "seed@x.com".to_string(),
                first_name: "Seed".to_string(),
                last_name: "User".to_string(),
                display_name: "Seed User".to_string(),
                active,
                role,
            },
            Utc::now(),
        );
        self.profiles
            .lock()
            .await
            .insert(external_id.to_string(), profile.clone());
        profile
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserDirectory for RecordingDirectory {
    async fn get_user(&self, id: Uuid) -> Result<Option<UserProfile>> {
        let profiles = self.profiles.lock().await;
        Ok(profiles.values().find(|p| p.id == id).cloned())
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<UserProfile>> {
        Ok(self.profiles.lock().await.get(external_id).cloned())
    }

    async fn create_user(&self, profile: &UserProfile) -> Result<()> {
        let mut profiles = self.profiles.lock().await;
        if profiles.contains_key(&profile.external_id) {
            return Err(RepositoryError::AlreadyExists {
                entity_type: "UserProfile",
                id: profile.external_id.clone(),
            });
        }
        self.creates.fetch_add(1, Ordering::SeqCst);
        profiles.insert(profile.external_id.clone(), profile.clone());
        Ok(())
    }

    async fn find_or_create_by_external_id(&self, new: &NewProfile) -> Result<(UserProfile, bool)> {
        let mut profiles = self.profiles.lock().await;
        if let Some(existing) = profiles.get(&new.external_id) {
            return Ok((existing.clone(), false));
        }
        // Yield while holding the lock so concurrent callers really overlap.
        tokio::task::yield_now().await;
        let profile = UserProfile::from_new(new.clone(), Utc::now());
        self.creates.fetch_add(1, Ordering::SeqCst);
        profiles.insert(new.external_id.clone(), profile.clone());
        Ok((profile, true))
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>> {
        Ok(self.profiles.lock().await.values().cloned().collect())
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<UserProfile> {
        let mut profiles = self.profiles.lock().await;
        let profile = profiles
            .values_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| RepositoryError::NotFound {
                entity_type: "UserProfile",
                id: id.to_string(),
            })?;
        profile.active = active;
        Ok(profile.clone())
    }
}
