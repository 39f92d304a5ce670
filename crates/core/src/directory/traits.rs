use async_trait::async_trait;
use uuid::Uuid;

use super::{NewProfile, Result, UserProfile};

/// Persistent store of user profiles keyed by internal id and external identity.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Gets a profile by its internal ID.
    async fn get_user(&self, id: Uuid) -> Result<Option<UserProfile>>;

    /// Gets a profile by the identity provider's subject identifier.
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<UserProfile>>;

    /// Creates a new profile.
    ///
    /// Returns `AlreadyExists` if a profile with the same external id is present.
    async fn create_user(&self, profile: &UserProfile) -> Result<()>;

    /// Returns the profile linked to `new.external_id`, creating it from `new`
    /// when none exists. The boolean is `true` when this call created it.
    ///
    /// Implementations must make lookup and insert a single atomic step so that
    /// concurrent first logins for one identity yield exactly one profile.
    async fn find_or_create_by_external_id(
        &self,
        new: &NewProfile,
    ) -> Result<(UserProfile, bool)>;

    /// Lists all profiles, oldest first.
    async fn list_users(&self) -> Result<Vec<UserProfile>>;

    /// Activates or deactivates a profile and returns the updated record.
    async fn set_active(&self, id: Uuid, active: bool) -> Result<UserProfile>;
}
