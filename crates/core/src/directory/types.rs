use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role assigned to a profile when it is first linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Staff,
}

impl Role {
    /// Storage representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Staff => "STAFF",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USER" => Ok(Self::User),
            "STAFF" => Ok(Self::Staff),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Fields needed to create a profile for a previously unseen identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProfile {
    pub external_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub active: bool,
    pub role: Role,
}

/// A persisted user profile linked to an external identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    /// Identity provider subject (`oid` or `sub`). Unique and immutable.
    pub external_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub active: bool,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Materializes a new profile with a fresh internal id.
    pub fn from_new(new: NewProfile, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            external_id: new.external_id,
            email: new.email,
            first_name: new.first_name,
            last_name: new.last_name,
            display_name: new.display_name,
            active: new.active,
            role: new.role,
            created_at: now,
            updated_at: now,
        }
    }
}
