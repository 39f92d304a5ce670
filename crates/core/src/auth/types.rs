use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::directory::{Role, UserProfile};

use super::AuthError;

/// Cryptographically random session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Authenticated user session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: Uuid,
    /// Role of the profile at login time.
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Claim payload of a verified ID token.
///
/// Only the claims the linking flow reads are kept; everything else in the
/// token is ignored during deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Azure AD object id. Preferred subject identifier.
    pub oid: Option<String>,
    pub sub: Option<String>,
    pub email: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub name: Option<String>,
}

/// Identity resolved from a verified token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// `oid`, falling back to `sub`.
    pub external_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
}

impl TryFrom<TokenClaims> for IdentityClaims {
    type Error = AuthError;

    fn try_from(claims: TokenClaims) -> Result<Self, Self::Error> {
        let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());

        let external_id = non_empty(claims.oid)
            .or_else(|| non_empty(claims.sub))
            .ok_or_else(|| AuthError::MissingClaim("oid".to_string()))?;

        Ok(Self {
            external_id,
            email: claims.email.unwrap_or_default(),
            first_name: claims.given_name.unwrap_or_default(),
            last_name: claims.family_name.unwrap_or_default(),
            display_name: claims.name.unwrap_or_default(),
        })
    }
}

/// The user view attached to a request once linking succeeds: the token's
/// claims plus the internal id and role of the linked profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub external_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub active: bool,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn new(claims: &IdentityClaims, profile: &UserProfile) -> Self {
        Self {
            id: profile.id,
            external_id: claims.external_id.clone(),
            email: claims.email.clone(),
            first_name: claims.first_name.clone(),
            last_name: claims.last_name.clone(),
            display_name: claims.display_name.clone(),
            active: profile.active,
            role: profile.role,
        }
    }
}

/// Outcome of running the identity linking guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Linking succeeded and a session was established.
    Allow(AuthenticatedUser),
    /// The credential was missing or could not be verified.
    Deny,
    /// A policy check failed; the caller should redirect to this URL.
    DenyWithRedirect(Url),
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow(_))
    }
}
