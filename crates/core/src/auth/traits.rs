use async_trait::async_trait;
use uuid::Uuid;

use super::{AuthError, Session, SessionId, TokenClaims};

/// Result type for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Verifies an ID token against its issuer before any claim is trusted.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify signature, expiry, issuer and audience and return the claims.
    ///
    /// Returns `InvalidToken` when the token itself is bad and `Provider` when
    /// verification could not be attempted (e.g. signing keys unavailable).
    async fn verify(&self, token: &str) -> Result<TokenClaims>;
}

/// Session storage abstraction.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Store a new session.
    async fn create_session(&self, session: &Session) -> Result<()>;

    /// Retrieve session by ID.
    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>>;

    /// Delete a specific session.
    async fn delete_session(&self, id: &SessionId) -> Result<()>;

    /// Delete all sessions for a user (logout-all).
    async fn delete_user_sessions(&self, user_id: Uuid) -> Result<()>;
}
