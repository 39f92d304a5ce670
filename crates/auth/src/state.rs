//! Application state for auth.

use std::sync::Arc;

use axum::extract::FromRef;
use idlink_core::auth::{SessionRepository, TokenVerifier};
use idlink_core::directory::UserDirectory;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::guard::IdentityLinkingGuard;
use crate::verifiers::build_verifier;

/// Shared state for auth handlers and extractors.
pub struct AuthState {
    pub sessions: Arc<dyn SessionRepository>,
    pub users: Arc<dyn UserDirectory>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub config: AuthConfig,
}

impl AuthState {
    /// Creates a new AuthState, building the token verifier from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the verifier cannot be initialized.
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        users: Arc<dyn UserDirectory>,
        config: AuthConfig,
    ) -> Result<Self, AuthError> {
        let verifier = build_verifier(&config)?;
        Ok(Self::with_verifier(sessions, users, verifier, config))
    }

    /// Creates a new AuthState around an already-built verifier.
    pub fn with_verifier(
        sessions: Arc<dyn SessionRepository>,
        users: Arc<dyn UserDirectory>,
        verifier: Arc<dyn TokenVerifier>,
        config: AuthConfig,
    ) -> Self {
        Self {
            sessions,
            users,
            verifier,
            config,
        }
    }

    /// The identity linking guard over this state's collaborators.
    pub fn guard(&self) -> IdentityLinkingGuard {
        IdentityLinkingGuard::new(
            self.verifier.clone(),
            self.users.clone(),
            self.sessions.clone(),
            self.config.frontend_url.clone(),
            self.config.session_ttl,
        )
    }
}

impl Clone for AuthState {
    fn clone(&self) -> Self {
        Self {
            sessions: self.sessions.clone(),
            users: self.users.clone(),
            verifier: self.verifier.clone(),
            config: self.config.clone(),
        }
    }
}

/// Allows AuthState to be extracted from a parent state.
impl<S> FromRef<S> for AuthState
where
    S: AsRef<AuthState>,
{
    fn from_ref(state: &S) -> Self {
        state.as_ref().clone()
    }
}
