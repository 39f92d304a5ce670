//! Identity linking guard.
//!
//! Turns a posted ID token into a linked profile and a session:
//! verify the token, find or create the profile for its subject, check the
//! endpoint's policy, then log the user in. The outcome is a [`Decision`];
//! mapping it to an HTTP response is the handler's job.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use idlink_core::auth::{
    evaluate_policy, new_profile_from_claims, new_session, AuthError as CoreError,
    AuthenticatedUser, Decision, GuardPolicy, IdentityClaims, Session, SessionRepository,
    TokenVerifier,
};
use idlink_core::directory::UserDirectory;
use serde::Deserialize;
use url::Url;

use crate::error::AuthError;

/// Body of an Azure AD `form_post` login response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    pub id_token: Option<String>,
    pub code: Option<String>,
}

/// Per-request authentication context.
///
/// Only populated when the guard allows the request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Authorization code posted alongside the token, if any.
    pub code: Option<String>,
    pub claims: Option<IdentityClaims>,
    pub external_id: Option<String>,
    /// The raw ID token.
    pub token: Option<String>,
    pub user: Option<AuthenticatedUser>,
    pub session: Option<Session>,
}

/// Links verified external identities to directory profiles.
#[derive(Clone)]
pub struct IdentityLinkingGuard {
    verifier: Arc<dyn TokenVerifier>,
    users: Arc<dyn UserDirectory>,
    sessions: Arc<dyn SessionRepository>,
    frontend_url: Url,
    session_ttl: chrono::Duration,
}

impl IdentityLinkingGuard {
    pub fn new(
        verifier: Arc<dyn TokenVerifier>,
        users: Arc<dyn UserDirectory>,
        sessions: Arc<dyn SessionRepository>,
        frontend_url: Url,
        session_ttl: Duration,
    ) -> Self {
        Self {
            verifier,
            users,
            sessions,
            frontend_url,
            session_ttl: chrono::Duration::from_std(session_ttl).unwrap_or(chrono::Duration::MAX),
        }
    }

    /// Runs the linking flow for one login request.
    ///
    /// Bad or missing credentials yield `Decision::Deny`; policy failures yield
    /// `Decision::DenyWithRedirect` and never create a session. `ctx` is only
    /// written on `Decision::Allow`.
    ///
    /// # Errors
    ///
    /// Returns an error when the identity provider, the directory or the
    /// session store fails.
    pub async fn authorize(
        &self,
        ctx: &mut RequestContext,
        form: &LoginForm,
        policy: &GuardPolicy,
    ) -> Result<Decision, AuthError> {
        let Some(token) = form.id_token.as_deref().filter(|t| !t.is_empty()) else {
            tracing::debug!("login without id_token");
            return Ok(Decision::Deny);
        };

        let token_claims = match self.verifier.verify(token).await {
            Ok(claims) => claims,
            Err(CoreError::InvalidToken(reason)) => {
                tracing::debug!(%reason, "id_token rejected");
                return Ok(Decision::Deny);
            }
            Err(e) => return Err(e.into()),
        };

        let claims = match IdentityClaims::try_from(token_claims) {
            Ok(claims) => claims,
            Err(CoreError::MissingClaim(claim)) => {
                tracing::debug!(%claim, "id_token has no subject identifier");
                return Ok(Decision::Deny);
            }
            Err(e) => return Err(e.into()),
        };

        let (profile, created) = self
            .users
            .find_or_create_by_external_id(&new_profile_from_claims(&claims, policy.target_role))
            .await?;

        if created {
            tracing::info!(
                user_id = %profile.id,
                external_id = %profile.external_id,
                role = %profile.role,
                "linked new profile"
            );
        }

        if let Err(violation) = evaluate_policy(&profile, policy.target_role) {
            let url = policy.redirect_url(violation, &self.frontend_url);
            tracing::warn!(
                user_id = %profile.id,
                ?violation,
                target_role = %policy.target_role,
                "login refused by policy"
            );
            return Ok(Decision::DenyWithRedirect(url));
        }

        let session = new_session(profile.id, profile.role, Utc::now(), self.session_ttl);
        self.sessions.create_session(&session).await?;

        let user = AuthenticatedUser::new(&claims, &profile);
        tracing::info!(user_id = %user.id, role = %user.role, "login succeeded");

        ctx.code = form.code.clone();
        ctx.external_id = Some(claims.external_id.clone());
        ctx.claims = Some(claims);
        ctx.token = Some(token.to_string());
        ctx.user = Some(user.clone());
        ctx.session = Some(session);

        Ok(Decision::Allow(user))
    }
}
