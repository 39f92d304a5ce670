//! Axum extractors for authentication.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use idlink_core::auth::{is_session_expired, SessionId};
use idlink_core::directory::{Role, UserProfile};

use crate::AuthState;

type Rejection = (StatusCode, &'static str);

/// Reads the session id from `Authorization: Bearer <id>` or, failing that,
/// from the session cookie.
pub fn session_id_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<SessionId> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty());

    if let Some(token) = bearer {
        return Some(SessionId::new(token.to_string()));
    }

    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|cookie| SessionId::new(cookie.value().to_string()))
}

async fn resolve_user(parts: &Parts, auth_state: &AuthState) -> Result<UserProfile, Rejection> {
    let session_id = session_id_from_headers(&parts.headers, &auth_state.config.cookie_name)
        .ok_or((StatusCode::UNAUTHORIZED, "No session"))?;

    let session = auth_state
        .sessions
        .get_session(&session_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "session lookup failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Session lookup failed")
        })?
        .ok_or((StatusCode::UNAUTHORIZED, "Session not found"))?;

    if is_session_expired(&session, Utc::now()) {
        return Err((StatusCode::UNAUTHORIZED, "Session expired"));
    }

    let user = auth_state
        .users
        .get_user(session.user_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "user lookup failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "User lookup failed")
        })?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found"))?;

    if !user.active {
        return Err((StatusCode::UNAUTHORIZED, "User not active"));
    }

    Ok(user)
}

/// Extractor for authenticated user. Returns 401 if not authenticated.
pub struct CurrentUser(pub UserProfile);

impl<S> FromRequestParts<S> for CurrentUser
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        resolve_user(parts, &auth_state).await.map(CurrentUser)
    }
}

/// Extractor for optionally authenticated user. Returns None if not authenticated.
pub struct OptionalUser(pub Option<UserProfile>);

impl<S> FromRequestParts<S> for OptionalUser
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        Ok(OptionalUser(resolve_user(parts, &auth_state).await.ok()))
    }
}

/// Extractor for an authenticated staff member. Returns 401 if not
/// authenticated and 403 for any other role.
pub struct CurrentStaff(pub UserProfile);

impl<S> FromRequestParts<S> for CurrentStaff
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        let user = resolve_user(parts, &auth_state).await?;

        if user.role != Role::Staff {
            return Err((StatusCode::FORBIDDEN, "Staff only"));
        }

        Ok(CurrentStaff(user))
    }
}
