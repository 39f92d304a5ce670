//! HTTP handlers for auth routes.

use axum::{
    extract::{FromRef, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use idlink_core::auth::{AuthError as CoreError, Decision, GuardPolicy, Session};
use idlink_core::directory::UserProfile;

use crate::error::AuthError;
use crate::extractors::{session_id_from_headers, CurrentUser};
use crate::guard::{LoginForm, RequestContext};
use crate::AuthState;

/// Creates the auth router with all authentication routes.
///
/// Routes:
/// - `POST /auth/azure/login` - Link an Azure AD identity to a user profile
/// - `POST /auth/azure/staff/login` - Link an Azure AD identity to a staff profile
/// - `POST /auth/logout` - End current session
/// - `POST /auth/logout-all` - End all sessions for current user
/// - `GET /auth/me` - Get current authenticated user
pub fn auth_routes<S>() -> Router<S>
where
    AuthState: FromRef<S>,
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/auth/azure/login", post(azure_login))
        .route("/auth/azure/staff/login", post(azure_staff_login))
        .route("/auth/logout", post(logout))
        .route("/auth/logout-all", post(logout_all))
        .route("/auth/me", get(me))
}

async fn azure_login(
    State(state): State<AuthState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AuthError> {
    login(&state, jar, &form, &GuardPolicy::user()).await
}

async fn azure_staff_login(
    State(state): State<AuthState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AuthError> {
    login(&state, jar, &form, &GuardPolicy::staff()).await
}

async fn login(
    state: &AuthState,
    jar: CookieJar,
    form: &LoginForm,
    policy: &GuardPolicy,
) -> Result<Response, AuthError> {
    let mut ctx = RequestContext::default();

    match state.guard().authorize(&mut ctx, form, policy).await? {
        Decision::Allow(_) => {
            let session = ctx
                .session
                .ok_or(AuthError::Core(CoreError::SessionNotFound))?;
            let jar = jar.add(session_cookie(state, &session));
            Ok((jar, Redirect::to(state.config.frontend_url.as_str())).into_response())
        }
        Decision::Deny => Ok(StatusCode::FORBIDDEN.into_response()),
        Decision::DenyWithRedirect(url) => Ok(Redirect::to(url.as_str()).into_response()),
    }
}

fn session_cookie(state: &AuthState, session: &Session) -> Cookie<'static> {
    Cookie::build((state.config.cookie_name.clone(), session.id.to_string()))
        .path("/")
        .http_only(true)
        .secure(state.config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(
            state.config.session_ttl.as_secs() as i64
        ))
        .build()
}

fn removal_cookie(state: &AuthState) -> Cookie<'static> {
    Cookie::build(state.config.cookie_name.clone())
        .path("/")
        .build()
}

async fn logout(
    State(state): State<AuthState>,
    CurrentUser(_user): CurrentUser,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<CookieJar, AuthError> {
    if let Some(session_id) = session_id_from_headers(&headers, &state.config.cookie_name) {
        state.sessions.delete_session(&session_id).await?;
    }

    Ok(jar.remove(removal_cookie(&state)))
}

async fn logout_all(
    State(state): State<AuthState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<CookieJar, AuthError> {
    state.sessions.delete_user_sessions(user.id).await?;
    tracing::info!(user_id = %user.id, "ended all sessions");

    Ok(jar.remove(removal_cookie(&state)))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserProfile> {
    Json(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{
        header::{AUTHORIZATION, CONTENT_TYPE, LOCATION, SET_COOKIE},
        Request,
    };
    use http_body_util::BodyExt;
    use idlink_core::directory::Role;
    use serde_json::json;
    use tower::ServiceExt;
    use url::Url;

    use crate::config::{AuthConfig, SharedSecretConfig, VerifierConfig};
    use crate::sessions::InMemorySessionStore;
    use crate::test_support::{self, sign, RecordingDirectory, SECRET};

    struct TestApp {
        router: Router,
        users: Arc<RecordingDirectory>,
        sessions: Arc<InMemorySessionStore>,
    }

    fn test_app() -> TestApp {
        let users = Arc::new(RecordingDirectory::default());
        let sessions = Arc::new(InMemorySessionStore::new());
        let config = AuthConfig {
            verifier: VerifierConfig::SharedSecret(SharedSecretConfig {
                secret: SECRET.to_string(),
                issuer: None,
                audience: None,
            }),
            frontend_url: Url::parse("https://app.example.com").unwrap(),
            session_ttl: Duration::from_secs(3600),
            token_leeway: Duration::from_secs(0),
            cookie_name: "session".to_string(),
            cookie_secure: false,
        };
        let state = AuthState::with_verifier(
            sessions.clone(),
            users.clone(),
            test_support::verifier(),
            config,
        );

        TestApp {
            router: auth_routes().with_state(state),
            users,
            sessions,
        }
    }

    fn login_request(path: &str, body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(path)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    fn token_body(oid: &str) -> String {
        let token = sign(json!({ "oid": oid, "email": "a@x.com", "given_name": "A" }));
        format!("id_token={token}&code=abc")
    }

    fn session_cookie_value(response: &Response) -> String {
        let set_cookie = response
            .headers()
            .get(SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        let pair = set_cookie.split(';').next().unwrap();
        pair.strip_prefix("session=").unwrap().to_string()
    }

    #[tokio::test]
    async fn login_sets_cookie_and_redirects_to_frontend() {
        let app = test_app();

        let response = app
            .router
            .oneshot(login_request("/auth/azure/login", token_body("abc123")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "https://app.example.com/"
        );
        let set_cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Lax"));
        assert_eq!(app.users.creates(), 1);
        assert_eq!(app.sessions.len().await, 1);
    }

    #[tokio::test]
    async fn login_without_token_is_forbidden() {
        let app = test_app();

        let response = app
            .router
            .oneshot(login_request("/auth/azure/login", String::new()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
        assert!(app.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn login_with_bad_token_is_forbidden() {
        let app = test_app();

        let response = app
            .router
            .oneshot(login_request(
                "/auth/azure/login",
                "id_token=garbage".to_string(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(app.users.creates(), 0);
    }

    #[tokio::test]
    async fn staff_login_for_user_profile_redirects_with_query() {
        let app = test_app();
        app.users.seed("abc123", Role::User, true).await;

        let response = app
            .router
            .oneshot(login_request("/auth/azure/staff/login", token_body("abc123")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "https://app.example.com/?invalidRole=true"
        );
        assert!(response.headers().get(SET_COOKIE).is_none());
        assert!(app.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn inactive_user_login_redirects_with_fragment() {
        let app = test_app();
        app.users.seed("abc123", Role::User, false).await;

        let response = app
            .router
            .oneshot(login_request("/auth/azure/login", token_body("abc123")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "https://app.example.com/#USER_NOT_ACTIVE"
        );
    }

    #[tokio::test]
    async fn me_returns_profile_for_session_cookie() {
        let app = test_app();

        let login = app
            .router
            .clone()
            .oneshot(login_request("/auth/azure/login", token_body("abc123")))
            .await
            .unwrap();
        let session_id = session_cookie_value(&login);

        let response = app
            .router
            .oneshot(
                Request::builder()
                    .uri("/auth/me")
                    .header("Cookie", format!("session={session_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let profile: UserProfile = serde_json::from_slice(&body).unwrap();
        assert_eq!(profile.external_id, "abc123");
        assert_eq!(profile.role, Role::User);
    }

    #[tokio::test]
    async fn me_without_session_is_unauthorized() {
        let app = test_app();

        let response = app
            .router
            .oneshot(Request::builder().uri("/auth/me").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_deletes_bearer_session() {
        let app = test_app();

        let login = app
            .router
            .clone()
            .oneshot(login_request("/auth/azure/login", token_body("abc123")))
            .await
            .unwrap();
        let session_id = session_cookie_value(&login);

        let response = app
            .router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/auth/logout")
                    .header(AUTHORIZATION, format!("Bearer {session_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(app.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn logout_all_ends_every_session_of_the_user() {
        let app = test_app();

        let mut session_ids = Vec::new();
        for _ in 0..2 {
            let login = app
                .router
                .clone()
                .oneshot(login_request("/auth/azure/login", token_body("abc123")))
                .await
                .unwrap();
            session_ids.push(session_cookie_value(&login));
        }
        assert_eq!(app.sessions.len().await, 2);

        let response = app
            .router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/auth/logout-all")
                    .header(AUTHORIZATION, format!("Bearer {}", session_ids[0]))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(app.sessions.is_empty().await);
    }
}
