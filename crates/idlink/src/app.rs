use axum::{
    http::StatusCode,
    routing::{get, put},
    Router,
};
use idlink_auth::auth_routes;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{
    handlers::{
        health::livez,
        staff::{list_users, set_user_active},
    },
    state::AppState,
};

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    let timeout = state.config.request_timeout();

    let staff_routes = Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}/active", put(set_user_active));

    Router::new()
        .route("/livez", get(livez))
        .merge(auth_routes())
        .nest("/api/staff", staff_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .with_state(state)
}
