//! Profile administration for staff administrators.

use axum::{
    extract::{Path, State},
    Json,
};
use idlink_core::directory::{RepositoryError, UserProfile};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppError,
    handlers::authz::{require_deactivation_allowed, StaffAdmin},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct SetActive {
    pub active: bool,
}

/// List all profiles (GET /api/staff/users).
pub async fn list_users(
    State(state): State<AppState>,
    StaffAdmin(_admin): StaffAdmin,
) -> Result<Json<Vec<UserProfile>>, AppError> {
    let users = state.auth.users.list_users().await?;
    Ok(Json(users))
}

/// Activate or deactivate a profile (PUT /api/staff/users/{id}/active).
///
/// Deactivation also ends every session of that profile. Administrators
/// cannot deactivate themselves or each other.
pub async fn set_user_active(
    State(state): State<AppState>,
    StaffAdmin(admin): StaffAdmin,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetActive>,
) -> Result<Json<UserProfile>, AppError> {
    if !payload.active {
        let target = state
            .auth
            .users
            .get_user(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound {
                entity_type: "UserProfile",
                id: id.to_string(),
            })?;
        require_deactivation_allowed(&state.config, &admin, &target)?;
    }

    let profile = state.auth.users.set_active(id, payload.active).await?;

    if !profile.active {
        state.auth.sessions.delete_user_sessions(profile.id).await?;
    }

    tracing::info!(
        user_id = %profile.id,
        active = profile.active,
        changed_by = %admin.id,
        "Updated profile active flag"
    );

    Ok(Json(profile))
}
