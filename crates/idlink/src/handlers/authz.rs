//! Authorization for the staff administration routes.
//!
//! The staff role alone does not grant administration: the caller's external
//! id must also be listed in `STAFF_ADMIN_IDS`.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use idlink_auth::CurrentStaff;
use idlink_core::directory::UserProfile;
use thiserror::Error;
use uuid::Uuid;

use crate::{config::Config, state::AppState};

/// Authorization failure for staff administration.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Caller is staff but not a configured administrator.
    #[error("Staff administrators only")]
    NotStaffAdmin { user_id: Uuid },
    /// Caller tried to deactivate their own profile.
    #[error("Cannot deactivate your own profile")]
    SelfDeactivation { user_id: Uuid },
    /// Target profile belongs to another administrator.
    #[error("Cannot deactivate a staff administrator")]
    ProtectedProfile { user_id: Uuid, target: Uuid },
}

impl AuthzError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotStaffAdmin { .. } | Self::ProtectedProfile { .. } => StatusCode::FORBIDDEN,
            Self::SelfDeactivation { .. } => StatusCode::CONFLICT,
        }
    }

    fn log(&self) {
        match self {
            Self::NotStaffAdmin { user_id } => {
                tracing::warn!(user_id = %user_id, "Authorization denied: not a staff administrator");
            }
            Self::SelfDeactivation { user_id } => {
                tracing::warn!(user_id = %user_id, "Refused self-deactivation");
            }
            Self::ProtectedProfile { user_id, target } => {
                tracing::warn!(
                    user_id = %user_id,
                    target = %target,
                    "Refused deactivation of a staff administrator"
                );
            }
        }
    }
}

impl IntoResponse for AuthzError {
    fn into_response(self) -> Response {
        self.log();
        (self.status_code(), self.to_string()).into_response()
    }
}

/// Extractor for a staff member listed in `STAFF_ADMIN_IDS`.
///
/// 401 without a valid session, 403 for non-staff and for staff that are not
/// administrators.
pub struct StaffAdmin(pub UserProfile);

impl FromRequestParts<AppState> for StaffAdmin {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentStaff(staff) = CurrentStaff::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        if !state.config.is_staff_admin(&staff.external_id) {
            return Err(AuthzError::NotStaffAdmin { user_id: staff.id }.into_response());
        }

        Ok(StaffAdmin(staff))
    }
}

/// Checks that `admin` may deactivate `target`.
pub fn require_deactivation_allowed(
    config: &Config,
    admin: &UserProfile,
    target: &UserProfile,
) -> Result<(), AuthzError> {
    if admin.id == target.id {
        let err = AuthzError::SelfDeactivation { user_id: admin.id };
        err.log();
        return Err(err);
    }

    if config.is_staff_admin(&target.external_id) {
        let err = AuthzError::ProtectedProfile {
            user_id: admin.id,
            target: target.id,
        };
        err.log();
        return Err(err);
    }

    Ok(())
}
