use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use idlink_core::directory::{repository_error_to_status_code, RepositoryError};

use crate::handlers::authz::AuthzError;

/// Application error type that wraps `anyhow::Error`.
///
/// Directory and authorization errors keep their status code; anything else
/// is a 500.
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status_code = if let Some(repo_error) = self.0.downcast_ref::<RepositoryError>() {
            StatusCode::from_u16(repository_error_to_status_code(repo_error))
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        } else if let Some(authz_error) = self.0.downcast_ref::<AuthzError>() {
            authz_error.status_code()
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        if status_code.is_server_error() {
            tracing::error!(error = %self.0, "Application error");
        }

        (status_code, self.0.to_string()).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
