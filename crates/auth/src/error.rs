use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Auth errors for the idlink_auth crate.
///
/// This wraps the core `AuthError` and adds crate-specific error variants
/// for failures that only exist in the shell.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Error from the core auth module (token, claims, storage, provider).
    #[error(transparent)]
    Core(#[from] idlink_core::auth::AuthError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<idlink_core::directory::RepositoryError> for AuthError {
    fn from(err: idlink_core::directory::RepositoryError) -> Self {
        Self::Core(err.into())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        use idlink_core::auth::AuthError as CoreError;

        let (status, message) = match &self {
            AuthError::Core(core_err) => match core_err {
                CoreError::SessionNotFound | CoreError::SessionExpired => {
                    (StatusCode::UNAUTHORIZED, self.to_string())
                }
                CoreError::InvalidToken(_) | CoreError::MissingClaim(_) => {
                    (StatusCode::UNAUTHORIZED, self.to_string())
                }
                CoreError::Storage(_) => {
                    tracing::error!("Auth error: {}", self);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
                CoreError::Provider(_) => {
                    tracing::error!("Identity provider error: {}", self);
                    (
                        StatusCode::BAD_GATEWAY,
                        "Authentication provider error".to_string(),
                    )
                }
            },
            AuthError::Config(_) => {
                tracing::error!("Config error: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server configuration error".to_string(),
                )
            }
        };

        (status, message).into_response()
    }
}
