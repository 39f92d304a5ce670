use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid ID token: {0}")]
    InvalidToken(String),

    #[error("missing required claim: {0}")]
    MissingClaim(String),

    #[error("session not found")]
    SessionNotFound,

    #[error("session expired")]
    SessionExpired,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("provider error: {0}")]
    Provider(String),
}

impl From<crate::directory::RepositoryError> for AuthError {
    fn from(err: crate::directory::RepositoryError) -> Self {
        Self::Storage(err.to_string())
    }
}
