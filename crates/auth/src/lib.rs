//! Identity linking and session authentication for idlink.
//!
//! This crate provides:
//! - ID token verification (Azure AD JWKS or a shared development secret)
//! - The identity linking guard behind the Azure login endpoints
//! - Session storage (in-memory, SQLite or Redis via feature flags)
//! - Axum extractors for authentication

mod config;
mod error;
mod extractors;
mod guard;
mod handlers;
mod sessions;
mod state;
mod verifiers;

#[cfg(test)]
mod test_support;

pub use config::{AuthConfig, AzureConfig, SharedSecretConfig, VerifierConfig};
pub use error::AuthError;
pub use extractors::{session_id_from_headers, CurrentStaff, CurrentUser, OptionalUser};
pub use guard::{IdentityLinkingGuard, LoginForm, RequestContext};
pub use handlers::auth_routes;
pub use sessions::InMemorySessionStore;
#[cfg(feature = "redis")]
pub use sessions::RedisSessionStore;
#[cfg(feature = "sqlite")]
pub use sessions::SqliteSessionStore;
pub use state::AuthState;
pub use verifiers::{build_verifier, JwksVerifier, SharedSecretVerifier};
