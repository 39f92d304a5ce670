//! ID token verifiers.
//!
//! This module contains implementations of `TokenVerifier` for:
//! - Azure AD (signing keys fetched from the tenant's JWKS endpoint)
//! - A shared HS256 secret for local development and tests

mod jwks;
mod shared_secret;

use std::sync::Arc;

use idlink_core::auth::TokenVerifier;

pub use jwks::JwksVerifier;
pub use shared_secret::SharedSecretVerifier;

use crate::config::{AuthConfig, VerifierConfig};
use crate::error::AuthError;

/// Builds the verifier selected by the configuration.
///
/// # Errors
///
/// Returns an error if the HTTP client for JWKS retrieval cannot be built.
pub fn build_verifier(config: &AuthConfig) -> Result<Arc<dyn TokenVerifier>, AuthError> {
    match &config.verifier {
        VerifierConfig::Azure(azure) => {
            tracing::info!(
                tenant = %azure.tenant_id,
                jwks_uri = %azure.jwks_uri,
                "Verifying ID tokens against Azure AD signing keys"
            );
            Ok(Arc::new(JwksVerifier::new(azure, config.token_leeway)?))
        }
        VerifierConfig::SharedSecret(shared) => {
            tracing::warn!("Verifying ID tokens with a shared development secret");
            Ok(Arc::new(SharedSecretVerifier::new(shared, config.token_leeway)))
        }
    }
}
