//! HS256 verifier backed by a shared secret.

use std::time::Duration;

use async_trait::async_trait;
use idlink_core::auth::{AuthError, Result, TokenClaims, TokenVerifier};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::config::SharedSecretConfig;

/// Verifies tokens signed with a shared HS256 secret.
///
/// Meant for local development without an Azure tenant; signature and `exp`
/// are always checked, issuer and audience only when configured.
pub struct SharedSecretVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl SharedSecretVerifier {
    pub fn new(config: &SharedSecretConfig, leeway: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway.as_secs();

        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }

        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl TokenVerifier for SharedSecretVerifier {
    async fn verify(&self, token: &str) -> Result<TokenClaims> {
        decode::<TokenClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}
