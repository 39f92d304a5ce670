//! Azure AD ID token verification against the tenant's published signing keys.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use idlink_core::auth::{AuthError, Result, TokenClaims, TokenVerifier};
use jsonwebtoken::jwk::{AlgorithmParameters, EllipticCurve, Jwk, JwkSet};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use tokio::sync::RwLock;
use url::Url;

use crate::config::AzureConfig;

/// Unknown key ids do not trigger a refetch more often than this.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

type SigningKeys = HashMap<String, (DecodingKey, Algorithm)>;

struct CachedKeys {
    keys: SigningKeys,
    fetched_at: Instant,
}

/// Verifies RS256/ES256 ID tokens with keys from a JWKS endpoint.
///
/// Keys are cached for `jwks_cache_ttl`. A token whose `kid` is not in the
/// cache causes one refetch (key rotation), rate limited by
/// `MIN_REFRESH_INTERVAL`.
pub struct JwksVerifier {
    http_client: reqwest::Client,
    jwks_uri: Url,
    issuer: String,
    audience: String,
    leeway: Duration,
    cache_ttl: Duration,
    cache: RwLock<Option<CachedKeys>>,
}

impl JwksVerifier {
    /// Creates a verifier for the configured tenant. No network I/O happens
    /// until the first token is verified.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        config: &AzureConfig,
        leeway: Duration,
    ) -> std::result::Result<Self, crate::AuthError> {
        // Build HTTP client without redirect following (security requirement)
        let http_client = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                crate::AuthError::Config(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            jwks_uri: config.jwks_uri.clone(),
            issuer: config.issuer.clone(),
            audience: config.client_id.clone(),
            leeway,
            cache_ttl: config.jwks_cache_ttl,
            cache: RwLock::new(None),
        })
    }

    /// Seeds the key cache, as if `key_set` had just been fetched.
    pub fn with_key_set(self, key_set: &JwkSet) -> Self {
        Self {
            cache: RwLock::new(Some(CachedKeys {
                keys: parse_key_set(key_set),
                fetched_at: Instant::now(),
            })),
            ..self
        }
    }

    async fn fetch_keys(&self) -> Result<SigningKeys> {
        tracing::debug!(jwks_uri = %self.jwks_uri, "Fetching signing keys");

        let response = self
            .http_client
            .get(self.jwks_uri.clone())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AuthError::Provider(format!("Failed to fetch JWKS: {}", e)))?;

        if !response.status().is_success() {
            return Err(AuthError::Provider(format!(
                "JWKS fetch failed with status: {}",
                response.status()
            )));
        }

        let key_set: JwkSet = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("Failed to parse JWKS: {}", e)))?;

        Ok(parse_key_set(&key_set))
    }

    async fn signing_key(&self, kid: &str) -> Result<(DecodingKey, Algorithm)> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                let age = cached.fetched_at.elapsed();
                if age < self.cache_ttl {
                    if let Some(key) = cached.keys.get(kid) {
                        return Ok(key.clone());
                    }
                    if age < MIN_REFRESH_INTERVAL {
                        return Err(unknown_kid(kid));
                    }
                }
            }
        }

        let keys = self.fetch_keys().await?;
        let found = keys.get(kid).cloned();
        tracing::debug!(count = keys.len(), "Signing keys refreshed");

        *self.cache.write().await = Some(CachedKeys {
            keys,
            fetched_at: Instant::now(),
        });

        found.ok_or_else(|| unknown_kid(kid))
    }
}

#[async_trait]
impl TokenVerifier for JwksVerifier {
    async fn verify(&self, token: &str) -> Result<TokenClaims> {
        let header = decode_header(token)
            .map_err(|e| AuthError::InvalidToken(format!("Invalid JWT header: {}", e)))?;

        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidToken("JWT missing kid in header".to_string()))?;

        let (key, algorithm) = self.signing_key(&kid).await?;

        if header.alg != algorithm {
            return Err(AuthError::InvalidToken(format!(
                "JWT algorithm {:?} does not match key {} ({:?})",
                header.alg, kid, algorithm
            )));
        }

        let mut validation = Validation::new(algorithm);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.leeway = self.leeway.as_secs();

        decode::<TokenClaims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(format!("JWT validation failed: {}", e)))
    }
}

fn unknown_kid(kid: &str) -> AuthError {
    AuthError::InvalidToken(format!("No signing key found for kid: {}", kid))
}

/// Map a JWK's algorithm parameters to a `jsonwebtoken::Algorithm`.
///
/// Symmetric keys are never accepted from a JWKS.
fn jwk_algorithm(jwk: &Jwk) -> Option<Algorithm> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(_) => Some(Algorithm::RS256),
        AlgorithmParameters::EllipticCurve(params) => match params.curve {
            EllipticCurve::P256 => Some(Algorithm::ES256),
            EllipticCurve::P384 => Some(Algorithm::ES384),
            _ => None,
        },
        AlgorithmParameters::OctetKeyPair(_) => Some(Algorithm::EdDSA),
        AlgorithmParameters::OctetKey(_) => None,
    }
}

fn parse_key_set(key_set: &JwkSet) -> SigningKeys {
    let mut keys = HashMap::new();

    for jwk in &key_set.keys {
        let Some(kid) = &jwk.common.key_id else {
            tracing::warn!("JWK missing kid field, skipping");
            continue;
        };
        let Some(algorithm) = jwk_algorithm(jwk) else {
            tracing::warn!(kid = %kid, "Unsupported JWK algorithm, skipping");
            continue;
        };
        match DecodingKey::from_jwk(jwk) {
            Ok(key) => {
                keys.insert(kid.clone(), (key, algorithm));
            }
            Err(e) => {
                tracing::warn!(kid = %kid, error = %e, "Failed to create decoding key");
            }
        }
    }

    keys
}
