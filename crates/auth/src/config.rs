use std::time::Duration;

use url::Url;

use crate::error::AuthError;

const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
const DEFAULT_SESSION_TTL_DAYS: u64 = 7;
const MAX_SESSION_TTL_DAYS: u64 = 365;
const DEFAULT_LEEWAY_SECS: u64 = 60;
const DEFAULT_JWKS_CACHE_TTL_SECS: u64 = 3600;

/// Azure AD (Entra ID) tenant configuration for JWKS verification.
#[derive(Debug, Clone)]
pub struct AzureConfig {
    pub tenant_id: String,
    /// Expected `aud` claim.
    pub client_id: String,
    /// Expected `iss` claim.
    pub issuer: String,
    pub jwks_uri: Url,
    pub jwks_cache_ttl: Duration,
}

/// Shared-secret (HS256) verification for local development.
#[derive(Debug, Clone)]
pub struct SharedSecretConfig {
    pub secret: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

/// How incoming ID tokens are verified.
#[derive(Debug, Clone)]
pub enum VerifierConfig {
    Azure(AzureConfig),
    SharedSecret(SharedSecretConfig),
}

/// Complete auth configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub verifier: VerifierConfig,
    /// Base URL of the frontend; policy redirects and successful logins land here.
    pub frontend_url: Url,
    pub session_ttl: Duration,
    /// Clock skew tolerated when checking `exp`.
    pub token_leeway: Duration,
    pub cookie_name: String,
    pub cookie_secure: bool,
}

impl AuthConfig {
    /// Load from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `FRONTEND_URL`: Frontend base URL (default: `http://localhost:3000`)
    /// - `AZURE_TENANT_ID` / `AZURE_CLIENT_ID`: Enable Azure AD verification (both required)
    /// - `AZURE_ISSUER`: Expected issuer (default: `https://login.microsoftonline.com/{tenant}/v2.0`)
    /// - `AZURE_JWKS_URI`: Signing keys (default: `https://login.microsoftonline.com/{tenant}/discovery/v2.0/keys`)
    /// - `JWKS_CACHE_TTL_SECS`: How long fetched keys are reused (default: 3600)
    /// - `DEV_TOKEN_SECRET`: HS256 secret, used when Azure is not configured
    /// - `DEV_TOKEN_ISSUER` / `DEV_TOKEN_AUDIENCE`: Optional claims checked with the secret
    /// - `SESSION_TTL_DAYS`: Session TTL in days, 1 to 365 (default: 7)
    /// - `TOKEN_LEEWAY_SECS`: Allowed clock skew (default: 60)
    /// - `COOKIE_SECURE`: Whether to set secure flag on cookies (default: true)
    ///
    /// # Errors
    ///
    /// Returns an error if a URL or number is malformed, if the session TTL is
    /// out of range, if Azure is partially configured, or if no verifier is
    /// configured at all.
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. `from_env` delegates here.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let frontend_url = parse_url(
            "FRONTEND_URL",
            &lookup("FRONTEND_URL").unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
        )?;

        let verifier = match (lookup("AZURE_TENANT_ID"), lookup("AZURE_CLIENT_ID")) {
            (Some(tenant_id), Some(client_id)) => {
                let issuer = lookup("AZURE_ISSUER").unwrap_or_else(|| {
                    format!("https://login.microsoftonline.com/{tenant_id}/v2.0")
                });
                let jwks_uri = parse_url(
                    "AZURE_JWKS_URI",
                    &lookup("AZURE_JWKS_URI").unwrap_or_else(|| {
                        format!("https://login.microsoftonline.com/{tenant_id}/discovery/v2.0/keys")
                    }),
                )?;
                let jwks_cache_ttl = Duration::from_secs(parse_u64(
                    &lookup,
                    "JWKS_CACHE_TTL_SECS",
                    DEFAULT_JWKS_CACHE_TTL_SECS,
                )?);

                VerifierConfig::Azure(AzureConfig {
                    tenant_id,
                    client_id,
                    issuer,
                    jwks_uri,
                    jwks_cache_ttl,
                })
            }
            (Some(_), None) => {
                return Err(AuthError::Config(
                    "AZURE_TENANT_ID is set but AZURE_CLIENT_ID is missing".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(AuthError::Config(
                    "AZURE_CLIENT_ID is set but AZURE_TENANT_ID is missing".to_string(),
                ))
            }
            (None, None) => match lookup("DEV_TOKEN_SECRET") {
                Some(secret) if !secret.is_empty() => {
                    VerifierConfig::SharedSecret(SharedSecretConfig {
                        secret,
                        issuer: lookup("DEV_TOKEN_ISSUER"),
                        audience: lookup("DEV_TOKEN_AUDIENCE"),
                    })
                }
                _ => {
                    return Err(AuthError::Config(
                        "no token verifier configured: set AZURE_TENANT_ID and AZURE_CLIENT_ID, \
                         or DEV_TOKEN_SECRET"
                            .to_string(),
                    ))
                }
            },
        };

        let session_ttl_days = parse_u64(&lookup, "SESSION_TTL_DAYS", DEFAULT_SESSION_TTL_DAYS)?;
        if !(1..=MAX_SESSION_TTL_DAYS).contains(&session_ttl_days) {
            return Err(AuthError::Config(format!(
                "SESSION_TTL_DAYS must be between 1 and {MAX_SESSION_TTL_DAYS}, got {session_ttl_days}"
            )));
        }
        let session_ttl = session_ttl_days
            .checked_mul(24 * 60 * 60)
            .map(Duration::from_secs)
            .ok_or_else(|| AuthError::Config("SESSION_TTL_DAYS is too large".to_string()))?;

        let token_leeway =
            Duration::from_secs(parse_u64(&lookup, "TOKEN_LEEWAY_SECS", DEFAULT_LEEWAY_SECS)?);

        let cookie_secure = lookup("COOKIE_SECURE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(true);

        Ok(Self {
            verifier,
            frontend_url,
            session_ttl,
            token_leeway,
            cookie_name: "session".to_string(),
            cookie_secure,
        })
    }
}

fn parse_url(key: &str, value: &str) -> Result<Url, AuthError> {
    value
        .parse()
        .map_err(|e| AuthError::Config(format!("{key} must be a valid URL: {e}")))
}

fn parse_u64<F>(lookup: &F, key: &str, default: u64) -> Result<u64, AuthError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value.trim().parse::<u64>().map_err(|e| {
            AuthError::Config(format!("{key} must be a non-negative integer, got {value:?}: {e}"))
        }),
        None => Ok(default),
    }
}
