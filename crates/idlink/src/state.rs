//! Application state.
//!
//! Wires the directory and session backends selected by feature flags into
//! the auth state shared by every handler.

use std::sync::Arc;

use idlink_auth::{AuthConfig, AuthState};
use idlink_core::auth::SessionRepository;
use idlink_core::directory::UserDirectory;

use crate::config::Config;

// Session features: at most one may be enabled (neither means in-memory)
#[cfg(all(feature = "auth-sqlite", feature = "auth-redis"))]
compile_error!("Cannot enable both 'auth-sqlite' and 'auth-redis' session features");

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub config: Config,
}

impl AppState {
    /// Builds the state from configuration, opening the selected backends.
    ///
    /// # Errors
    ///
    /// Returns an error if a backend cannot be opened or the token verifier
    /// cannot be built.
    pub async fn new(config: Config, auth_config: AuthConfig) -> anyhow::Result<Self> {
        let users = build_directory(&config).await?;
        let sessions = build_sessions(&config, &auth_config).await?;
        let auth = AuthState::new(sessions, users, auth_config)?;

        Ok(Self::from_parts(auth, config))
    }

    pub fn from_parts(auth: AuthState, config: Config) -> Self {
        Self { auth, config }
    }
}

impl AsRef<AuthState> for AppState {
    fn as_ref(&self) -> &AuthState {
        &self.auth
    }
}

#[cfg(feature = "inmemory")]
async fn build_directory(_config: &Config) -> anyhow::Result<Arc<dyn UserDirectory>> {
    tracing::warn!("Using in-memory user directory; profiles are lost on restart");
    Ok(Arc::new(crate::storage::InMemoryDirectory::new()))
}

#[cfg(feature = "sqlite")]
async fn build_directory(config: &Config) -> anyhow::Result<Arc<dyn UserDirectory>> {
    tracing::info!(path = %config.sqlite_path, "Opening SQLite user directory");
    let directory = crate::storage::SqliteDirectory::new(&config.sqlite_path).await?;
    Ok(Arc::new(directory))
}

#[cfg(feature = "auth-sqlite")]
async fn build_sessions(
    config: &Config,
    _auth_config: &AuthConfig,
) -> anyhow::Result<Arc<dyn SessionRepository>> {
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};

    tracing::info!(path = %config.sqlite_path, "Using SQLite session store");
    let options = SqliteConnectOptions::new()
        .filename(&config.sqlite_path)
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await?;

    let store = idlink_auth::SqliteSessionStore::new(pool);
    store.migrate().await?;
    Ok(Arc::new(store))
}

#[cfg(feature = "auth-redis")]
async fn build_sessions(
    config: &Config,
    auth_config: &AuthConfig,
) -> anyhow::Result<Arc<dyn SessionRepository>> {
    use fred::prelude::{Builder, ClientLike, Config as RedisConfig};

    tracing::info!("Using Redis session store");
    let redis_config = RedisConfig::from_url(&config.redis_url)?;
    let pool = Builder::from_config(redis_config).build_pool(4)?;
    pool.init().await?;

    Ok(Arc::new(idlink_auth::RedisSessionStore::new(
        pool,
        auth_config.session_ttl,
    )))
}

#[cfg(not(any(feature = "auth-sqlite", feature = "auth-redis")))]
async fn build_sessions(
    _config: &Config,
    _auth_config: &AuthConfig,
) -> anyhow::Result<Arc<dyn SessionRepository>> {
    tracing::warn!("Using in-memory session store; sessions are lost on restart");
    Ok(Arc::new(idlink_auth::InMemorySessionStore::new()))
}
