use std::{env, time::Duration};

/// Application configuration loaded from environment variables.
///
/// Auth settings live in `idlink_auth::AuthConfig`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file (default: "idlink.db")
    /// Note: Only used by the `sqlite` and `auth-sqlite` features.
    #[cfg_attr(not(any(feature = "sqlite", feature = "auth-sqlite")), allow(dead_code))]
    pub sqlite_path: String,
    /// Redis connection URL (default: "redis://localhost:6379")
    /// Note: Only used when the `auth-redis` feature is enabled.
    #[cfg_attr(not(feature = "auth-redis"), allow(dead_code))]
    pub redis_url: String,
    /// Request timeout in seconds (default: 10)
    pub request_timeout_secs: u64,
    /// External ids allowed to use the staff administration routes.
    ///
    /// Holding the staff role is not enough: anyone in the tenant can obtain
    /// it by logging in through the staff portal first.
    pub staff_admin_ids: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SQLITE_PATH` - SQLite database path (default: "idlink.db")
    /// - `REDIS_URL` - Redis connection URL (default: "redis://localhost:6379")
    /// - `REQUEST_TIMEOUT_SECS` - Request timeout in seconds (default: 10)
    /// - `STAFF_ADMIN_IDS` - Comma-separated external ids of staff administrators (default: none)
    pub fn from_env() -> Self {
        Self {
            sqlite_path: env::var("SQLITE_PATH").unwrap_or_else(|_| "idlink.db".to_string()),
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            staff_admin_ids: env::var("STAFF_ADMIN_IDS")
                .map(|v| parse_id_list(&v))
                .unwrap_or_default(),
        }
    }

    /// Whether `external_id` may administer profiles.
    pub fn is_staff_admin(&self, external_id: &str) -> bool {
        self.staff_admin_ids.iter().any(|id| id == external_id)
    }

    /// Get the request timeout as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_id_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
