//! SQLite row conversion functions.
//!
//! Pure functions for converting between SQLite rows and domain types.

use chrono::{DateTime, SecondsFormat, Utc};
use idlink_core::directory::{Role, UserProfile};
use rusqlite::Row;
use uuid::Uuid;

/// Convert a SQLite row to a UserProfile.
///
/// Expected columns: id, external_id, email, first_name, last_name,
/// display_name, active, role, created_at, updated_at
pub fn row_to_profile(row: &Row) -> rusqlite::Result<UserProfile> {
    let id: String = row.get(0)?;
    let role: String = row.get(7)?;
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;

    Ok(UserProfile {
        id: parse_uuid(&id)?,
        external_id: row.get(1)?,
        email: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        display_name: row.get(5)?,
        active: row.get(6)?,
        role: parse_role(&role)?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

fn conversion_error(
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
}

/// Parse a UUID from string.
fn parse_uuid(s: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s).map_err(conversion_error)
}

/// Parse a datetime from RFC 3339 string.
fn parse_datetime(s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(conversion_error)
}

fn parse_role(s: &str) -> rusqlite::Result<Role> {
    s.parse::<Role>().map_err(|e| {
        conversion_error(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}

/// Format a DateTime for SQLite storage.
///
/// Fixed-width RFC 3339 so that text ordering matches time ordering.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}
