//! SQLite schema definitions and SQL query constants.
//!
//! Pure data, no I/O.

/// SQL statement to create all tables.
pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    external_id TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    display_name TEXT NOT NULL,
    active INTEGER NOT NULL,
    role TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_users_created_at ON users(created_at);
"#;

pub const INSERT_USER: &str = r#"
INSERT INTO users (id, external_id, email, first_name, last_name, display_name, active, role, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
"#;

/// Inserts unless the external id is already linked; the caller reads the
/// surviving row back with [`SELECT_USER_BY_EXTERNAL_ID`].
pub const INSERT_USER_IF_ABSENT: &str = r#"
INSERT INTO users (id, external_id, email, first_name, last_name, display_name, active, role, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
ON CONFLICT(external_id) DO NOTHING
"#;

pub const SELECT_USER_BY_ID: &str = r#"
SELECT id, external_id, email, first_name, last_name, display_name, active, role, created_at, updated_at
FROM users
WHERE id = ?1
"#;

pub const SELECT_USER_BY_EXTERNAL_ID: &str = r#"
SELECT id, external_id, email, first_name, last_name, display_name, active, role, created_at, updated_at
FROM users
WHERE external_id = ?1
"#;

pub const SELECT_ALL_USERS: &str = r#"
SELECT id, external_id, email, first_name, last_name, display_name, active, role, created_at, updated_at
FROM users
ORDER BY created_at ASC
"#;

pub const UPDATE_USER_ACTIVE: &str = r#"
UPDATE users
SET active = ?2, updated_at = ?3
WHERE id = ?1
"#;
