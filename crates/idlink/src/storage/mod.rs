//! User directory backends.
//!
//! Concrete implementations of `idlink_core::directory::UserDirectory`,
//! selected at compile time via feature flags.
//!
//! # Feature Flags
//!
//! - `inmemory` (default): HashMap-backed directory, lost on restart
//! - `sqlite`: SQLite directory using `rusqlite` and `tokio-rusqlite`
//!
//! These features are mutually exclusive.
//!
//! ```bash
//! cargo build -p idlink --no-default-features --features sqlite
//! ```

#[cfg(all(feature = "sqlite", feature = "inmemory"))]
compile_error!(
    "Features 'sqlite' and 'inmemory' are mutually exclusive. \
    Enable only one directory backend at a time."
);

#[cfg(not(any(feature = "sqlite", feature = "inmemory")))]
compile_error!(
    "No directory backend selected. Enable 'inmemory' or 'sqlite' feature. \
    Example: cargo build -p idlink --no-default-features --features sqlite"
);

#[cfg(any(feature = "inmemory", test))]
pub mod inmemory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(feature = "inmemory", test))]
pub use inmemory::InMemoryDirectory;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDirectory;
