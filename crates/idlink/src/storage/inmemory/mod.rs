//! In-memory directory backend.
//!
//! Stores profiles in HashMaps wrapped in `Arc<RwLock<_>>`. Useful for
//! development and tests where persistence is not required.

mod repository;

pub use repository::InMemoryDirectory;
