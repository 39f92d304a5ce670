//! Functional core for idlink.
//!
//! Pure types, policy evaluation and the collaborator traits that the
//! imperative shell (`idlink_auth`, `idlink`) implements.

#[cfg(feature = "auth")]
pub mod auth;
pub mod directory;
