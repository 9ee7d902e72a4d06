//! # Rentfolio Shared Library
//!
//! Shared types and business logic for the Rentfolio property-management
//! back end. This crate owns the identity & session lifecycle primitives
//! used by the API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models (accounts, users, refresh tokens, invitations,
//!   one-time tokens) and their CRUD operations
//! - `auth`: Password hashing, JWT access tokens, single-use token encoding,
//!   and the session-context middleware
//! - `db`: Connection pool and migration helpers

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the Rentfolio shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
