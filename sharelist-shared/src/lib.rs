//! # ShareList Shared Library
//!
//! This crate contains the types and business rules shared by the ShareList
//! API server and its client.
//!
//! ## Module Organization
//!
//! - `models`: Users, todo lists, members, tasks and their projections
//! - `auth`: Identity tokens, the list access policy and password hashing
//! - `store`: Per-list record storage and the user registry

pub mod auth;
pub mod models;
pub mod store;

/// Current version of the ShareList shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
