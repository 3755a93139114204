//! # ShareList Client
//!
//! Client state layer for the ShareList API: a typed HTTP client that keeps
//! the caller's identity token in an [`IdentityStore`] and re-issues it on
//! every request.
//!
//! ## Modules
//!
//! - `client`: [`ShareListClient`] with one method per API operation
//! - `identity`: where the identity token lives between requests
//! - `error`: [`ClientError`]

pub mod client;
pub mod error;
pub mod identity;

pub use client::{HealthStatus, ShareListClient};
pub use error::{ClientError, ClientResult};
pub use identity::{FileIdentityStore, IdentityStore, MemoryIdentityStore};
