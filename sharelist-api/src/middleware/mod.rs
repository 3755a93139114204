/// Middleware modules for the API server
///
/// This module contains custom middleware for:
/// - Resolving the caller's identity into a request context
/// - Security headers

pub mod identity;
pub mod security;
