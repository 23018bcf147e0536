//! Request extractors.
//!
//! - [`auth::Caller`] -- Resolves the calling account from a JWT Bearer token.

pub mod auth;
