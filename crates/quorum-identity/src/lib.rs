//! In-process implementation of [`quorum_core::identity::IdentityProvider`].
//!
//! Stands in for the managed identity provider in development and tests:
//! argon2 password hashes, opaque bearer tokens (only a SHA-256 digest is
//! kept at rest), custom claims, and a watch-based session subscription.

pub mod error;
mod local;

pub use error::{Error, Result};
pub use local::LocalIdentity;
