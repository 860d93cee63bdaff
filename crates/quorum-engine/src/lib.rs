//! The Quorum engine layer: access control, claim synchronization,
//! capacity reservation, feed interactions, and privileged admin
//! operations.
//!
//! Everything here is generic over [`quorum_core::identity::IdentityProvider`]
//! and [`quorum_core::store::CommunityStore`]; no backend type leaks in.
//! Failures surface as [`quorum_core::Error`] and always fail closed.

pub mod access;
pub mod admin;
pub mod claims;
pub mod events;
pub mod feed;

pub use access::{AccessContext, AccessController, AccessState};
pub use admin::AdminOps;
pub use claims::ClaimSync;
pub use events::Reservations;
pub use feed::Feed;
