//! The authorization-facing error taxonomy.
//!
//! Every failure a caller of the engine layer can observe is one of these
//! kinds. Backend infrastructure failures collapse into [`Error::Unavailable`]
//! so callers always fail closed rather than guessing at partial state.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// No principal is present on the calling session.
  #[error("not signed in")]
  Unauthenticated,

  /// A principal is present but lacks the required claim, role, or
  /// membership status.
  #[error("permission denied: {0}")]
  PermissionDenied(String),

  /// Malformed or missing required input; the message names the field.
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  #[error("not found: {0}")]
  NotFound(String),

  /// Registration would push an event past its configured maximum.
  #[error("event {event_id} is full (capacity {capacity})")]
  CapacityExceeded { event_id: Uuid, capacity: u32 },

  /// An external store or identity-provider call failed. Recovered by
  /// denying the action, never by retrying here.
  #[error("backend unavailable: {0}")]
  Unavailable(String),
}

impl Error {
  /// Wrap an infrastructure error from a store or identity backend.
  pub fn unavailable(e: impl std::fmt::Display) -> Self {
    Error::Unavailable(e.to_string())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
