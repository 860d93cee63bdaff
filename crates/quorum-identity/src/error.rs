//! Error type for `quorum-identity`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("password hashing failed: {0}")]
  Hash(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
