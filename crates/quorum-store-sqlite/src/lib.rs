//! SQLite backend for the Quorum community store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Capacity reservation and counter
//! maintenance execute inside SQL transactions, so concurrent registrations
//! cannot race a read-then-write gap past an event's limit.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
