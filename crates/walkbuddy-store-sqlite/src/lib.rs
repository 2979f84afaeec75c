//! SQLite backend for WalkBuddy: a local identity provider and profile store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Both halves share one database file.

mod encode;
mod schema;
mod store;

pub mod error;
pub mod identity;

pub use error::{Error, Result};
pub use identity::{DEFAULT_MIN_PASSWORD_LENGTH, SqliteIdentityProvider};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
