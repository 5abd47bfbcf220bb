//! SQLite backend for the Murmur feed store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Interaction uniqueness is enforced by
//! a `UNIQUE` index, not by application code.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
