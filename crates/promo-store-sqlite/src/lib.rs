//! SQLite backend for the promotions store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. The `(user_id, event_id)` uniqueness
//! of reward requests is a table constraint, so concurrent claims are
//! serialised by SQLite itself.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
