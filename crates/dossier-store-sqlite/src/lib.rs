//! SQLite backend for the Dossier profile store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Each save executes inside a rusqlite
//! transaction that commits as a whole or rolls back on drop.

mod encode;
mod merge;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
