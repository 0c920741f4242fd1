//! Core types and trait definitions for the Dossier profile store.
//!
//! This crate is deliberately free of I/O: no HTTP, no database, no
//! filesystem. It defines the entity shapes, the ingest record contract, and
//! the [`store::ProfileStore`] trait that storage backends implement.

pub mod error;
pub mod profile;
pub mod record;
pub mod store;

pub use error::{Error, Result};
