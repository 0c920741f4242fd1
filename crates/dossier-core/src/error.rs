//! Error types for `dossier-core`.

use thiserror::Error;

/// Domain-level failures, independent of any storage backend.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
  /// The record arrived without the external identifier that keys
  /// deduplication. Rejected before any unit of work is opened.
  #[error("record has no external identifier")]
  MissingExternalId,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
