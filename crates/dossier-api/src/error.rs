//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  /// The submitted record failed domain validation (e.g. a missing external
  /// identifier). Surfaced as a 400, not a 500.
  #[error("invalid record: {0}")]
  Validation(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Translate a backend failure into an API error.
  ///
  /// Store backends wrap [`dossier_core::Error`] rather than exposing it
  /// directly, so this walks the source chain looking for one. A domain
  /// validation failure becomes [`ApiError::Validation`]; everything else
  /// stays an opaque [`ApiError::Store`].
  pub fn from_store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(err);

    let mut current: Option<&(dyn std::error::Error + 'static)> =
      Some(boxed.as_ref());
    while let Some(cause) = current {
      if let Some(core) = cause.downcast_ref::<dossier_core::Error>() {
        return match core {
          dossier_core::Error::MissingExternalId => {
            ApiError::Validation(core.to_string())
          }
        };
      }
      current = cause.source();
    }

    ApiError::Store(boxed)
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Validation(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, Error)]
  #[error("backend error: {0}")]
  struct Backend(#[from] dossier_core::Error);

  #[test]
  fn validation_failure_is_found_in_source_chain() {
    let err =
      ApiError::from_store(Backend(dossier_core::Error::MissingExternalId));
    assert!(matches!(err, ApiError::Validation(_)));
  }

  #[test]
  fn unrelated_failure_stays_a_store_error() {
    let err = ApiError::from_store(std::io::Error::other("disk gone"));
    assert!(matches!(err, ApiError::Store(_)));
  }
}
