//! Handlers for `/profiles` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/profiles` | `?active_only=` defaults to `true` |
//! | `POST`   | `/profiles` | Body: raw record; `?track_changes=` defaults to `true` |
//! | `GET`    | `/profiles/by-key` | `?external_id=<key>`; 404 if never saved |
//! | `GET`    | `/profiles/{id}` | Full view with children; 404 if not found |
//! | `DELETE` | `/profiles/{id}` | `?soft=` defaults to `true`; 404 if not found |
//! | `GET`    | `/profiles/{id}/history` | Newest change first; empty if none |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use dossier_core::{
  profile::{HistoryEntry, Profile, ProfileView},
  record::ProfileRecord,
  store::ProfileStore,
};
use serde::Deserialize;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub active_only: Option<bool>,
}

/// `GET /profiles[?active_only=<bool>]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<ProfileView>>, ApiError>
where
  S: ProfileStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let views = store
    .list_all(params.active_only.unwrap_or(true))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(views))
}

// ─── Save ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SaveParams {
  pub track_changes: Option<bool>,
}

/// `POST /profiles[?track_changes=<bool>]` — body: a raw profile record.
///
/// Creates on first sighting of the external id, merges on every later one;
/// responds `201` with the saved profile either way.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<SaveParams>,
  Json(body): Json<ProfileRecord>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ProfileStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let profile = store
    .save_profile(body, params.track_changes.unwrap_or(true))
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(profile)))
}

// ─── Get by key ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ByKeyParams {
  pub external_id: String,
}

/// `GET /profiles/by-key?external_id=<key>`
pub async fn by_key<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ByKeyParams>,
) -> Result<Json<Profile>, ApiError>
where
  S: ProfileStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let profile = store
    .get_by_key(&params.external_id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| {
      ApiError::NotFound(format!("no profile for key {}", params.external_id))
    })?;
  Ok(Json(profile))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /profiles/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
) -> Result<Json<ProfileView>, ApiError>
where
  S: ProfileStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let view = store
    .get_view(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("profile {id} not found")))?;
  Ok(Json(view))
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /profiles/{id}/history`
pub async fn history<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError>
where
  S: ProfileStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let entries = store
    .get_history(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(entries))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
  pub soft: Option<bool>,
}

/// `DELETE /profiles/{id}[?soft=<bool>]`
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
  Query(params): Query<DeleteParams>,
) -> Result<StatusCode, ApiError>
where
  S: ProfileStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let deleted = store
    .delete_profile(id, params.soft.unwrap_or(true))
    .await
    .map_err(ApiError::from_store)?;

  if !deleted {
    return Err(ApiError::NotFound(format!("profile {id} not found")));
  }
  Ok(StatusCode::NO_CONTENT)
}
