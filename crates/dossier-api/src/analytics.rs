//! Handlers for the `/analytics/*` and `/stats` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/analytics/organizations` | `?limit=` defaults to 10 |
//! | `GET`  | `/analytics/locations` | `?limit=` defaults to 10 |
//! | `GET`  | `/analytics/titles` | `?limit=` defaults to 10 |
//! | `GET`  | `/analytics/institutions` | `?limit=` defaults to 10 |
//! | `GET`  | `/stats` | Row counts over the whole store |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use dossier_core::{
  profile::{GroupCount, StoreStats},
  store::ProfileStore,
};
use serde::Deserialize;

use crate::error::ApiError;

const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
pub struct LimitParams {
  pub limit: Option<usize>,
}

impl LimitParams {
  fn limit(&self) -> usize { self.limit.unwrap_or(DEFAULT_LIMIT) }
}

/// `GET /analytics/organizations[?limit=<n>]`
pub async fn organizations<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<LimitParams>,
) -> Result<Json<Vec<GroupCount>>, ApiError>
where
  S: ProfileStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let rows = store
    .top_organizations(params.limit())
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(rows))
}

/// `GET /analytics/locations[?limit=<n>]`
pub async fn locations<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<LimitParams>,
) -> Result<Json<Vec<GroupCount>>, ApiError>
where
  S: ProfileStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let rows = store
    .top_locations(params.limit())
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(rows))
}

/// `GET /analytics/titles[?limit=<n>]`
pub async fn titles<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<LimitParams>,
) -> Result<Json<Vec<GroupCount>>, ApiError>
where
  S: ProfileStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let rows = store
    .top_titles(params.limit())
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(rows))
}

/// `GET /analytics/institutions[?limit=<n>]`
pub async fn institutions<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<LimitParams>,
) -> Result<Json<Vec<GroupCount>>, ApiError>
where
  S: ProfileStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let rows = store
    .institution_frequency(params.limit())
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(rows))
}

/// `GET /stats`
pub async fn stats<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<StoreStats>, ApiError>
where
  S: ProfileStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let stats = store
    .stats()
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(stats))
}
