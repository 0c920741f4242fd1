//! Handler for the `/search` endpoint.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use dossier_core::{
  profile::Profile,
  store::{ProfileStore, SearchQuery},
};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  pub name:         Option<String>,
  pub organization: Option<String>,
  pub location:     Option<String>,
  pub limit:        Option<usize>,
}

/// `GET /search?name=&organization=&location=&limit=`
///
/// Every predicate is optional. Matches are case-insensitive substrings,
/// AND-combined; only active profiles come back.
pub async fn handler<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Profile>>, ApiError>
where
  S: ProfileStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let query = SearchQuery {
    name:         params.name,
    organization: params.organization,
    location:     params.location,
    limit:        params.limit,
  };

  let profiles = store
    .search(&query)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(profiles))
}
