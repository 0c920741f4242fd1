//! JSON REST API for the Dossier profile store.
//!
//! Exposes an axum [`Router`] backed by any
//! [`dossier_core::store::ProfileStore`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", dossier_api::api_router(store.clone()))
//! ```

pub mod analytics;
pub mod error;
pub mod profiles;
pub mod search;

use std::sync::Arc;

use axum::{Router, routing::get};
use dossier_core::store::ProfileStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: ProfileStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Profiles
    .route("/profiles", get(profiles::list::<S>).post(profiles::create::<S>))
    .route("/profiles/by-key", get(profiles::by_key::<S>))
    .route(
      "/profiles/{id}",
      get(profiles::get_one::<S>).delete(profiles::delete_one::<S>),
    )
    .route("/profiles/{id}/history", get(profiles::history::<S>))
    // Search
    .route("/search", get(search::handler::<S>))
    // Aggregation
    .route("/analytics/organizations", get(analytics::organizations::<S>))
    .route("/analytics/locations", get(analytics::locations::<S>))
    .route("/analytics/titles", get(analytics::titles::<S>))
    .route("/analytics/institutions", get(analytics::institutions::<S>))
    .route("/stats", get(analytics::stats::<S>))
    .with_state(store)
}
