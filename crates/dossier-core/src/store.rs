//! The `ProfileStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `dossier-store-sqlite`).
//! Higher layers (`dossier-api`, `dossier-cli`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use crate::{
  profile::{GroupCount, HistoryEntry, Profile, ProfileView, StoreStats},
  record::ProfileRecord,
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`ProfileStore::search`].
///
/// Supplied predicates are case-insensitive substring matches and are
/// AND-combined. Only active profiles are searched. With no predicate at all
/// the result is simply up to `limit` active profiles in store order.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
  pub name:         Option<String>,
  pub organization: Option<String>,
  pub location:     Option<String>,
  /// Result bound; defaults to [`SearchQuery::DEFAULT_LIMIT`].
  pub limit:        Option<usize>,
}

impl SearchQuery {
  pub const DEFAULT_LIMIT: usize = 50;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a profile store backend.
///
/// Every method opens one unit of work, performs all of its reads and writes
/// inside it, and releases it before returning, on success and on failure
/// alike. Returned values are detached: they never keep a live handle on the
/// store.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ProfileStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Save a raw record, deduplicating on its external identifier.
  ///
  /// First sighting creates the profile and inserts its children verbatim.
  /// Every later sighting merges into the existing row: a non-empty incoming
  /// scalar that differs overwrites the stored value (recorded in history
  /// when `track_changes` is set), absent and empty incoming scalars leave
  /// stored data alone, `last_seen_at` and the touch counter always advance,
  /// and a non-empty child list replaces the stored collection wholesale.
  /// The whole save is one atomic commit; on failure nothing is written.
  ///
  /// Child replacement is not diffed; replaced experience and education rows
  /// leave no history trail.
  fn save_profile(
    &self,
    record: ProfileRecord,
    track_changes: bool,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  /// Delete a profile. Soft delete clears the active flag and keeps children
  /// and history; hard delete removes the row and cascades to everything it
  /// owns.
  ///
  /// Returns `false` when no such profile exists (a logged no-op, not an
  /// error).
  fn delete_profile(
    &self,
    profile_id: i64,
    soft: bool,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Exact lookup by external identifier. Returns `None` if never saved.
  fn get_by_key<'a>(
    &'a self,
    external_id: &'a str,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + 'a;

  /// Materialise one profile with children eagerly loaded. Finds inactive
  /// profiles too: soft delete hides a profile from search and default
  /// listing, not from direct lookup.
  fn get_view(
    &self,
    profile_id: i64,
  ) -> impl Future<Output = Result<Option<ProfileView>, Self::Error>> + Send + '_;

  /// All profiles with children eagerly loaded, optionally restricted to
  /// active ones.
  fn list_all(
    &self,
    active_only: bool,
  ) -> impl Future<Output = Result<Vec<ProfileView>, Self::Error>> + Send + '_;

  /// Bounded multi-predicate search over active profiles.
  fn search<'a>(
    &'a self,
    query: &'a SearchQuery,
  ) -> impl Future<Output = Result<Vec<Profile>, Self::Error>> + Send + 'a;

  /// The full audit trail for one profile, newest change first.
  fn get_history(
    &self,
    profile_id: i64,
  ) -> impl Future<Output = Result<Vec<HistoryEntry>, Self::Error>> + Send + '_;

  // ── Aggregations ──────────────────────────────────────────────────────

  /// Active profiles grouped by current organization, count descending.
  /// Null and empty group keys are left out.
  fn top_organizations(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<GroupCount>, Self::Error>> + Send + '_;

  /// Active profiles grouped by location, count descending.
  fn top_locations(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<GroupCount>, Self::Error>> + Send + '_;

  /// Active profiles grouped by current title, count descending.
  fn top_titles(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<GroupCount>, Self::Error>> + Send + '_;

  /// Education rows grouped by institution, count descending. Education is
  /// lifetime history rather than current state, so the active flag does not
  /// filter here.
  fn institution_frequency(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<GroupCount>, Self::Error>> + Send + '_;

  /// Row counts over the whole store.
  fn stats(
    &self,
  ) -> impl Future<Output = Result<StoreStats, Self::Error>> + Send + '_;
}
