//! Stored entity shapes — the relational read model of the engine.
//!
//! Everything here is a plain value type. Store methods return these fully
//! detached: once a call completes, nothing in the returned graph holds a
//! connection, transaction, or any other live store resource.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Profile ─────────────────────────────────────────────────────────────────

/// One real-world subject, keyed by its unique external identifier (a
/// canonical profile URL).
///
/// `first_seen_at` is set once at creation. `last_seen_at` and `touch_count`
/// advance on every save of the same external id, whether or not anything
/// else changed. `is_active` is the soft-delete marker: inactive profiles
/// keep their children and history but are excluded from search and from
/// default listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
  pub id:            i64,
  pub external_id:   String,
  pub name:          Option<String>,
  pub location:      Option<String>,
  pub title:         Option<String>,
  pub organization:  Option<String>,
  pub summary:       Option<String>,
  pub first_seen_at: DateTime<Utc>,
  pub last_seen_at:  DateTime<Utc>,
  pub touch_count:   i64,
  pub is_active:     bool,
}

// ─── Children ────────────────────────────────────────────────────────────────

/// One employment period owned by exactly one profile.
///
/// Date fields are opaque text. Source dates are irregular, human-entered
/// strings and are stored verbatim, never parsed. The whole collection is
/// snapshot-replaced on update, so rows carry no identity beyond their owning
/// profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
  pub id:           i64,
  pub profile_id:   i64,
  pub title:        Option<String>,
  pub organization: String,
  pub location:     Option<String>,
  pub from_date:    Option<String>,
  pub to_date:      Option<String>,
  pub duration:     Option<String>,
  pub description:  Option<String>,
}

/// One academic record owned by exactly one profile. Same snapshot-replace
/// semantics as [`Experience`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Education {
  pub id:             i64,
  pub profile_id:     i64,
  pub institution:    String,
  pub degree:         Option<String>,
  pub field_of_study: Option<String>,
  pub from_date:      Option<String>,
  pub to_date:        Option<String>,
  pub description:    Option<String>,
}

// ─── History ─────────────────────────────────────────────────────────────────

/// One audit record: the named scalar field of a profile changed from
/// `old_value` to `new_value` at `changed_at`.
///
/// History is append-only. Rows are never updated or deleted, except when a
/// hard profile delete cascades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
  pub id:         i64,
  pub profile_id: i64,
  pub field:      String,
  pub old_value:  Option<String>,
  pub new_value:  Option<String>,
  pub changed_at: DateTime<Utc>,
}

// ─── Materialised view ───────────────────────────────────────────────────────

/// A profile with both child collections eagerly loaded — the full graph
/// handed to detail, listing, and export callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileView {
  pub profile:     Profile,
  pub experiences: Vec<Experience>,
  pub educations:  Vec<Education>,
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

/// One bucket of a grouped count, e.g. an organization and how many active
/// profiles currently claim it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCount {
  pub value: String,
  pub count: i64,
}

/// Row counts over the whole store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
  pub total_profiles:        i64,
  pub total_experiences:     i64,
  pub total_educations:      i64,
  pub total_history_entries: i64,
  pub active_profiles:       i64,
}
