//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings and the active flag as an
//! SQLite integer; everything else is already text. Child rows carry no
//! encoded columns at all, so they map straight to their domain types.

use chrono::{DateTime, Utc};
use dossier_core::profile::{Education, Experience, HistoryEntry, Profile};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw columns of a `profiles` row, timestamps still undecoded.
pub struct RawProfile {
  pub id:            i64,
  pub external_id:   String,
  pub name:          Option<String>,
  pub location:      Option<String>,
  pub title:         Option<String>,
  pub organization:  Option<String>,
  pub summary:       Option<String>,
  pub first_seen_at: String,
  pub last_seen_at:  String,
  pub touch_count:   i64,
  pub is_active:     bool,
}

impl RawProfile {
  /// Map a row selected in [`PROFILE_COLUMNS`] order.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawProfile {
      id:            row.get(0)?,
      external_id:   row.get(1)?,
      name:          row.get(2)?,
      location:      row.get(3)?,
      title:         row.get(4)?,
      organization:  row.get(5)?,
      summary:       row.get(6)?,
      first_seen_at: row.get(7)?,
      last_seen_at:  row.get(8)?,
      touch_count:   row.get(9)?,
      is_active:     row.get(10)?,
    })
  }

  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      id:            self.id,
      external_id:   self.external_id,
      name:          self.name,
      location:      self.location,
      title:         self.title,
      organization:  self.organization,
      summary:       self.summary,
      first_seen_at: decode_dt(&self.first_seen_at)?,
      last_seen_at:  decode_dt(&self.last_seen_at)?,
      touch_count:   self.touch_count,
      is_active:     self.is_active,
    })
  }
}

/// Column list every `profiles` SELECT uses, in [`RawProfile::from_row`]
/// order.
pub const PROFILE_COLUMNS: &str = "id, external_id, name, location, title, \
                                   organization, summary, first_seen_at, \
                                   last_seen_at, touch_count, is_active";

/// Raw columns of a `profile_history` row, `changed_at` still undecoded.
pub struct RawHistoryEntry {
  pub id:         i64,
  pub profile_id: i64,
  pub field:      String,
  pub old_value:  Option<String>,
  pub new_value:  Option<String>,
  pub changed_at: String,
}

impl RawHistoryEntry {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawHistoryEntry {
      id:         row.get(0)?,
      profile_id: row.get(1)?,
      field:      row.get(2)?,
      old_value:  row.get(3)?,
      new_value:  row.get(4)?,
      changed_at: row.get(5)?,
    })
  }

  pub fn into_entry(self) -> Result<HistoryEntry> {
    Ok(HistoryEntry {
      id:         self.id,
      profile_id: self.profile_id,
      field:      self.field,
      old_value:  self.old_value,
      new_value:  self.new_value,
      changed_at: decode_dt(&self.changed_at)?,
    })
  }
}

// ─── Child rows ──────────────────────────────────────────────────────────────

pub fn experience_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Experience> {
  Ok(Experience {
    id:           row.get(0)?,
    profile_id:   row.get(1)?,
    title:        row.get(2)?,
    organization: row.get(3)?,
    location:     row.get(4)?,
    from_date:    row.get(5)?,
    to_date:      row.get(6)?,
    duration:     row.get(7)?,
    description:  row.get(8)?,
  })
}

pub fn education_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Education> {
  Ok(Education {
    id:             row.get(0)?,
    profile_id:     row.get(1)?,
    institution:    row.get(2)?,
    degree:         row.get(3)?,
    field_of_study: row.get(4)?,
    from_date:      row.get(5)?,
    to_date:        row.get(6)?,
    description:    row.get(7)?,
  })
}
