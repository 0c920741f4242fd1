//! The deduplicating save path — create vs. merge, scalar diffing, history
//! appends, and child snapshot replacement.
//!
//! Everything here is synchronous and runs on the database thread inside one
//! caller-owned transaction; the async wrapper lives in [`crate::store`]. The
//! helpers return `rusqlite::Result` so `?` composes inside the connection
//! closure.

use dossier_core::record::{EducationRecord, ExperienceRecord, ProfileRecord};
use rusqlite::{Connection, OptionalExtension as _, Transaction};

use crate::encode::{PROFILE_COLUMNS, RawProfile};

// ─── Lookups ─────────────────────────────────────────────────────────────────

/// Exact lookup by external identifier. Usable inside and outside a
/// transaction.
pub fn find_by_external_id(
  conn: &Connection,
  external_id: &str,
) -> rusqlite::Result<Option<RawProfile>> {
  let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE external_id = ?1");
  conn
    .query_row(&sql, rusqlite::params![external_id], RawProfile::from_row)
    .optional()
}

/// Lookup by row id, active or not.
pub fn find_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<RawProfile>> {
  let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1");
  conn
    .query_row(&sql, rusqlite::params![id], RawProfile::from_row)
    .optional()
}

// ─── Create path ─────────────────────────────────────────────────────────────

/// Insert a brand-new profile with its children taken verbatim from the
/// record. Returns the assigned row id.
pub fn insert_profile(
  tx: &Transaction<'_>,
  record: &ProfileRecord,
  now: &str,
) -> rusqlite::Result<i64> {
  tx.execute(
    "INSERT INTO profiles (
       external_id, name, location, title, organization, summary,
       first_seen_at, last_seen_at, touch_count, is_active
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7, 1, 1)",
    rusqlite::params![
      record.external_id,
      record.name,
      record.location,
      record.title,
      record.organization,
      record.summary,
      now,
    ],
  )?;
  let id = tx.last_insert_rowid();

  insert_experiences(tx, id, &record.experiences)?;
  insert_educations(tx, id, &record.educations)?;
  Ok(id)
}

// ─── Merge path ──────────────────────────────────────────────────────────────

/// Merge a record into an existing profile row.
///
/// Per scalar field: a non-empty incoming value that differs from the stored
/// one overwrites it and (when `track_changes` is set) appends a history
/// row; an absent or empty incoming value leaves the stored one alone.
/// `last_seen_at` and the touch counter advance no matter what. Child
/// collections are snapshot-replaced only when the incoming list is
/// non-empty.
pub fn apply_update(
  tx: &Transaction<'_>,
  current: &RawProfile,
  record: &ProfileRecord,
  track_changes: bool,
  now: &str,
) -> rusqlite::Result<()> {
  let fields: [(&str, &Option<String>, &Option<String>); 5] = [
    ("name", &record.name, &current.name),
    ("location", &record.location, &current.location),
    ("title", &record.title, &current.title),
    ("organization", &record.organization, &current.organization),
    ("summary", &record.summary, &current.summary),
  ];

  let mut merged = Vec::with_capacity(fields.len());
  let mut changes: Vec<(&str, Option<String>, String)> = Vec::new();
  for (field, incoming, stored) in fields {
    match incoming.as_deref() {
      Some(new) if !new.is_empty() && stored.as_deref() != Some(new) => {
        // Empty stored values count as "nothing there" in the audit trail.
        let old = stored.clone().filter(|s| !s.is_empty());
        changes.push((field, old, new.to_owned()));
        merged.push(Some(new.to_owned()));
      }
      _ => merged.push(stored.clone()),
    }
  }

  tx.execute(
    "UPDATE profiles
     SET name = ?1, location = ?2, title = ?3, organization = ?4, summary = ?5,
         last_seen_at = ?6, touch_count = touch_count + 1
     WHERE id = ?7",
    rusqlite::params![
      merged[0], merged[1], merged[2], merged[3], merged[4], now, current.id,
    ],
  )?;

  if track_changes {
    for (field, old_value, new_value) in &changes {
      tx.execute(
        "INSERT INTO profile_history (profile_id, field, old_value, new_value, changed_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![current.id, field, old_value, new_value, now],
      )?;
    }
  }

  if !record.experiences.is_empty() {
    replace_experiences(tx, current.id, &record.experiences)?;
  }
  if !record.educations.is_empty() {
    replace_educations(tx, current.id, &record.educations)?;
  }

  Ok(())
}

// ─── Children ────────────────────────────────────────────────────────────────

fn replace_experiences(
  tx: &Transaction<'_>,
  profile_id: i64,
  items: &[ExperienceRecord],
) -> rusqlite::Result<()> {
  tx.execute(
    "DELETE FROM experiences WHERE profile_id = ?1",
    rusqlite::params![profile_id],
  )?;
  insert_experiences(tx, profile_id, items)
}

fn replace_educations(
  tx: &Transaction<'_>,
  profile_id: i64,
  items: &[EducationRecord],
) -> rusqlite::Result<()> {
  tx.execute(
    "DELETE FROM educations WHERE profile_id = ?1",
    rusqlite::params![profile_id],
  )?;
  insert_educations(tx, profile_id, items)
}

fn insert_experiences(
  tx: &Transaction<'_>,
  profile_id: i64,
  items: &[ExperienceRecord],
) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare(
    "INSERT INTO experiences (
       profile_id, title, organization, location,
       from_date, to_date, duration, description
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
  )?;
  for item in items {
    stmt.execute(rusqlite::params![
      profile_id,
      item.title,
      item.organization.as_deref().unwrap_or(""),
      item.location,
      item.from_date,
      item.to_date,
      item.duration,
      item.description,
    ])?;
  }
  Ok(())
}

fn insert_educations(
  tx: &Transaction<'_>,
  profile_id: i64,
  items: &[EducationRecord],
) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare(
    "INSERT INTO educations (
       profile_id, institution, degree, from_date, to_date, description
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
  )?;
  for item in items {
    stmt.execute(rusqlite::params![
      profile_id,
      item.institution.as_deref().unwrap_or(""),
      item.degree,
      item.from_date,
      item.to_date,
      item.description,
    ])?;
  }
  Ok(())
}
