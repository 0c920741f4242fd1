//! [`SqliteStore`] — the SQLite implementation of [`ProfileStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::Connection;
use tracing::{error, info, warn};

use dossier_core::{
  profile::{
    Education, Experience, GroupCount, HistoryEntry, Profile, ProfileView,
    StoreStats,
  },
  record::ProfileRecord,
  store::{ProfileStore, SearchQuery},
};

use crate::{
  encode::{
    education_from_row, encode_dt, experience_from_row, PROFILE_COLUMNS,
    RawHistoryEntry, RawProfile,
  },
  merge,
  schema::{DROP_SCHEMA, SCHEMA},
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Dossier profile store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. Every call
/// funnels through one background database thread, so writes submitted by
/// concurrent tasks execute one at a time, each inside its own transaction.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and ensure the schema exists.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.create_all_tables().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.create_all_tables().await?;
    Ok(store)
  }

  /// Run the idempotent schema DDL. Both constructors call this; it is also
  /// the rebuild step after [`SqliteStore::drop_all_tables`].
  pub async fn create_all_tables(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Drop every table in the store. Destroys all persisted data.
  pub async fn drop_all_tables(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(DROP_SCHEMA)?;
        Ok(())
      })
      .await?;
    warn!("all profile tables dropped");
    Ok(())
  }

  /// Shared GROUP BY plumbing for the profile-scalar aggregations.
  async fn grouped_profile_counts(
    &self,
    column: &'static str,
    limit: usize,
  ) -> Result<Vec<GroupCount>> {
    let limit = limit as i64;

    let rows: Vec<GroupCount> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {column}, COUNT(*) AS n
           FROM profiles
           WHERE is_active = 1 AND {column} IS NOT NULL AND {column} != ''
           GROUP BY {column}
           ORDER BY n DESC
           LIMIT ?1"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![limit], |row| {
            Ok(GroupCount { value: row.get(0)?, count: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows)
  }
}

// ─── ProfileStore impl ───────────────────────────────────────────────────────

impl ProfileStore for SqliteStore {
  type Error = Error;

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn save_profile(
    &self,
    record: ProfileRecord,
    track_changes: bool,
  ) -> Result<Profile> {
    if record.external_id.is_empty() {
      return Err(Error::Core(dossier_core::Error::MissingExternalId));
    }

    let external_id = record.external_id.clone();
    let now_str     = encode_dt(Utc::now());

    let raw: RawProfile = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let saved_id = match merge::find_by_external_id(&tx, &record.external_id)? {
          Some(current) => {
            merge::apply_update(&tx, &current, &record, track_changes, &now_str)?;
            current.id
          }
          None => merge::insert_profile(&tx, &record, &now_str)?,
        };

        // Re-read inside the transaction so the caller gets the post-save
        // row without a second unit of work.
        let raw = merge::find_by_id(&tx, saved_id)?
          .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        tx.commit()?;
        Ok(raw)
      })
      .await
      .map_err(|e| {
        error!(external_id = %external_id, error = %e, "profile save failed");
        Error::from(e)
      })?;

    let profile = raw.into_profile()?;
    if profile.touch_count == 1 {
      info!(external_id = %profile.external_id, id = profile.id, "profile created");
    } else {
      info!(
        external_id = %profile.external_id,
        id          = profile.id,
        touch_count = profile.touch_count,
        "profile updated"
      );
    }
    Ok(profile)
  }

  async fn delete_profile(&self, profile_id: i64, soft: bool) -> Result<bool> {
    let affected = self
      .conn
      .call(move |conn| {
        let n = if soft {
          conn.execute(
            "UPDATE profiles SET is_active = 0 WHERE id = ?1",
            rusqlite::params![profile_id],
          )?
        } else {
          conn.execute(
            "DELETE FROM profiles WHERE id = ?1",
            rusqlite::params![profile_id],
          )?
        };
        Ok(n)
      })
      .await
      .map_err(|e| {
        error!(profile_id, error = %e, "profile delete failed");
        Error::from(e)
      })?;

    if affected == 0 {
      warn!(profile_id, "delete requested for a profile that does not exist");
      return Ok(false);
    }

    if soft {
      info!(profile_id, "profile deactivated");
    } else {
      info!(profile_id, "profile deleted permanently");
    }
    Ok(true)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get_by_key(&self, external_id: &str) -> Result<Option<Profile>> {
    let key = external_id.to_owned();

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| Ok(merge::find_by_external_id(conn, &key)?))
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  async fn get_view(&self, profile_id: i64) -> Result<Option<ProfileView>> {
    let raw: Option<(RawProfile, Vec<Experience>, Vec<Education>)> = self
      .conn
      .call(move |conn| {
        let profile = match merge::find_by_id(conn, profile_id)? {
          Some(p) => p,
          None    => return Ok(None),
        };
        let experiences = experiences_for(conn, profile_id)?;
        let educations  = educations_for(conn, profile_id)?;
        Ok(Some((profile, experiences, educations)))
      })
      .await?;

    raw
      .map(|(profile, experiences, educations)| {
        Ok(ProfileView { profile: profile.into_profile()?, experiences, educations })
      })
      .transpose()
  }

  async fn list_all(&self, active_only: bool) -> Result<Vec<ProfileView>> {
    let raws: Vec<(RawProfile, Vec<Experience>, Vec<Education>)> = self
      .conn
      .call(move |conn| {
        let sql = if active_only {
          format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE is_active = 1 ORDER BY id")
        } else {
          format!("SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY id")
        };

        let profiles = {
          let mut stmt = conn.prepare(&sql)?;
          stmt
            .query_map([], RawProfile::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        let mut views = Vec::with_capacity(profiles.len());
        for profile in profiles {
          let experiences = experiences_for(conn, profile.id)?;
          let educations  = educations_for(conn, profile.id)?;
          views.push((profile, experiences, educations));
        }
        Ok(views)
      })
      .await?;

    raws
      .into_iter()
      .map(|(profile, experiences, educations)| {
        Ok(ProfileView { profile: profile.into_profile()?, experiences, educations })
      })
      .collect()
  }

  async fn search(&self, query: &SearchQuery) -> Result<Vec<Profile>> {
    let name_pat = query.name.as_deref().map(|s| format!("%{s}%"));
    let org_pat  = query.organization.as_deref().map(|s| format!("%{s}%"));
    let loc_pat  = query.location.as_deref().map(|s| format!("%{s}%"));
    let limit    = query.limit.unwrap_or(SearchQuery::DEFAULT_LIMIT) as i64;

    let raws: Vec<RawProfile> = self
      .conn
      .call(move |conn| {
        // Build the WHERE clause dynamically; parameter slots stay fixed.
        let mut conds: Vec<&'static str> = vec!["is_active = 1"];
        if name_pat.is_some() {
          conds.push("name LIKE ?1");
        }
        if org_pat.is_some() {
          conds.push("organization LIKE ?2");
        }
        if loc_pat.is_some() {
          conds.push("location LIKE ?3");
        }

        let sql = format!(
          "SELECT {PROFILE_COLUMNS} FROM profiles
           WHERE {}
           ORDER BY id
           LIMIT ?4",
          conds.join(" AND ")
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              name_pat.as_deref(),
              org_pat.as_deref(),
              loc_pat.as_deref(),
              limit,
            ],
            RawProfile::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProfile::into_profile).collect()
  }

  async fn get_history(&self, profile_id: i64) -> Result<Vec<HistoryEntry>> {
    let raws: Vec<RawHistoryEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, profile_id, field, old_value, new_value, changed_at
           FROM profile_history
           WHERE profile_id = ?1
           ORDER BY changed_at DESC, id DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![profile_id], RawHistoryEntry::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawHistoryEntry::into_entry).collect()
  }

  // ── Aggregations ──────────────────────────────────────────────────────────

  async fn top_organizations(&self, limit: usize) -> Result<Vec<GroupCount>> {
    self.grouped_profile_counts("organization", limit).await
  }

  async fn top_locations(&self, limit: usize) -> Result<Vec<GroupCount>> {
    self.grouped_profile_counts("location", limit).await
  }

  async fn top_titles(&self, limit: usize) -> Result<Vec<GroupCount>> {
    self.grouped_profile_counts("title", limit).await
  }

  async fn institution_frequency(&self, limit: usize) -> Result<Vec<GroupCount>> {
    let limit = limit as i64;

    let rows: Vec<GroupCount> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT institution, COUNT(*) AS n
           FROM educations
           WHERE institution != ''
           GROUP BY institution
           ORDER BY n DESC
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit], |row| {
            Ok(GroupCount { value: row.get(0)?, count: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows)
  }

  async fn stats(&self) -> Result<StoreStats> {
    let stats = self
      .conn
      .call(|conn| {
        let count = |sql: &str| conn.query_row(sql, [], |row| row.get::<_, i64>(0));
        Ok(StoreStats {
          total_profiles:        count("SELECT COUNT(*) FROM profiles")?,
          total_experiences:     count("SELECT COUNT(*) FROM experiences")?,
          total_educations:      count("SELECT COUNT(*) FROM educations")?,
          total_history_entries: count("SELECT COUNT(*) FROM profile_history")?,
          active_profiles:       count("SELECT COUNT(*) FROM profiles WHERE is_active = 1")?,
        })
      })
      .await?;
    Ok(stats)
  }
}

// ─── Child queries ───────────────────────────────────────────────────────────

fn experiences_for(
  conn: &Connection,
  profile_id: i64,
) -> rusqlite::Result<Vec<Experience>> {
  let mut stmt = conn.prepare(
    "SELECT id, profile_id, title, organization, location,
            from_date, to_date, duration, description
     FROM experiences
     WHERE profile_id = ?1
     ORDER BY id",
  )?;
  stmt
    .query_map(rusqlite::params![profile_id], experience_from_row)?
    .collect()
}

fn educations_for(
  conn: &Connection,
  profile_id: i64,
) -> rusqlite::Result<Vec<Education>> {
  let mut stmt = conn.prepare(
    "SELECT id, profile_id, institution, degree, field_of_study,
            from_date, to_date, description
     FROM educations
     WHERE profile_id = ?1
     ORDER BY id",
  )?;
  stmt
    .query_map(rusqlite::params![profile_id], education_from_row)?
    .collect()
}
