//! SQL schema for the Dossier SQLite store.
//!
//! Executed at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS profiles (
    id            INTEGER PRIMARY KEY,
    external_id   TEXT NOT NULL UNIQUE,
    name          TEXT,
    location      TEXT,
    title         TEXT,
    organization  TEXT,
    summary       TEXT,
    first_seen_at TEXT NOT NULL,     -- ISO 8601 UTC; set once at creation
    last_seen_at  TEXT NOT NULL,     -- ISO 8601 UTC; advanced on every save
    touch_count   INTEGER NOT NULL DEFAULT 1,
    is_active     INTEGER NOT NULL DEFAULT 1
);

-- Child collections are snapshot-replaced: a save with a non-empty list
-- deletes all rows for the profile and inserts the incoming list. No UPDATE
-- is ever issued against these two tables.
CREATE TABLE IF NOT EXISTS experiences (
    id           INTEGER PRIMARY KEY,
    profile_id   INTEGER NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    title        TEXT,
    organization TEXT NOT NULL,      -- '' when the source omitted it
    location     TEXT,
    from_date    TEXT,               -- opaque source text, never parsed
    to_date      TEXT,
    duration     TEXT,
    description  TEXT
);

CREATE TABLE IF NOT EXISTS educations (
    id             INTEGER PRIMARY KEY,
    profile_id     INTEGER NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    institution    TEXT NOT NULL,    -- '' when the source omitted it
    degree         TEXT,
    field_of_study TEXT,             -- not supplied by ingest; stays NULL
    from_date      TEXT,
    to_date        TEXT,
    description    TEXT
);

-- Scalar change audit. Strictly append-only; rows only ever disappear when a
-- hard profile delete cascades.
CREATE TABLE IF NOT EXISTS profile_history (
    id         INTEGER PRIMARY KEY,
    profile_id INTEGER NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    field      TEXT NOT NULL,        -- 'name' | 'location' | 'title' | 'organization' | 'summary'
    old_value  TEXT,
    new_value  TEXT,
    changed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS profiles_name_location_idx   ON profiles(name, location);
CREATE INDEX IF NOT EXISTS profiles_organization_idx    ON profiles(organization);
CREATE INDEX IF NOT EXISTS experiences_profile_org_idx  ON experiences(profile_id, organization);
CREATE INDEX IF NOT EXISTS experiences_organization_idx ON experiences(organization);
CREATE INDEX IF NOT EXISTS educations_institution_idx   ON educations(institution);
CREATE INDEX IF NOT EXISTS history_profile_idx          ON profile_history(profile_id);
CREATE INDEX IF NOT EXISTS history_changed_idx          ON profile_history(changed_at);

PRAGMA user_version = 1;
";

/// Destructive teardown of every Dossier table. All profile, child, and
/// history data is lost; children drop first so foreign keys never dangle.
pub const DROP_SCHEMA: &str = "
DROP TABLE IF EXISTS profile_history;
DROP TABLE IF EXISTS experiences;
DROP TABLE IF EXISTS educations;
DROP TABLE IF EXISTS profiles;
";
