//! `dossier` — command-line client for the Dossier profile store.
//!
//! Operates directly on the SQLite store file; no server required.
//!
//! # Usage
//!
//! ```
//! dossier ingest scraped/batch-01.json scraped/batch-02.json
//! dossier search --organization "Looking Glass"
//! dossier export --format csv --out profiles.csv
//! ```

mod export;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use dossier_core::{
  profile::Profile,
  record::ProfileRecord,
  store::{ProfileStore, SearchQuery},
};
use dossier_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use export::ExportFormat;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "dossier", about = "Command-line client for the Dossier profile store")]
struct Cli {
  /// Path to the SQLite store file.
  #[arg(long, value_name = "FILE", default_value = "data/profiles.db")]
  db: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Create the store file and schema, then exit.
  Init,
  /// Ingest raw profile records from JSON files.
  ///
  /// Each file holds either a single record object or an array of them.
  Ingest {
    #[arg(required = true, value_name = "FILE")]
    files:    Vec<PathBuf>,
    /// Skip writing field-level change history.
    #[arg(long)]
    no_track: bool,
  },
  /// Print one profile with its children, as JSON.
  Show {
    /// Profile row id.
    #[arg(long, conflicts_with = "key")]
    id:  Option<i64>,
    /// External identifier.
    #[arg(long)]
    key: Option<String>,
  },
  /// Search active profiles.
  Search {
    #[arg(long)]
    name:         Option<String>,
    #[arg(long)]
    organization: Option<String>,
    #[arg(long)]
    location:     Option<String>,
    #[arg(long, default_value_t = 50)]
    limit:        usize,
  },
  /// Export all profiles to JSON or CSV.
  Export {
    #[arg(long, value_enum, default_value = "json")]
    format:           ExportFormat,
    /// Output file; stdout when omitted.
    #[arg(long, value_name = "FILE")]
    out:              Option<PathBuf>,
    /// Include soft-deleted profiles.
    #[arg(long)]
    include_inactive: bool,
  },
  /// Print row counts for the whole store.
  Stats,
  /// Delete a profile (soft by default).
  Delete {
    #[arg(long)]
    id:   i64,
    /// Remove the row and everything it owns instead of deactivating it.
    #[arg(long)]
    hard: bool,
  },
  /// Drop and recreate every table. Destroys all data.
  Reset {
    /// Confirm the destruction.
    #[arg(long)]
    yes: bool,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let store = SqliteStore::open(&cli.db)
    .await
    .with_context(|| format!("failed to open store at {:?}", cli.db))?;

  match cli.command {
    Command::Init => {
      // Opening the store already ran the schema DDL.
      println!("store ready at {}", cli.db.display());
      print_stats(&store).await?;
    }
    Command::Ingest { files, no_track } => {
      ingest(&store, &files, !no_track).await?;
    }
    Command::Show { id, key } => {
      show(&store, id, key).await?;
    }
    Command::Search { name, organization, location, limit } => {
      let query = SearchQuery { name, organization, location, limit: Some(limit) };
      let hits = store.search(&query).await?;
      for profile in &hits {
        println!("{}", summary_line(profile));
      }
      if hits.is_empty() {
        println!("no matches");
      }
    }
    Command::Export { format, out, include_inactive } => {
      let views = store.list_all(!include_inactive).await?;
      export::write(&views, format, out.as_deref())?;
    }
    Command::Stats => {
      print_stats(&store).await?;
    }
    Command::Delete { id, hard } => {
      if store.delete_profile(id, !hard).await? {
        println!("{} profile {id}", if hard { "deleted" } else { "deactivated" });
      } else {
        bail!("no profile with id {id}");
      }
    }
    Command::Reset { yes } => {
      if !yes {
        bail!("refusing to reset without --yes");
      }
      store.drop_all_tables().await?;
      store.create_all_tables().await?;
      println!("store reset");
    }
  }

  Ok(())
}

// ─── Ingest ───────────────────────────────────────────────────────────────────

async fn ingest(
  store: &SqliteStore,
  files: &[PathBuf],
  track_changes: bool,
) -> Result<()> {
  let mut total = Tally::default();

  for file in files {
    let records =
      read_records(file).with_context(|| format!("reading {}", file.display()))?;

    let mut tally = Tally::default();
    for record in records {
      let key = record.external_id.clone();
      match store.save_profile(record, track_changes).await {
        Ok(profile) if profile.touch_count == 1 => tally.created += 1,
        Ok(_) => tally.updated += 1,
        Err(e) => {
          eprintln!("failed to save {key:?}: {e}");
          tally.failed += 1;
        }
      }
    }

    println!("{}: {tally}", file.display());
    total.add(&tally);
  }

  println!("ingest done: {total}");
  Ok(())
}

#[derive(Default)]
struct Tally {
  created: usize,
  updated: usize,
  failed:  usize,
}

impl Tally {
  fn add(&mut self, other: &Tally) {
    self.created += other.created;
    self.updated += other.updated;
    self.failed += other.failed;
  }
}

impl std::fmt::Display for Tally {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "{} created, {} updated, {} failed",
      self.created, self.updated, self.failed
    )
  }
}

/// A file holds either a single record object or an array of records.
fn read_records(path: &Path) -> Result<Vec<ProfileRecord>> {
  let raw = std::fs::read_to_string(path)?;
  let value: serde_json::Value = serde_json::from_str(&raw)?;
  let records = if value.is_array() {
    serde_json::from_value(value)?
  } else {
    vec![serde_json::from_value(value)?]
  };
  Ok(records)
}

// ─── Show & search output ─────────────────────────────────────────────────────

async fn show(store: &SqliteStore, id: Option<i64>, key: Option<String>) -> Result<()> {
  let id = match (id, key) {
    (Some(id), _) => id,
    (None, Some(key)) => match store.get_by_key(&key).await? {
      Some(profile) => profile.id,
      None => bail!("no profile for key {key:?}"),
    },
    (None, None) => bail!("pass --id or --key"),
  };

  match store.get_view(id).await? {
    Some(view) => println!("{}", serde_json::to_string_pretty(&view)?),
    None => bail!("no profile with id {id}"),
  }
  Ok(())
}

fn summary_line(profile: &Profile) -> String {
  let name         = profile.name.as_deref().unwrap_or("(unnamed)");
  let title        = profile.title.as_deref().unwrap_or("-");
  let organization = profile.organization.as_deref().unwrap_or("-");
  let location     = profile.location.as_deref().unwrap_or("-");
  format!("{:>4}  {name}  |  {title} @ {organization}  |  {location}", profile.id)
}

async fn print_stats(store: &SqliteStore) -> Result<()> {
  let stats = store.stats().await?;
  println!("profiles:        {}", stats.total_profiles);
  println!("  active:        {}", stats.active_profiles);
  println!("experiences:     {}", stats.total_experiences);
  println!("educations:      {}", stats.total_educations);
  println!("history entries: {}", stats.total_history_entries);
  Ok(())
}
