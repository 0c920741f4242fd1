//! Export of materialized profile views to JSON and CSV.
//!
//! CSV quoting follows RFC 4180: fields containing commas, quotes, or line
//! breaks are wrapped in double quotes with inner quotes doubled.

use std::{
  fs::File,
  io::{self, BufWriter, Write},
  path::Path,
};

use anyhow::{Context, Result};
use clap::ValueEnum;
use dossier_core::profile::ProfileView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
  Json,
  Csv,
}

/// Write `views` to `out`, or to stdout when no path is given.
pub fn write(views: &[ProfileView], format: ExportFormat, out: Option<&Path>) -> Result<()> {
  match out {
    Some(path) => {
      let file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
      write_to(views, format, BufWriter::new(file))?;
      eprintln!("exported {} profiles to {}", views.len(), path.display());
    }
    None => write_to(views, format, io::stdout().lock())?,
  }
  Ok(())
}

fn write_to<W: Write>(views: &[ProfileView], format: ExportFormat, w: W) -> Result<()> {
  match format {
    ExportFormat::Json => write_json(views, w),
    ExportFormat::Csv => write_csv(views, w),
  }
}

fn write_json<W: Write>(views: &[ProfileView], mut w: W) -> Result<()> {
  serde_json::to_writer_pretty(&mut w, views)?;
  writeln!(w)?;
  Ok(())
}

const CSV_HEADER: &str = "ID,Name,Location,Title,Organization,External ID,\
                          Experience count,Education count,First seen,\
                          Last seen,Touch count";

fn write_csv<W: Write>(views: &[ProfileView], mut w: W) -> Result<()> {
  writeln!(w, "{CSV_HEADER}")?;
  for view in views {
    let p = &view.profile;
    let row = [
      p.id.to_string(),
      p.name.clone().unwrap_or_default(),
      p.location.clone().unwrap_or_default(),
      p.title.clone().unwrap_or_default(),
      p.organization.clone().unwrap_or_default(),
      p.external_id.clone(),
      view.experiences.len().to_string(),
      view.educations.len().to_string(),
      p.first_seen_at.format("%Y-%m-%d %H:%M:%S").to_string(),
      p.last_seen_at.format("%Y-%m-%d %H:%M:%S").to_string(),
      p.touch_count.to_string(),
    ];
    let line = row.iter().map(|field| csv_field(field)).collect::<Vec<_>>().join(",");
    writeln!(w, "{line}")?;
  }
  Ok(())
}

/// Quote a field when it contains a comma, quote, or line break.
fn csv_field(field: &str) -> String {
  if field.contains([',', '"', '\n', '\r']) {
    format!("\"{}\"", field.replace('"', "\"\""))
  } else {
    field.to_string()
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};
  use dossier_core::profile::Profile;

  use super::*;

  fn view() -> ProfileView {
    let seen = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    ProfileView {
      profile:     Profile {
        id:            7,
        external_id:   "ext-1".into(),
        name:          Some("Alice Liddell".into()),
        location:      Some("Oxford, UK".into()),
        title:         None,
        organization:  Some("Looking Glass Labs".into()),
        summary:       None,
        first_seen_at: seen,
        last_seen_at:  seen,
        touch_count:   3,
        is_active:     true,
      },
      experiences: vec![],
      educations:  vec![],
    }
  }

  #[test]
  fn plain_fields_pass_through() {
    assert_eq!(csv_field("Looking Glass Labs"), "Looking Glass Labs");
  }

  #[test]
  fn fields_with_separators_are_quoted() {
    assert_eq!(csv_field("Oxford, UK"), "\"Oxford, UK\"");
    assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    assert_eq!(csv_field("line\nbreak"), "\"line\nbreak\"");
  }

  #[test]
  fn csv_export_writes_header_and_rows() {
    let mut buf = Vec::new();
    write_csv(&[view()], &mut buf).unwrap();

    let text = String::from_utf8(buf).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(CSV_HEADER));
    assert_eq!(
      lines.next(),
      Some(
        "7,Alice Liddell,\"Oxford, UK\",,Looking Glass Labs,ext-1,0,0,\
         2024-05-01 12:00:00,2024-05-01 12:00:00,3"
      )
    );
    assert_eq!(lines.next(), None);
  }

  #[test]
  fn json_export_is_an_array_of_views() {
    let mut buf = Vec::new();
    write_json(&[view()], &mut buf).unwrap();

    let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
    assert_eq!(parsed[0]["profile"]["external_id"], "ext-1");
    assert_eq!(parsed[0]["experiences"], serde_json::json!([]));
  }
}
