//! The ingest contract — the raw record shape handed over by a scrape or
//! import run.
//!
//! Every scalar except `external_id` is `Option<String>`. Absent and empty
//! are distinct, representable states, and the merge algorithm treats both as
//! "no information": neither ever erases stored data.

use serde::{Deserialize, Serialize};

/// A raw profile record to be saved.
///
/// `external_id` is the deduplication key and the only required field. Child
/// lists are full snapshots: a non-empty list replaces everything stored for
/// that collection, an empty list means "no new snapshot, keep what is
/// there".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
  pub external_id:  String,
  pub name:         Option<String>,
  pub location:     Option<String>,
  pub title:        Option<String>,
  pub organization: Option<String>,
  pub summary:      Option<String>,
  #[serde(default)]
  pub experiences:  Vec<ExperienceRecord>,
  #[serde(default)]
  pub educations:   Vec<EducationRecord>,
}

impl ProfileRecord {
  /// An empty record for the given external id. Scalars and children are
  /// filled in by the caller.
  pub fn new(external_id: impl Into<String>) -> Self {
    ProfileRecord { external_id: external_id.into(), ..Default::default() }
  }
}

/// One employment period in a raw record. Dates are free text and stay that
/// way all the way to storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceRecord {
  pub title:        Option<String>,
  pub organization: Option<String>,
  pub location:     Option<String>,
  pub from_date:    Option<String>,
  pub to_date:      Option<String>,
  pub duration:     Option<String>,
  pub description:  Option<String>,
}

/// One academic record in a raw record.
///
/// Carries no field of study: the upstream source never supplies one. The
/// stored column exists and stays null until some other writer fills it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationRecord {
  pub institution: Option<String>,
  pub degree:      Option<String>,
  pub from_date:   Option<String>,
  pub to_date:     Option<String>,
  pub description: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn minimal_json_record_parses() {
    let record: ProfileRecord =
      serde_json::from_str(r#"{"external_id": "https://example.com/in/alice"}"#)
        .unwrap();

    assert_eq!(record.external_id, "https://example.com/in/alice");
    assert_eq!(record.name, None);
    assert!(record.experiences.is_empty());
    assert!(record.educations.is_empty());
  }

  #[test]
  fn json_record_without_external_id_is_rejected() {
    let result =
      serde_json::from_str::<ProfileRecord>(r#"{"name": "Alice Liddell"}"#);
    assert!(result.is_err());
  }

  #[test]
  fn full_json_record_round_trips() {
    let record = ProfileRecord {
      name: Some("Alice Liddell".into()),
      organization: Some("Looking Glass Labs".into()),
      experiences: vec![ExperienceRecord {
        title: Some("Researcher".into()),
        organization: Some("Looking Glass Labs".into()),
        ..Default::default()
      }],
      educations: vec![EducationRecord {
        institution: Some("Oxford University".into()),
        degree: Some("DPhil".into()),
        ..Default::default()
      }],
      ..ProfileRecord::new("u1")
    };

    let json = serde_json::to_string(&record).unwrap();
    let back: ProfileRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(back, record);
  }
}
