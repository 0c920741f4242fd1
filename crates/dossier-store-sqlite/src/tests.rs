//! Integration tests for `SqliteStore` against an in-memory database.

use dossier_core::{
  profile::GroupCount,
  record::{EducationRecord, ExperienceRecord, ProfileRecord},
  store::{ProfileStore, SearchQuery},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn record(external_id: &str) -> ProfileRecord {
  ProfileRecord::new(external_id)
}

fn full_record(external_id: &str) -> ProfileRecord {
  ProfileRecord {
    external_id:  external_id.into(),
    name:         Some("Alice Liddell".into()),
    location:     Some("Oxford".into()),
    title:        Some("Researcher".into()),
    organization: Some("Looking Glass Labs".into()),
    summary:      Some("Curiouser and curiouser.".into()),
    experiences:  vec![experience("Researcher", "Looking Glass Labs")],
    educations:   vec![education("Oxford University")],
  }
}

fn experience(title: &str, organization: &str) -> ExperienceRecord {
  ExperienceRecord {
    title:        Some(title.into()),
    organization: Some(organization.into()),
    from_date:    Some("Jan 2020".into()),
    to_date:      Some("Present".into()),
    ..Default::default()
  }
}

fn education(institution: &str) -> EducationRecord {
  EducationRecord {
    institution: Some(institution.into()),
    degree:      Some("BA".into()),
    ..Default::default()
  }
}

// ─── Create & lookup ─────────────────────────────────────────────────────────

#[tokio::test]
async fn save_creates_profile_with_children() {
  let s = store().await;

  let profile = s.save_profile(full_record("ext-1"), true).await.unwrap();
  assert_eq!(profile.external_id, "ext-1");
  assert_eq!(profile.touch_count, 1);
  assert_eq!(profile.first_seen_at, profile.last_seen_at);
  assert!(profile.is_active);
  assert_eq!(profile.name.as_deref(), Some("Alice Liddell"));

  let view = s.get_view(profile.id).await.unwrap().unwrap();
  assert_eq!(view.experiences.len(), 1);
  assert_eq!(view.experiences[0].organization, "Looking Glass Labs");
  assert_eq!(view.educations.len(), 1);
  assert_eq!(view.educations[0].institution, "Oxford University");
}

#[tokio::test]
async fn save_without_external_id_is_rejected() {
  let s = store().await;

  let result = s.save_profile(record(""), true).await;
  assert!(matches!(
    result,
    Err(Error::Core(dossier_core::Error::MissingExternalId))
  ));

  // Nothing was written.
  let stats = s.stats().await.unwrap();
  assert_eq!(stats.total_profiles, 0);
}

#[tokio::test]
async fn create_keeps_sparse_fields_sparse() {
  let s = store().await;

  let mut rec = record("ext-sparse");
  rec.experiences = vec![ExperienceRecord {
    from_date: Some("2019".into()),
    ..Default::default()
  }];
  let profile = s.save_profile(rec, true).await.unwrap();
  assert_eq!(profile.name, None);

  let view = s.get_view(profile.id).await.unwrap().unwrap();
  assert_eq!(view.experiences[0].organization, "");
  assert_eq!(view.experiences[0].title, None);
  assert_eq!(view.experiences[0].from_date.as_deref(), Some("2019"));
}

#[tokio::test]
async fn get_by_key_missing_returns_none() {
  let s = store().await;
  assert!(s.get_by_key("never-saved").await.unwrap().is_none());
}

#[tokio::test]
async fn get_view_missing_returns_none() {
  let s = store().await;
  assert!(s.get_view(999).await.unwrap().is_none());
}

// ─── Dedup & merge ───────────────────────────────────────────────────────────

#[tokio::test]
async fn resave_same_key_never_duplicates() {
  let s = store().await;

  let first  = s.save_profile(full_record("ext-1"), true).await.unwrap();
  let second = s.save_profile(full_record("ext-1"), true).await.unwrap();

  assert_eq!(first.id, second.id);
  assert_eq!(s.stats().await.unwrap().total_profiles, 1);
}

#[tokio::test]
async fn resave_identical_touches_without_history() {
  let s = store().await;

  let first  = s.save_profile(full_record("ext-1"), true).await.unwrap();
  let second = s.save_profile(full_record("ext-1"), true).await.unwrap();

  assert_eq!(second.touch_count, 2);
  assert!(second.last_seen_at >= first.last_seen_at);
  assert_eq!(second.name, first.name);
  assert!(s.get_history(first.id).await.unwrap().is_empty());

  // Children were re-snapshotted with identical content.
  let view = s.get_view(first.id).await.unwrap().unwrap();
  assert_eq!(view.experiences.len(), 1);
  assert_eq!(view.experiences[0].organization, "Looking Glass Labs");
  assert_eq!(view.educations.len(), 1);
}

#[tokio::test]
async fn resave_with_empty_children_leaves_rows_untouched() {
  let s = store().await;

  let profile = s.save_profile(full_record("ext-1"), true).await.unwrap();
  let before  = s.get_view(profile.id).await.unwrap().unwrap();

  // Same scalars, but no child snapshot at all this time.
  let mut rec = full_record("ext-1");
  rec.experiences = vec![];
  rec.educations = vec![];
  s.save_profile(rec, true).await.unwrap();

  let after = s.get_view(profile.id).await.unwrap().unwrap();
  assert_eq!(after.experiences, before.experiences);
  assert_eq!(after.educations, before.educations);
}

#[tokio::test]
async fn scalar_change_overwrites_and_logs_history() {
  let s = store().await;

  let profile = s.save_profile(full_record("ext-1"), true).await.unwrap();

  let mut rec = full_record("ext-1");
  rec.organization = Some("Red Queen & Co".into());
  let updated = s.save_profile(rec, true).await.unwrap();
  assert_eq!(updated.organization.as_deref(), Some("Red Queen & Co"));

  let history = s.get_history(profile.id).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].field, "organization");
  assert_eq!(history[0].old_value.as_deref(), Some("Looking Glass Labs"));
  assert_eq!(history[0].new_value.as_deref(), Some("Red Queen & Co"));
}

#[tokio::test]
async fn empty_and_missing_scalars_never_erase() {
  let s = store().await;

  let profile = s.save_profile(full_record("ext-1"), true).await.unwrap();

  // Organization arrives explicitly empty, everything else is absent.
  let mut rec = record("ext-1");
  rec.organization = Some(String::new());
  let updated = s.save_profile(rec, true).await.unwrap();

  assert_eq!(updated.organization.as_deref(), Some("Looking Glass Labs"));
  assert_eq!(updated.name.as_deref(), Some("Alice Liddell"));
  assert_eq!(updated.touch_count, 2);
  assert!(s.get_history(profile.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn track_changes_off_skips_history_but_still_merges() {
  let s = store().await;

  let profile = s.save_profile(full_record("ext-1"), false).await.unwrap();

  let mut rec = full_record("ext-1");
  rec.title = Some("Queen".into());
  let updated = s.save_profile(rec, false).await.unwrap();

  assert_eq!(updated.title.as_deref(), Some("Queen"));
  assert_eq!(updated.touch_count, 2);
  assert!(s.get_history(profile.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn children_replaced_wholesale() {
  let s = store().await;

  let mut rec = full_record("ext-1");
  rec.experiences = vec![
    experience("Researcher", "Looking Glass Labs"),
    experience("Advisor", "Wonderland Tea Co"),
  ];
  let profile = s.save_profile(rec, true).await.unwrap();

  let mut rec = record("ext-1");
  rec.experiences = vec![experience("Queen", "Red Queen & Co")];
  s.save_profile(rec, true).await.unwrap();

  let view = s.get_view(profile.id).await.unwrap().unwrap();
  assert_eq!(view.experiences.len(), 1);
  assert_eq!(view.experiences[0].organization, "Red Queen & Co");
}

#[tokio::test]
async fn update_scenario_end_to_end() {
  let s = store().await;

  let mut rec = record("u1");
  rec.name = Some("A".into());
  rec.organization = Some("X".into());
  let profile = s.save_profile(rec, true).await.unwrap();

  // Organization changes, name stays the same.
  let mut rec = record("u1");
  rec.name = Some("A".into());
  rec.organization = Some("Y".into());
  s.save_profile(rec, true).await.unwrap();

  // Organization arrives empty: nothing erased, nothing logged.
  let mut rec = record("u1");
  rec.name = Some("A".into());
  rec.organization = Some(String::new());
  let last = s.save_profile(rec, true).await.unwrap();

  assert_eq!(last.touch_count, 3);
  assert_eq!(last.organization.as_deref(), Some("Y"));

  let history = s.get_history(profile.id).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].field, "organization");
  assert_eq!(history[0].old_value.as_deref(), Some("X"));
  assert_eq!(history[0].new_value.as_deref(), Some("Y"));
}

#[tokio::test]
async fn history_newest_first() {
  let s = store().await;

  let mut rec = record("u1");
  rec.title = Some("Researcher".into());
  let profile = s.save_profile(rec, true).await.unwrap();

  let mut rec = record("u1");
  rec.title = Some("Advisor".into());
  s.save_profile(rec, true).await.unwrap();

  let mut rec = record("u1");
  rec.title = Some("Queen".into());
  s.save_profile(rec, true).await.unwrap();

  let history = s.get_history(profile.id).await.unwrap();
  assert_eq!(history.len(), 2);
  assert_eq!(history[0].new_value.as_deref(), Some("Queen"));
  assert_eq!(history[1].new_value.as_deref(), Some("Advisor"));
}

// ─── Atomicity ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_save_rolls_back_completely() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("profiles.db");
  let s = SqliteStore::open(&path).await.unwrap();

  let profile = s.save_profile(full_record("ext-1"), true).await.unwrap();

  // Sabotage the child table so the second child insert must fail.
  {
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn
      .execute(
        "CREATE UNIQUE INDEX one_org_per_profile
         ON experiences(profile_id, organization)",
        [],
      )
      .unwrap();
  }

  let mut rec = full_record("ext-1");
  rec.title = Some("Queen".into());
  rec.experiences = vec![
    experience("Queen", "Red Queen & Co"),
    experience("Monarch", "Red Queen & Co"),
  ];
  assert!(s.save_profile(rec, true).await.is_err());

  // Scalar update, touch bump, history append, and child delete all rolled
  // back together.
  let after = s.get_view(profile.id).await.unwrap().unwrap();
  assert_eq!(after.profile.touch_count, 1);
  assert_eq!(after.profile.title.as_deref(), Some("Researcher"));
  assert_eq!(after.experiences.len(), 1);
  assert_eq!(after.experiences[0].organization, "Looking Glass Labs");
  assert!(s.get_history(profile.id).await.unwrap().is_empty());
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn soft_delete_hides_but_keeps_data() {
  let s = store().await;

  let profile = s.save_profile(full_record("ext-1"), true).await.unwrap();
  assert!(s.delete_profile(profile.id, true).await.unwrap());

  // Hidden from search and the default listing.
  let query = SearchQuery { name: Some("Alice".into()), ..Default::default() };
  assert!(s.search(&query).await.unwrap().is_empty());
  assert!(s.list_all(true).await.unwrap().is_empty());

  // Still reachable directly, children and history intact.
  let view = s.get_view(profile.id).await.unwrap().unwrap();
  assert!(!view.profile.is_active);
  assert_eq!(view.experiences.len(), 1);
  assert_eq!(s.list_all(false).await.unwrap().len(), 1);

  let stats = s.stats().await.unwrap();
  assert_eq!(stats.total_profiles, 1);
  assert_eq!(stats.active_profiles, 0);
}

#[tokio::test]
async fn hard_delete_cascades_to_children_and_history() {
  let s = store().await;

  let profile = s.save_profile(full_record("ext-1"), true).await.unwrap();
  let mut rec = full_record("ext-1");
  rec.title = Some("Queen".into());
  s.save_profile(rec, true).await.unwrap();

  assert!(s.delete_profile(profile.id, false).await.unwrap());
  assert!(s.get_view(profile.id).await.unwrap().is_none());
  assert!(s.get_by_key("ext-1").await.unwrap().is_none());

  let stats = s.stats().await.unwrap();
  assert_eq!(stats.total_profiles, 0);
  assert_eq!(stats.total_experiences, 0);
  assert_eq!(stats.total_educations, 0);
  assert_eq!(stats.total_history_entries, 0);
}

#[tokio::test]
async fn delete_missing_is_a_no_op() {
  let s = store().await;
  assert!(!s.delete_profile(999, true).await.unwrap());
  assert!(!s.delete_profile(999, false).await.unwrap());
}

#[tokio::test]
async fn resave_after_soft_delete_stays_inactive() {
  let s = store().await;

  let profile = s.save_profile(full_record("ext-1"), true).await.unwrap();
  s.delete_profile(profile.id, true).await.unwrap();

  let resaved = s.save_profile(full_record("ext-1"), true).await.unwrap();
  assert_eq!(resaved.id, profile.id);
  assert_eq!(resaved.touch_count, 2);
  assert!(!resaved.is_active);
}

// ─── Search ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn search_combines_predicates() {
  let s = store().await;

  let mut a = record("ext-a");
  a.name = Some("Alice Liddell".into());
  a.organization = Some("Looking Glass Labs".into());
  a.location = Some("Oxford".into());
  s.save_profile(a, true).await.unwrap();

  let mut b = record("ext-b");
  b.name = Some("Alice Kingsleigh".into());
  b.organization = Some("Wonderland Tea Co".into());
  b.location = Some("London".into());
  s.save_profile(b, true).await.unwrap();

  let query = SearchQuery {
    name:         Some("alice".into()),
    organization: Some("looking glass".into()),
    ..Default::default()
  };
  let hits = s.search(&query).await.unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].external_id, "ext-a");

  // Substring match is case-insensitive on both sides.
  let query = SearchQuery { location: Some("OXFORD".into()), ..Default::default() };
  assert_eq!(s.search(&query).await.unwrap().len(), 1);
}

#[tokio::test]
async fn search_without_predicates_lists_active_up_to_limit() {
  let s = store().await;

  for i in 0..4 {
    let mut rec = record(&format!("ext-{i}"));
    rec.name = Some(format!("Person {i}"));
    s.save_profile(rec, true).await.unwrap();
  }

  let all = s.search(&SearchQuery::default()).await.unwrap();
  assert_eq!(all.len(), 4);

  let query = SearchQuery { limit: Some(2), ..Default::default() };
  assert_eq!(s.search(&query).await.unwrap().len(), 2);
}

// ─── Aggregation & stats ─────────────────────────────────────────────────────

#[tokio::test]
async fn top_organizations_orders_and_excludes_empty() {
  let s = store().await;

  let orgs = [
    ("ext-1", Some("Acme")),
    ("ext-2", Some("Acme")),
    ("ext-3", Some("Globex")),
    ("ext-4", None),
    ("ext-5", Some("")),
  ];
  for (key, org) in orgs {
    let mut rec = record(key);
    rec.organization = org.map(str::to_owned);
    s.save_profile(rec, true).await.unwrap();
  }

  let top = s.top_organizations(10).await.unwrap();
  assert_eq!(top.len(), 2);
  assert_eq!(top[0], GroupCount { value: "Acme".into(), count: 2 });
  assert_eq!(top[1], GroupCount { value: "Globex".into(), count: 1 });

  // The bound is respected.
  assert_eq!(s.top_organizations(1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn aggregations_skip_inactive_profiles() {
  let s = store().await;

  let mut rec = record("ext-1");
  rec.organization = Some("Acme".into());
  let a = s.save_profile(rec, true).await.unwrap();

  let mut rec = record("ext-2");
  rec.organization = Some("Acme".into());
  s.save_profile(rec, true).await.unwrap();

  s.delete_profile(a.id, true).await.unwrap();

  let top = s.top_organizations(10).await.unwrap();
  assert_eq!(top, vec![GroupCount { value: "Acme".into(), count: 1 }]);
}

#[tokio::test]
async fn top_locations_and_titles_group_counts() {
  let s = store().await;

  for (key, location, title) in [
    ("ext-1", "Oxford", "Researcher"),
    ("ext-2", "Oxford", "Advisor"),
    ("ext-3", "London", "Researcher"),
  ] {
    let mut rec = record(key);
    rec.location = Some(location.into());
    rec.title = Some(title.into());
    s.save_profile(rec, true).await.unwrap();
  }

  let locations = s.top_locations(10).await.unwrap();
  assert_eq!(locations[0], GroupCount { value: "Oxford".into(), count: 2 });

  let titles = s.top_titles(10).await.unwrap();
  assert_eq!(titles[0], GroupCount { value: "Researcher".into(), count: 2 });
}

#[tokio::test]
async fn institution_frequency_counts_rows_even_for_inactive() {
  let s = store().await;

  let mut rec = record("ext-1");
  rec.educations = vec![education("Oxford University"), education("MIT")];
  let a = s.save_profile(rec, true).await.unwrap();

  let mut rec = record("ext-2");
  rec.educations = vec![education("Oxford University")];
  s.save_profile(rec, true).await.unwrap();

  s.delete_profile(a.id, true).await.unwrap();

  let freq = s.institution_frequency(10).await.unwrap();
  assert_eq!(freq.len(), 2);
  assert_eq!(freq[0], GroupCount { value: "Oxford University".into(), count: 2 });
}

#[tokio::test]
async fn stats_counts_every_table() {
  let s = store().await;

  s.save_profile(full_record("ext-1"), true).await.unwrap();
  let mut rec = full_record("ext-2");
  rec.educations = vec![education("Oxford University"), education("MIT")];
  s.save_profile(rec, true).await.unwrap();

  let mut rec = full_record("ext-1");
  rec.name = Some("Alice Kingsleigh".into());
  s.save_profile(rec, true).await.unwrap();

  let stats = s.stats().await.unwrap();
  assert_eq!(stats.total_profiles, 2);
  assert_eq!(stats.active_profiles, 2);
  assert_eq!(stats.total_experiences, 2);
  assert_eq!(stats.total_educations, 3);
  assert_eq!(stats.total_history_entries, 1);
}

// ─── Store lifecycle ─────────────────────────────────────────────────────────

#[tokio::test]
async fn drop_then_recreate_resets_the_store() {
  let s = store().await;
  s.save_profile(full_record("ext-1"), true).await.unwrap();

  s.drop_all_tables().await.unwrap();
  s.create_all_tables().await.unwrap();

  assert_eq!(s.stats().await.unwrap().total_profiles, 0);
  assert!(s.get_by_key("ext-1").await.unwrap().is_none());
}

#[tokio::test]
async fn reopen_reads_persisted_rows() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("profiles.db");

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.save_profile(full_record("ext-1"), true).await.unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();
  let profile = s.get_by_key("ext-1").await.unwrap().unwrap();
  assert_eq!(profile.name.as_deref(), Some("Alice Liddell"));

  let view = s.get_view(profile.id).await.unwrap().unwrap();
  assert_eq!(view.experiences.len(), 1);
}
