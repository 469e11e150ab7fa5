//! Integration tests for `SqliteStore` against an in-memory database.

use casefeed_core::{
  record::{CaseRecord, Counts, InterventionRecord, Policy},
  store::{RecordQuery, RecordStore, RegressionGuard},
};
use chrono::NaiveDate;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn d(day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2020, 4, day).unwrap() }

fn case(region: &str, subregion: Option<&str>, day: u32, confirmed: i64) -> CaseRecord {
  CaseRecord::new(region, subregion.map(str::to_string), d(day), Counts {
    confirmed,
    recovered: 0,
    deaths: confirmed / 10,
  })
}

fn cases(n: u32) -> Vec<CaseRecord> {
  (1..=n).map(|day| case("FR", None, day, day as i64 * 100)).collect()
}

async fn all_cases(s: &SqliteStore) -> Vec<CaseRecord> {
  s.case_data(&RecordQuery::default()).await.unwrap()
}

async fn assert_no_leftovers(s: &SqliteStore) {
  let names = s.table_names().await.unwrap();
  assert_eq!(names, vec!["case_data", "intervention_data"]);
}

// ─── Loads ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_load_fills_empty_table() {
  let s = store().await;

  let summary = s
    .load_case_data(cases(3), RegressionGuard::Enforce)
    .await
    .unwrap();
  assert_eq!(summary.table, "case_data");
  assert_eq!(summary.previous_rows, 0);
  assert_eq!(summary.loaded_rows, 3);

  assert_eq!(all_cases(&s).await, cases(3));
  assert_no_leftovers(&s).await;
}

#[tokio::test]
async fn empty_batch_is_rejected_and_table_untouched() {
  let s = store().await;
  s.load_case_data(cases(2), RegressionGuard::Enforce)
    .await
    .unwrap();

  let err = s
    .load_case_data(vec![], RegressionGuard::Skip)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NoData("case_data")));
  assert_eq!(all_cases(&s).await.len(), 2);
  assert_no_leftovers(&s).await;
}

#[tokio::test]
async fn smaller_batch_trips_the_guard() {
  let s = store().await;
  s.load_case_data(cases(5), RegressionGuard::Enforce)
    .await
    .unwrap();

  let err = s
    .load_case_data(cases(3), RegressionGuard::Enforce)
    .await
    .unwrap_err();
  assert!(err.is_regression());
  assert!(matches!(err, Error::Regression {
    table: "case_data",
    live: 5,
    shadow: 3
  }));
  assert_eq!(
    err.to_string(),
    "new table case_data_import has fewer rows than case_data: 3 rows and 5 \
     rows respectively"
  );

  assert_eq!(all_cases(&s).await, cases(5));
  assert_no_leftovers(&s).await;
}

#[tokio::test]
async fn skipping_the_guard_replaces_smaller() {
  let s = store().await;
  s.load_case_data(cases(5), RegressionGuard::Enforce)
    .await
    .unwrap();

  let summary = s
    .load_case_data(cases(2), RegressionGuard::Skip)
    .await
    .unwrap();
  assert_eq!((summary.previous_rows, summary.loaded_rows), (5, 2));
  assert_eq!(all_cases(&s).await, cases(2));
  assert_no_leftovers(&s).await;
}

#[tokio::test]
async fn equal_or_larger_batch_replaces_contents() {
  let s = store().await;
  s.load_case_data(cases(2), RegressionGuard::Enforce)
    .await
    .unwrap();

  let same_size = vec![case("DE", None, 1, 7), case("DE", None, 2, 9)];
  s.load_case_data(same_size.clone(), RegressionGuard::Enforce)
    .await
    .unwrap();
  assert_eq!(all_cases(&s).await, same_size);

  s.load_case_data(cases(4), RegressionGuard::Enforce)
    .await
    .unwrap();
  assert_eq!(all_cases(&s).await, cases(4));
}

#[tokio::test]
async fn stale_leftover_tables_do_not_block_a_load() {
  let s = store().await;
  s.execute_batch(
    "CREATE TABLE case_data_old (x INTEGER);
     CREATE TABLE case_data_import (x INTEGER);",
  )
  .await
  .unwrap();

  s.load_case_data(cases(1), RegressionGuard::Enforce)
    .await
    .unwrap();
  assert_eq!(all_cases(&s).await.len(), 1);
  assert_no_leftovers(&s).await;
}

#[tokio::test]
async fn families_are_loaded_independently() {
  let s = store().await;
  s.load_case_data(cases(3), RegressionGuard::Enforce)
    .await
    .unwrap();

  let interventions = vec![InterventionRecord::interval(
    "US",
    Some("US-WA".into()),
    Policy::StayAtHome,
    Some(d(1)),
    None,
  )];
  s.load_intervention_data(interventions, RegressionGuard::Enforce)
    .await
    .unwrap();

  assert_eq!(all_cases(&s).await.len(), 3);
  let stored = s
    .intervention_data(&RecordQuery::default())
    .await
    .unwrap();
  assert_eq!(stored.len(), 1);
}

// ─── Round trips ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn intervention_fields_roundtrip() {
  let s = store().await;

  let full = InterventionRecord {
    region_id:       "US".into(),
    subregion_id:    Some("US-NY".into()),
    policy:          Policy::Named("Non-essential business closures".into()),
    notes:           Some("Executive order 202.8".into()),
    source:          Some("https://example.org/order".into()),
    issue_date:      Some(d(1)),
    start_date:      Some(d(2)),
    ease_date:       Some(d(20)),
    expiration_date: Some(d(25)),
    end_date:        Some(d(30)),
  };
  let sparse = InterventionRecord::interval(
    "GB",
    None,
    Policy::SchoolClose,
    Some(d(3)),
    None,
  );

  s.load_intervention_data(
    vec![full.clone(), sparse.clone()],
    RegressionGuard::Enforce,
  )
  .await
  .unwrap();

  let stored = s
    .intervention_data(&RecordQuery::default())
    .await
    .unwrap();
  assert_eq!(stored, vec![sparse, full]);
}

#[tokio::test]
async fn reopened_file_store_keeps_data() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("casefeed.db");

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.load_case_data(cases(2), RegressionGuard::Enforce)
      .await
      .unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(all_cases(&s).await, cases(2));
  let err = s
    .load_case_data(cases(1), RegressionGuard::Enforce)
    .await
    .unwrap_err();
  assert!(err.is_regression());
}

// ─── Queries ─────────────────────────────────────────────────────────────────

async fn mixed_store() -> SqliteStore {
  let s = store().await;
  s.load_case_data(
    vec![
      case("US", Some("US-WA"), 2, 20),
      case("US", None, 1, 100),
      case("US", Some("US-NY"), 1, 50),
      case("US", Some("US-WA"), 1, 10),
      case("FR", None, 1, 5),
    ],
    RegressionGuard::Enforce,
  )
  .await
  .unwrap();
  s
}

#[tokio::test]
async fn query_by_region_orders_rows() {
  let s = mixed_store().await;

  let rows = s.case_data(&RecordQuery::region("US")).await.unwrap();
  let keys: Vec<_> = rows
    .iter()
    .map(|r| (r.subregion_id.as_deref(), r.date))
    .collect();
  assert_eq!(keys, vec![
    (None, d(1)),
    (Some("US-NY"), d(1)),
    (Some("US-WA"), d(1)),
    (Some("US-WA"), d(2)),
  ]);
}

#[tokio::test]
async fn query_by_subregion_and_dates() {
  let s = mixed_store().await;

  let rows = s
    .case_data(&RecordQuery::subregion("US", "US-WA"))
    .await
    .unwrap();
  assert_eq!(rows.len(), 2);

  let query = RecordQuery {
    from: Some(d(2)),
    ..RecordQuery::subregion("US", "US-WA")
  };
  let rows = s.case_data(&query).await.unwrap();
  assert_eq!(rows, vec![case("US", Some("US-WA"), 2, 20)]);

  let query = RecordQuery { until: Some(d(1)), ..RecordQuery::default() };
  assert_eq!(s.case_data(&query).await.unwrap().len(), 4);
}

#[tokio::test]
async fn query_limit_and_offset() {
  let s = mixed_store().await;

  let query = RecordQuery {
    limit: Some(2),
    offset: Some(1),
    ..RecordQuery::default()
  };
  let rows = s.case_data(&query).await.unwrap();
  let regions: Vec<_> = rows
    .iter()
    .map(|r| (r.region_id.as_str(), r.subregion_id.as_deref()))
    .collect();
  assert_eq!(regions, vec![("US", None), ("US", Some("US-NY"))]);
}
