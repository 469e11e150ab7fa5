//! Orchestrator tests: cache fixtures feeding an in-memory store, and a local
//! axum server for redirect handling.

use std::path::Path;

use axum::{
  Router,
  extract::RawQuery,
  http::{StatusCode, header},
  routing::get,
};
use casefeed_core::{
  record::{CaseRecord, InterventionRecord, Policy},
  store::{RecordQuery, RecordStore, RegressionGuard},
};
use casefeed_store_sqlite::SqliteStore;
use tempfile::TempDir;

use crate::{
  Error, Fetcher, RunOptions, SourceUrls, TableOutcome,
  fetcher::cache_file_name,
  pipeline::{CASE_SNAPSHOT, INTERVENTION_SNAPSHOT},
  run,
};

// ─── Fixtures ────────────────────────────────────────────────────────────────

const US_CASES: &str = r#"[
  {"state": "WA", "date": 20200402, "positive": 12},
  {"state": "WA", "date": 20200401, "positive": 10, "death": 1}
]"#;

const ECDC_CASES: &str = r#"{"records": [
  {"dateRep": "01/04/2020", "cases": 5, "deaths": 0, "geoId": "FR"},
  {"dateRep": "01/04/2020", "cases": "9", "deaths": "1", "geoId": "UK"}
]}"#;

const UK_OVERVIEW: &str = r#"{"body": [
  {"areaCode": "K02000001", "date": "2020-04-01",
   "cumCasesBySpecimenDate": 100, "cumDeaths28DaysByDeathDate": 3}
]}"#;

const UK_NATION: &str = r#"{"body": [
  {"areaCode": "E92000001", "date": "2020-04-01",
   "cumCasesBySpecimenDate": 80, "cumDeaths28DaysByDeathDate": 2}
]}"#;

const UK_REGION: &str = r#"{"body": [
  {"areaCode": "E12000004", "date": "2020-04-01",
   "cumCasesBySpecimenDate": 7, "cumDeaths28DaysByDeathDate": 1},
  {"areaCode": "E12000005", "date": "2020-04-01",
   "cumCasesBySpecimenDate": 11, "cumDeaths28DaysByDeathDate": 2}
]}"#;

const STATE_POLICY: &str = "\
StatePolicy,StatePostal,DateEnacted,DateIssued,DateEased,DateExpiry,DateEnded,PolicyCodingNotes,PolicySource
SchoolClose,WA,2020-03-13,,,,,Statewide,https://example.org/wa
StayAtHome,WA,,,,,,Announced only,
";

const OXCGRT_LATEST: &str = "\
CountryName,RegionName,Date,C1_School closing,C4_Restrictions on gatherings,C6_Stay at home requirements
United Kingdom,Wales,20200401,0,0,0
United Kingdom,Wales,20200402,3,0,0
";

const SCHOOL_SERIES: &str = ",country_code,01Apr2020,02Apr2020\nFRA,FRA,1,3\n";
const GATHERING_SERIES: &str = ",country_code,01Apr2020,02Apr2020\nFRA,FRA,0,1\n";
const STAY_SERIES: &str = ",country_code,01Apr2020,02Apr2020\nFRA,FRA,2,2\n";

fn sources() -> SourceUrls {
  let url = |name: &str| format!("https://fixtures.test/{name}");
  SourceUrls {
    covid_tracking:        url("us.json"),
    ecdc:                  url("ecdc.json"),
    gov_uk_overview:       url("data?areaType=overview"),
    gov_uk_nation:         url("data?areaType=nation"),
    gov_uk_region:         String::new(),
    oxcgrt_latest:         url("OxCGRT_latest.csv"),
    state_policy:          url("state-policy.csv"),
    oxcgrt_school_closing: url("c1.csv"),
    oxcgrt_gatherings:     url("c4.csv"),
    oxcgrt_stay_at_home:   url("c6.csv"),
  }
}

fn seed(dir: &Path, url: &str, body: &str) {
  std::fs::write(dir.join(cache_file_name(url)), body).unwrap();
}

/// A cache directory holding every fixture, so runs never hit the network.
fn seeded_cache(us_cases: &str) -> TempDir {
  let dir = tempfile::tempdir().unwrap();
  let s = sources();
  for (url, body) in [
    (&s.covid_tracking, us_cases),
    (&s.ecdc, ECDC_CASES),
    (&s.gov_uk_overview, UK_OVERVIEW),
    (&s.gov_uk_nation, UK_NATION),
    (&s.oxcgrt_latest, OXCGRT_LATEST),
    (&s.state_policy, STATE_POLICY),
    (&s.oxcgrt_school_closing, SCHOOL_SERIES),
    (&s.oxcgrt_gatherings, GATHERING_SERIES),
    (&s.oxcgrt_stay_at_home, STAY_SERIES),
  ] {
    seed(dir.path(), url, body);
  }
  dir
}

fn fetcher(dir: &TempDir) -> Fetcher {
  Fetcher::new(Some(dir.path().to_path_buf())).unwrap()
}

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn run_loads_both_families() {
  let cache = seeded_cache(US_CASES);
  let store = store().await;

  let report = run(&fetcher(&cache), &sources(), &store, RunOptions::default())
    .await
    .unwrap();
  assert!(!report.is_error());
  // FR + two WA days + UK overview + England.
  assert_eq!(report.case_rows, 5);
  // WA school closure, FR school closing and stay at home, Wales schools.
  assert_eq!(report.intervention_rows, 4);
  assert!(matches!(&report.cases, TableOutcome::Loaded(s) if s.loaded_rows == 5));

  let cases = store.case_data(&RecordQuery::default()).await.unwrap();
  let keys: Vec<_> = cases
    .iter()
    .map(|r| (r.region_id.as_str(), r.subregion_id.as_deref()))
    .collect();
  assert_eq!(keys, vec![
    ("FR", None),
    ("GB", None),
    ("GB", Some("GB-ENG")),
    ("US", Some("US-WA")),
    ("US", Some("US-WA")),
  ]);

  let interventions = store
    .intervention_data(&RecordQuery::default())
    .await
    .unwrap();
  assert!(interventions.iter().all(InterventionRecord::is_dated));
  let wales = interventions
    .iter()
    .find(|r| r.subregion_id.as_deref() == Some("GB-WLS"))
    .unwrap();
  assert_eq!(wales.policy, Policy::SchoolClose);
  assert_eq!(
    wales.source.as_deref(),
    Some("https://fixtures.test/OxCGRT_latest.csv")
  );
}

#[tokio::test]
async fn run_loads_regions_and_nhs_rollup() {
  let cache = seeded_cache(US_CASES);
  let sources = SourceUrls {
    gov_uk_region: "https://fixtures.test/data?areaType=region".into(),
    ..sources()
  };
  seed(cache.path(), &sources.gov_uk_region, UK_REGION);
  let store = store().await;

  let report = run(&fetcher(&cache), &sources, &store, RunOptions::default())
    .await
    .unwrap();
  assert!(!report.is_error());
  // Five base rows, two ONS regions, one NHS region.
  assert_eq!(report.case_rows, 8);

  let midlands = store
    .case_data(&RecordQuery {
      region_id: Some("GB".into()),
      subregion_id: Some("E40000008".into()),
      ..RecordQuery::default()
    })
    .await
    .unwrap();
  assert_eq!(midlands.len(), 1);
  assert_eq!(
    (midlands[0].confirmed_cumulative, midlands[0].deaths_cumulative),
    (18, 3)
  );

  let east = store
    .case_data(&RecordQuery {
      subregion_id: Some("E12000004".into()),
      ..RecordQuery::default()
    })
    .await
    .unwrap();
  assert_eq!(east.len(), 1);
}

#[tokio::test]
async fn run_writes_snapshots_into_cache_dir() {
  let cache = seeded_cache(US_CASES);
  let store = store().await;

  run(&fetcher(&cache), &sources(), &store, RunOptions::default())
    .await
    .unwrap();

  let cases: Vec<CaseRecord> = serde_json::from_str(
    &std::fs::read_to_string(cache.path().join(CASE_SNAPSHOT)).unwrap(),
  )
  .unwrap();
  assert_eq!(cases.len(), 5);
  assert_eq!(cases[0].region_id, "FR");

  let interventions: Vec<InterventionRecord> = serde_json::from_str(
    &std::fs::read_to_string(cache.path().join(INTERVENTION_SNAPSHOT)).unwrap(),
  )
  .unwrap();
  assert_eq!(interventions.len(), 4);
  assert_eq!(interventions[0].subregion_id.as_deref(), Some("US-WA"));
}

#[tokio::test]
async fn dry_run_leaves_store_untouched() {
  let cache = seeded_cache(US_CASES);
  let store = store().await;

  let options = RunOptions { dry_run: true, ..RunOptions::default() };
  let report = run(&fetcher(&cache), &sources(), &store, options)
    .await
    .unwrap();

  assert!(!report.is_error());
  assert!(matches!(report.cases, TableOutcome::Skipped));
  assert!(matches!(report.interventions, TableOutcome::Skipped));
  assert!(cache.path().join(CASE_SNAPSHOT).exists());
  assert!(store.case_data(&RecordQuery::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn regression_fails_one_family_and_loads_the_other() {
  let store = store().await;
  let full = seeded_cache(US_CASES);
  run(&fetcher(&full), &sources(), &store, RunOptions::default())
    .await
    .unwrap();

  let shrunk = seeded_cache("[]");
  let report = run(&fetcher(&shrunk), &sources(), &store, RunOptions::default())
    .await
    .unwrap();

  assert!(report.is_error());
  assert!(matches!(
    report.cases,
    TableOutcome::Failed(casefeed_store_sqlite::Error::Regression {
      live: 5,
      shadow: 3,
      ..
    })
  ));
  assert!(matches!(report.interventions, TableOutcome::Loaded(_)));
  assert_eq!(store.case_data(&RecordQuery::default()).await.unwrap().len(), 5);

  let forced = RunOptions {
    guard: RegressionGuard::Skip,
    ..RunOptions::default()
  };
  let report = run(&fetcher(&shrunk), &sources(), &store, forced)
    .await
    .unwrap();
  assert!(!report.is_error());
  assert_eq!(store.case_data(&RecordQuery::default()).await.unwrap().len(), 3);
}

#[tokio::test]
async fn parse_failure_aborts_before_loading() {
  let cache = seeded_cache("{not json");
  let store = store().await;

  let err = run(&fetcher(&cache), &sources(), &store, RunOptions::default())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Parse { dataset: "US cases", .. }));
  assert!(!cache.path().join(CASE_SNAPSHOT).exists());
  assert!(store.case_data(&RecordQuery::default()).await.unwrap().is_empty());
}

// ─── Fetcher over HTTP ───────────────────────────────────────────────────────

/// Serve redirect scenarios on an ephemeral local port; returns the base URL.
async fn serve() -> String {
  let app = Router::new()
    .route(
      "/moved",
      get(|| async {
        (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, "/data.csv?v=2")])
      }),
    )
    .route(
      "/offsite",
      get(|| async {
        (StatusCode::FOUND, [(header::LOCATION, "http://elsewhere.invalid/data.csv")])
      }),
    )
    .route(
      "/loop",
      get(|| async { (StatusCode::FOUND, [(header::LOCATION, "/loop")]) }),
    )
    .route("/no-location", get(|| async { StatusCode::FOUND }))
    .route("/gone", get(|| async { StatusCode::NOT_FOUND }))
    .route(
      "/data.csv",
      get(|RawQuery(query): RawQuery| async move {
        format!("query={}", query.unwrap_or_default())
      }),
    );

  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
  format!("http://{addr}")
}

#[tokio::test]
async fn follows_redirects_keeping_path_and_query() {
  let base = serve().await;
  let fetcher = Fetcher::new(None).unwrap();

  let body = fetcher.fetch(&format!("{base}/moved")).await.unwrap();
  assert_eq!(body, "query=v=2");
}

#[tokio::test]
async fn offsite_redirect_stays_on_original_host() {
  let base = serve().await;
  let fetcher = Fetcher::new(None).unwrap();

  let body = fetcher.fetch(&format!("{base}/offsite")).await.unwrap();
  assert_eq!(body, "query=");
}

#[tokio::test]
async fn redirect_failures_are_errors() {
  let base = serve().await;
  let fetcher = Fetcher::new(None).unwrap();

  let err = fetcher.fetch(&format!("{base}/loop")).await.unwrap_err();
  assert!(matches!(err, Error::TooManyRedirects(_)));

  let err = fetcher.fetch(&format!("{base}/no-location")).await.unwrap_err();
  assert!(matches!(err, Error::MissingLocation(_)));

  let err = fetcher.fetch(&format!("{base}/gone")).await.unwrap_err();
  assert!(matches!(err, Error::Status { status: StatusCode::NOT_FOUND, .. }));
}

#[tokio::test]
async fn download_is_cached_and_reused() {
  let base = serve().await;
  let dir = tempfile::tempdir().unwrap();
  let cache_dir = dir.path().join("nested").join("cache");
  let fetcher = Fetcher::new(Some(cache_dir.clone())).unwrap();
  let url = format!("{base}/moved");

  assert_eq!(fetcher.fetch(&url).await.unwrap(), "query=v=2");
  let path = fetcher.cache_path(&url).unwrap();
  assert!(path.starts_with(&cache_dir));
  assert_eq!(std::fs::read_to_string(&path).unwrap(), "query=v=2");

  // A cache hit never reaches the server.
  std::fs::write(&path, "cached body").unwrap();
  assert_eq!(fetcher.fetch(&url).await.unwrap(), "cached body");
}
