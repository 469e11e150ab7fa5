//! One end-to-end refresh: fetch every dataset, parse, merge, persist.

use std::path::Path;

use casefeed_core::{
  record::{CaseRecord, InterventionRecord},
  store::{LoadSummary, RecordStore, RegressionGuard},
};
use casefeed_sources::{
  covid_tracking, ecdc, gov_uk, oxcgrt, oxcgrt_timeseries, state_policy,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::{Error, Fetcher, Result, config::SourceUrls};

pub const CASE_SNAPSHOT: &str = "case-data.json";
pub const INTERVENTION_SNAPSHOT: &str = "intervention-data.json";

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
  pub guard:   RegressionGuard,
  /// Fetch, parse and snapshot, but leave the store untouched.
  pub dry_run: bool,
}

/// What happened to one table during a run.
#[derive(Debug)]
pub enum TableOutcome<E> {
  Loaded(LoadSummary),
  Failed(E),
  /// Dry run; the store was not written.
  Skipped,
}

impl<E> TableOutcome<E> {
  pub fn is_failed(&self) -> bool { matches!(self, Self::Failed(_)) }
}

/// Outcome of a run that got as far as persistence.
#[derive(Debug)]
pub struct RunReport<E> {
  pub case_rows:         usize,
  pub intervention_rows: usize,
  pub cases:             TableOutcome<E>,
  pub interventions:     TableOutcome<E>,
}

impl<E> RunReport<E> {
  /// Whether either load failed.
  pub fn is_error(&self) -> bool {
    self.cases.is_failed() || self.interventions.is_failed()
  }
}

/// Raw payloads, one per dataset.
struct Payloads {
  covid_tracking:        String,
  ecdc:                  String,
  gov_uk_overview:       String,
  gov_uk_nation:         String,
  gov_uk_region:         Option<String>,
  oxcgrt_latest:         String,
  state_policy:          String,
  oxcgrt_school_closing: String,
  oxcgrt_gatherings:     String,
  oxcgrt_stay_at_home:   String,
}

/// Fetch and parse every source, then replace both tables in `store`.
///
/// Any fetch or parse failure aborts the run before the store is touched.
/// A failed load is logged and reported without stopping the other one.
pub async fn run<S: RecordStore>(
  fetcher: &Fetcher,
  sources: &SourceUrls,
  store: &S,
  options: RunOptions,
) -> Result<RunReport<S::Error>> {
  if let Some(dir) = fetcher.cache_dir() {
    info!(dir = %dir.display(), "using cache directory");
  }
  if !options.guard.is_enforced() {
    warn!("regression guard disabled; smaller batches will replace live data");
  }

  let payloads = fetch_all(fetcher, sources).await?;
  let (cases, interventions) = parse_all(&payloads, sources)?;
  info!(
    cases = cases.len(),
    interventions = interventions.len(),
    "parsed all sources"
  );

  if let Some(dir) = fetcher.cache_dir() {
    tokio::fs::create_dir_all(dir)
      .await
      .map_err(|e| Error::io(dir, e))?;
    write_snapshot(&dir.join(CASE_SNAPSHOT), &cases).await?;
    write_snapshot(&dir.join(INTERVENTION_SNAPSHOT), &interventions).await?;
  }

  let case_rows = cases.len();
  let intervention_rows = interventions.len();

  if options.dry_run {
    warn!("dry run; skipping storage of results");
    return Ok(RunReport {
      case_rows,
      intervention_rows,
      cases: TableOutcome::Skipped,
      interventions: TableOutcome::Skipped,
    });
  }

  let cases = outcome(
    "case data",
    store.load_case_data(cases, options.guard).await,
  );
  let interventions = outcome(
    "intervention data",
    store.load_intervention_data(interventions, options.guard).await,
  );

  let report = RunReport { case_rows, intervention_rows, cases, interventions };
  if report.is_error() {
    error!("failed to complete all tasks");
  }
  Ok(report)
}

async fn fetch_all(fetcher: &Fetcher, sources: &SourceUrls) -> Result<Payloads> {
  let region = async {
    if sources.gov_uk_region.is_empty() {
      Ok(None)
    } else {
      fetcher.fetch(&sources.gov_uk_region).await.map(Some)
    }
  };

  let (
    covid_tracking,
    ecdc,
    gov_uk_overview,
    gov_uk_nation,
    gov_uk_region,
    oxcgrt_latest,
    state_policy,
    oxcgrt_school_closing,
    oxcgrt_gatherings,
    oxcgrt_stay_at_home,
  ) = tokio::try_join!(
    fetcher.fetch(&sources.covid_tracking),
    fetcher.fetch(&sources.ecdc),
    fetcher.fetch(&sources.gov_uk_overview),
    fetcher.fetch(&sources.gov_uk_nation),
    region,
    fetcher.fetch(&sources.oxcgrt_latest),
    fetcher.fetch(&sources.state_policy),
    fetcher.fetch(&sources.oxcgrt_school_closing),
    fetcher.fetch(&sources.oxcgrt_gatherings),
    fetcher.fetch(&sources.oxcgrt_stay_at_home),
  )?;

  Ok(Payloads {
    covid_tracking,
    ecdc,
    gov_uk_overview,
    gov_uk_nation,
    gov_uk_region,
    oxcgrt_latest,
    state_policy,
    oxcgrt_school_closing,
    oxcgrt_gatherings,
    oxcgrt_stay_at_home,
  })
}

fn parsed<T>(
  dataset: &'static str,
  result: casefeed_sources::Result<T>,
) -> Result<T> {
  result.map_err(|error| Error::Parse { dataset, error })
}

/// Run every parser and merge the families. Interventions without a start
/// date are dropped.
fn parse_all(
  p: &Payloads,
  sources: &SourceUrls,
) -> Result<(Vec<CaseRecord>, Vec<InterventionRecord>)> {
  let mut cases = parsed("ECDC cases", ecdc::parse(&p.ecdc))?;
  cases.extend(parsed(
    "US cases",
    covid_tracking::parse(&p.covid_tracking),
  )?);
  cases.extend(parsed(
    "UK cases",
    gov_uk::parse(
      &p.gov_uk_overview,
      &p.gov_uk_nation,
      p.gov_uk_region.as_deref(),
    ),
  )?);

  let mut interventions =
    parsed("US state policies", state_policy::parse(&p.state_policy))?;
  interventions.extend(parsed(
    "OxCGRT time series",
    oxcgrt_timeseries::parse(
      &p.oxcgrt_school_closing,
      &p.oxcgrt_gatherings,
      &p.oxcgrt_stay_at_home,
    ),
  )?);
  interventions.extend(parsed(
    "OxCGRT UK nations",
    oxcgrt::parse(&p.oxcgrt_latest, &sources.oxcgrt_latest),
  )?);
  interventions.retain(InterventionRecord::is_dated);

  Ok((cases, interventions))
}

async fn write_snapshot<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
  let json = serde_json::to_string_pretty(records)?;
  tokio::fs::write(path, json)
    .await
    .map_err(|e| Error::io(path, e))?;
  info!(path = %path.display(), "wrote snapshot");
  Ok(())
}

fn outcome<E: std::fmt::Display>(
  what: &str,
  result: std::result::Result<LoadSummary, E>,
) -> TableOutcome<E> {
  match result {
    Ok(summary) => {
      info!(
        table = %summary.table,
        previous = summary.previous_rows,
        loaded = summary.loaded_rows,
        "stored {what}"
      );
      TableOutcome::Loaded(summary)
    }
    Err(e) => {
      error!(error = %e, "failed to insert {what}");
      TableOutcome::Failed(e)
    }
  }
}
