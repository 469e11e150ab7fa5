//! Runtime configuration, deserialised from `casefeed.toml` and `CASEFEED_*`
//! environment variables.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level settings for a fetch run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
  pub store_path: PathBuf,
  /// Where downloads are cached and snapshots written. No caching if unset.
  pub cache_dir:  Option<PathBuf>,
  pub sources:    SourceUrls,
}

impl Default for FetchConfig {
  fn default() -> Self {
    Self {
      store_path: PathBuf::from("casefeed.db"),
      cache_dir:  None,
      sources:    SourceUrls::default(),
    }
  }
}

/// The `CASEFEED_*` environment layer. `__` separates nested keys only, so
/// `CASEFEED_STORE_PATH` sets `store_path` and `CASEFEED_SOURCES__ECDC` sets
/// `sources.ecdc`.
pub fn environment() -> config::Environment {
  config::Environment::with_prefix("CASEFEED")
    .prefix_separator("_")
    .separator("__")
}

/// One URL per upstream dataset.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceUrls {
  pub covid_tracking:        String,
  pub ecdc:                  String,
  pub gov_uk_overview:       String,
  pub gov_uk_nation:         String,
  /// Empty to skip the UK region and NHS region breakdown.
  pub gov_uk_region:         String,
  pub oxcgrt_latest:         String,
  pub state_policy:          String,
  pub oxcgrt_school_closing: String,
  pub oxcgrt_gatherings:     String,
  pub oxcgrt_stay_at_home:   String,
}

const COVID_TRACKING: &str = "https://api.covidtracking.com/v1/states/daily.json";
const ECDC: &str =
  "https://opendata.ecdc.europa.eu/covid19/casedistribution/json/";
const STATE_POLICY: &str = "https://raw.githubusercontent.com/COVID19StatePolicy/SocialDistancing/master/data/USstatesCov19distancingpolicy.csv";
const OXCGRT_DATA: &str =
  "https://raw.githubusercontent.com/OxCGRT/covid-policy-tracker/master/data";

fn gov_uk(area_type: &str) -> String {
  format!(
    "https://api.coronavirus.data.gov.uk/v2/data?areaType={area_type}\
     &metric=cumCasesBySpecimenDate&metric=cumDeaths28DaysByDeathDate\
     &format=json"
  )
}

impl Default for SourceUrls {
  fn default() -> Self {
    Self {
      covid_tracking:        COVID_TRACKING.into(),
      ecdc:                  ECDC.into(),
      gov_uk_overview:       gov_uk("overview"),
      gov_uk_nation:         gov_uk("nation"),
      gov_uk_region:         gov_uk("region"),
      oxcgrt_latest:         format!("{OXCGRT_DATA}/OxCGRT_latest.csv"),
      state_policy:          STATE_POLICY.into(),
      oxcgrt_school_closing: format!("{OXCGRT_DATA}/timeseries/c1_school_closing.csv"),
      oxcgrt_gatherings:     format!("{OXCGRT_DATA}/timeseries/c4_restrictions_on_gatherings.csv"),
      oxcgrt_stay_at_home:   format!("{OXCGRT_DATA}/timeseries/c6_stay_at_home_requirements.csv"),
    }
  }
}
