//! World interventions from the OxCGRT per-indicator time-series CSVs.
//!
//! Each file is a country × date matrix of strictness levels for a single
//! indicator. Only the first span at or above threshold is kept per country.

use casefeed_core::{date, record::InterventionRecord};
use chrono::NaiveDate;

use crate::{
  Error, Result, csv_reader, geo,
  oxcgrt::{GATHERINGS, Indicator, SCHOOL_CLOSING, STAY_AT_HOME},
  threshold::{self, Level},
};

/// Parse the school-closing, gathering-restriction and stay-at-home series,
/// in that order.
pub fn parse(
  school_closing: &str,
  gatherings: &str,
  stay_at_home: &str,
) -> Result<Vec<InterventionRecord>> {
  let mut records = parse_series(school_closing, &SCHOOL_CLOSING)?;
  records.extend(parse_series(gatherings, &GATHERINGS)?);
  records.extend(parse_series(stay_at_home, &STAY_AT_HOME)?);
  Ok(records)
}

/// Parse one indicator matrix. Countries whose code has no alpha-2 form are
/// dropped; countries that never reach the threshold keep a record with no
/// start date.
fn parse_series(
  csv: &str,
  indicator: &Indicator,
) -> Result<Vec<InterventionRecord>> {
  let mut reader = csv_reader(csv);
  let headers = reader.headers()?.clone();

  let code_col = headers
    .iter()
    .position(|h| h == "country_code")
    .or_else(|| headers.iter().position(str::is_empty))
    .ok_or_else(|| Error::MissingColumn("country_code".to_string()))?;

  let mut date_cols: Vec<(usize, NaiveDate)> = headers
    .iter()
    .enumerate()
    .filter_map(|(i, h)| Some((i, date::parse(h, date::DAY_MON_YEAR).ok()?)))
    .collect();
  date_cols.sort_by_key(|(_, day)| *day);

  let mut records = Vec::new();
  for row in reader.records() {
    let row = row?;
    let Some(region) = row.get(code_col).and_then(geo::alpha2) else {
      continue;
    };
    let levels: Vec<Level> = date_cols
      .iter()
      .map(|(col, _)| row.get(*col).and_then(threshold::level))
      .collect();
    let span = threshold::first_interval(&levels, indicator.threshold);

    records.push(InterventionRecord::interval(
      region,
      None,
      indicator.policy.clone(),
      span.map(|s| date_cols[s.start].1),
      span.and_then(|s| s.end).map(|end| date_cols[end].1),
    ));
  }
  Ok(records)
}
