//! US state-level daily snapshots (COVID Tracking Project `states/daily`).
//!
//! Each row is one state on one day with cumulative counts; any count may be
//! missing. Rows are date-sorted and forward-filled per state.

use casefeed_core::{date, record::CaseRecord};
use serde::Deserialize;

use crate::{
  Result,
  fill::{ForwardFill, Reported},
};

#[derive(Deserialize)]
struct Row {
  state:     String,
  /// `YYYYMMDD` as an integer.
  date:      u32,
  #[serde(default)]
  positive:  Option<i64>,
  #[serde(default)]
  recovered: Option<i64>,
  #[serde(default)]
  death:     Option<i64>,
}

/// Parse the `states/daily.json` payload into `US` / `US-{state}` records.
pub fn parse(json: &str) -> Result<Vec<CaseRecord>> {
  let mut rows: Vec<Row> = serde_json::from_str(json)?;
  rows.sort_by_key(|r| r.date);

  let mut fill = ForwardFill::new();
  rows
    .into_iter()
    .map(|row| -> Result<CaseRecord> {
      let day = date::parse(&row.date.to_string(), date::COMPACT)?;
      let counts = fill.fill(row.state.clone(), Reported {
        confirmed: row.positive,
        recovered: row.recovered,
        deaths:    row.death,
      });
      Ok(CaseRecord::new("US", Some(format!("US-{}", row.state)), day, counts))
    })
    .collect()
}
