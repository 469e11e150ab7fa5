//! ECDC case distribution: daily new cases and deaths per country.
//!
//! The feed publishes daily increments, so each country's series is sorted
//! and folded into running totals.

use std::collections::BTreeMap;

use casefeed_core::{
  date,
  record::{CaseRecord, Counts},
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{Error, Result};

/// Countries covered by a dedicated source. ECDC uses `UK` for the United
/// Kingdom.
const EXCLUDED_GEO_IDS: &[&str] = &["US", "UK"];

#[derive(Deserialize)]
struct Payload {
  records: Vec<Row>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Row {
  date_rep: String,
  cases:    Count,
  deaths:   Count,
  geo_id:   String,
}

/// Daily counts arrive as numbers in the JSON feed and as strings in older
/// exports.
#[derive(Deserialize)]
#[serde(untagged)]
enum Count {
  Number(i64),
  Text(String),
}

impl Count {
  fn value(&self, field: &'static str) -> Result<i64> {
    match self {
      Self::Number(n) => Ok(*n),
      Self::Text(s) => s.trim().parse().map_err(|_| Error::InvalidNumber {
        field,
        value: s.clone(),
      }),
    }
  }
}

/// Parse the `casedistribution/json` payload into per-country cumulative
/// records. Rows for countries with a dedicated source are dropped.
pub fn parse(json: &str) -> Result<Vec<CaseRecord>> {
  let payload: Payload = serde_json::from_str(json)?;

  let mut by_country: BTreeMap<String, Vec<(NaiveDate, i64, i64)>> =
    BTreeMap::new();
  for row in payload.records {
    if EXCLUDED_GEO_IDS.contains(&row.geo_id.as_str()) {
      continue;
    }
    let day = date::parse(&row.date_rep, date::DAY_MONTH_YEAR)?;
    let cases = row.cases.value("cases")?;
    let deaths = row.deaths.value("deaths")?;
    by_country.entry(row.geo_id).or_default().push((day, cases, deaths));
  }

  let mut records = Vec::new();
  for (geo_id, mut days) in by_country {
    days.sort_by_key(|(day, ..)| *day);
    let mut total = Counts::default();
    for (day, cases, deaths) in days {
      total = total + Counts { confirmed: cases, recovered: 0, deaths };
      records.push(CaseRecord::new(geo_id.clone(), None, day, total));
    }
  }
  Ok(records)
}
