//! UK nation interventions from the OxCGRT latest-data CSV.
//!
//! The file has one row per (country or subnational region, date) with a
//! column per policy indicator. The four UK nations appear as subnational
//! rows, matched by `RegionName`. Every span where an indicator sits at or
//! above its threshold becomes one intervention record.

use casefeed_core::{
  date,
  record::{InterventionRecord, Policy},
};
use chrono::NaiveDate;

use crate::{
  Error, Result, csv_reader,
  threshold::{self, Level},
};

// ─── Indicators ──────────────────────────────────────────────────────────────

/// An OxCGRT indicator tracked as a policy, with the ordinal level at which
/// the policy counts as in effect.
#[derive(Debug, Clone)]
pub(crate) struct Indicator {
  pub policy:    Policy,
  /// Column name in the latest-data CSV.
  pub column:    &'static str,
  pub threshold: f64,
}

/// C1 level 2: closing required at some levels.
pub(crate) const SCHOOL_CLOSING: Indicator = Indicator {
  policy:    Policy::SchoolClose,
  column:    "C1_School closing",
  threshold: 2.0,
};

/// C4 level 3: gatherings of 11–100 people restricted.
pub(crate) const GATHERINGS: Indicator = Indicator {
  policy:    Policy::GathRestrict10,
  column:    "C4_Restrictions on gatherings",
  threshold: 3.0,
};

/// C6 level 2: not leaving the house, with exceptions.
pub(crate) const STAY_AT_HOME: Indicator = Indicator {
  policy:    Policy::StayAtHome,
  column:    "C6_Stay at home requirements",
  threshold: 2.0,
};

const INDICATORS: [Indicator; 3] = [SCHOOL_CLOSING, GATHERINGS, STAY_AT_HOME];

/// ISO 3166-2 subdivision → OxCGRT `RegionName`.
const NATIONS: &[(&str, &str)] = &[
  ("GB-WLS", "Wales"),
  ("GB-SCT", "Scotland"),
  ("GB-ENG", "England"),
  ("GB-NIR", "Northern Ireland"),
];

// ─── Parser ──────────────────────────────────────────────────────────────────

struct NationDay {
  date:   NaiveDate,
  levels: [Level; 3],
}

/// Parse the OxCGRT latest-data CSV. `source` is recorded on every record,
/// normally the URL the CSV was fetched from.
pub fn parse(csv: &str, source: &str) -> Result<Vec<InterventionRecord>> {
  let mut reader = csv_reader(csv);
  let headers = reader.headers()?.clone();
  let column = |name: &str| {
    headers
      .iter()
      .position(|h| h == name)
      .ok_or_else(|| Error::MissingColumn(name.to_string()))
  };
  let region_col = column("RegionName")?;
  let date_col = column("Date")?;
  let indicator_cols = [
    column(INDICATORS[0].column)?,
    column(INDICATORS[1].column)?,
    column(INDICATORS[2].column)?,
  ];

  let mut by_nation: Vec<Vec<NationDay>> =
    NATIONS.iter().map(|_| Vec::new()).collect();
  for row in reader.records() {
    let row = row?;
    let region = row.get(region_col).unwrap_or_default();
    let Some(nation) = NATIONS.iter().position(|(_, name)| *name == region)
    else {
      continue;
    };
    let day = date::parse(row.get(date_col).unwrap_or_default(), date::COMPACT)?;
    let levels =
      indicator_cols.map(|col| row.get(col).and_then(threshold::level));
    by_nation[nation].push(NationDay { date: day, levels });
  }

  let mut records = Vec::new();
  for ((subregion, _), mut days) in NATIONS.iter().zip(by_nation) {
    days.sort_by_key(|d| d.date);
    for (i, indicator) in INDICATORS.iter().enumerate() {
      let levels: Vec<Level> = days.iter().map(|d| d.levels[i]).collect();
      for span in threshold::intervals(&levels, indicator.threshold) {
        let mut record = InterventionRecord::interval(
          "GB",
          Some(subregion.to_string()),
          indicator.policy.clone(),
          Some(days[span.start].date),
          span.end.map(|end| days[end].date),
        );
        record.source = Some(source.to_string());
        records.push(record);
      }
    }
  }
  Ok(records)
}
