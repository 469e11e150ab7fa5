//! UK cumulative series from the coronavirus.data.gov.uk v2 API.
//!
//! Up to three payloads share one shape (`{"body": [...]}`) and differ in
//! area type: the UK overview, the four nations, and the English regions.
//! English regions are additionally rolled up into NHS England regions.

use std::collections::BTreeMap;

use casefeed_core::{
  date,
  record::{CaseRecord, Counts},
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
  Result,
  fill::{ForwardFill, Reported},
  geo,
};

#[derive(Deserialize)]
struct Payload {
  body: Vec<Row>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Row {
  area_code:                  String,
  date:                       String,
  #[serde(default)]
  cum_cases_by_specimen_date: Option<i64>,
  #[serde(default, rename = "cumDeaths28DaysByDeathDate")]
  cum_deaths_28_days:         Option<i64>,
}

#[derive(Debug, Clone, Copy)]
enum AreaType {
  Overview,
  Nation,
  Region,
}

impl AreaType {
  /// The subregion a row belongs to; the outer `None` means the area code is
  /// not one this breakdown knows about and the row is skipped.
  fn subregion(self, area_code: &str) -> Option<Option<String>> {
    match self {
      Self::Overview => Some(None),
      Self::Nation => geo::nation_subregion(area_code).map(|c| Some(c.to_string())),
      Self::Region => Some(Some(area_code.to_string())),
    }
  }
}

/// Parse the overview, nation and (optional) region payloads.
///
/// Output order is overview, nations, regions, then the derived NHS region
/// series. Recovered counts are not published and are always 0.
pub fn parse(
  overview: &str,
  nation: &str,
  region: Option<&str>,
) -> Result<Vec<CaseRecord>> {
  let mut records = parse_area(overview, AreaType::Overview)?;
  records.extend(parse_area(nation, AreaType::Nation)?);

  if let Some(region) = region {
    let regions = parse_area(region, AreaType::Region)?;
    let nhs = nhs_regions(&regions);
    records.extend(regions);
    records.extend(nhs);
  }

  Ok(records)
}

fn parse_area(json: &str, area: AreaType) -> Result<Vec<CaseRecord>> {
  let payload: Payload = serde_json::from_str(json)?;
  let mut rows = payload
    .body
    .into_iter()
    .map(|row| -> Result<(NaiveDate, Row)> {
      Ok((date::parse(&row.date, date::ISO)?, row))
    })
    .collect::<Result<Vec<_>>>()?;
  rows.sort_by_key(|(day, _)| *day);

  let mut fill = ForwardFill::new();
  let mut records = Vec::with_capacity(rows.len());
  for (day, row) in rows {
    let Some(subregion) = area.subregion(&row.area_code) else {
      continue;
    };
    let counts = fill.fill(subregion.clone(), Reported {
      confirmed: row.cum_cases_by_specimen_date,
      recovered: None,
      deaths:    row.cum_deaths_28_days,
    });
    records.push(CaseRecord::new("GB", subregion, day, counts));
  }
  Ok(records)
}

/// Sum ONS region records into NHS England regions per date. Regions without
/// an NHS mapping are left out.
fn nhs_regions(regions: &[CaseRecord]) -> Vec<CaseRecord> {
  let mut totals: BTreeMap<(NaiveDate, &'static str), Counts> = BTreeMap::new();
  for record in regions {
    let Some(nhs) = record.subregion_id.as_deref().and_then(geo::nhs_region)
    else {
      continue;
    };
    let total = totals.entry((record.date, nhs)).or_default();
    *total = *total + record.counts();
  }

  totals
    .into_iter()
    .map(|((day, nhs), counts)| {
      CaseRecord::new("GB", Some(nhs.to_string()), day, counts)
    })
    .collect()
}
