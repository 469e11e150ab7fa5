//! US state social-distancing policies (COVID19StatePolicy/SocialDistancing).
//!
//! One CSV row per enactment with explicit issue / enacted / eased / expiry /
//! ended dates; rows pass through with light validation.

use casefeed_core::{
  date,
  record::{InterventionRecord, Policy},
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{Result, csv_reader};

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Row {
  #[serde(default)]
  state_policy:        Option<String>,
  #[serde(default)]
  state_postal:        Option<String>,
  #[serde(default)]
  date_enacted:        Option<String>,
  #[serde(default)]
  date_issued:         Option<String>,
  #[serde(default)]
  date_eased:          Option<String>,
  #[serde(default)]
  date_expiry:         Option<String>,
  #[serde(default)]
  date_ended:          Option<String>,
  #[serde(default)]
  policy_coding_notes: Option<String>,
  #[serde(default)]
  policy_source:       Option<String>,
}

/// Parse the state policy CSV. Rows missing a policy name, state code or
/// enactment date are skipped.
pub fn parse(csv: &str) -> Result<Vec<InterventionRecord>> {
  let mut records = Vec::new();
  for row in csv_reader(csv).deserialize::<Row>() {
    let row = row?;
    let (Some(policy), Some(postal), Some(enacted)) = (
      text(row.state_policy),
      text(row.state_postal),
      text(row.date_enacted),
    ) else {
      continue;
    };

    records.push(InterventionRecord {
      region_id:       "US".to_string(),
      subregion_id:    Some(format!("US-{postal}")),
      policy:          Policy::from(policy),
      notes:           text(row.policy_coding_notes),
      source:          text(row.policy_source),
      issue_date:      optional_date(row.date_issued)?,
      start_date:      Some(parse_date(&enacted)?),
      ease_date:       optional_date(row.date_eased)?,
      expiration_date: optional_date(row.date_expiry)?,
      end_date:        optional_date(row.date_ended)?,
    });
  }
  Ok(records)
}

fn text(value: Option<String>) -> Option<String> {
  value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_date(value: &str) -> Result<NaiveDate> {
  Ok(date::parse_any(value, &[date::ISO, date::COMPACT])?)
}

fn optional_date(value: Option<String>) -> Result<Option<NaiveDate>> {
  text(value).as_deref().map(parse_date).transpose()
}
