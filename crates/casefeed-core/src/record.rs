//! Record types: the canonical schema every source is normalized into.
//!
//! Records carry no identity beyond their tuple key. Each pipeline run builds
//! a complete new batch of both kinds and the store swaps it in wholesale.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ─── Cases ───────────────────────────────────────────────────────────────────

/// Cumulative case counts for one (region, subregion, date).
///
/// Counts are monotonically non-decreasing within a series. `recovered` is
/// only tracked by the US source; every other parser emits 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseRecord {
  /// ISO 3166-1 alpha-2 code, or another top-level geo code (ECDC `geoId`).
  pub region_id:            String,
  /// Nation, state or region code; `None` for the whole region.
  pub subregion_id:         Option<String>,
  pub date:                 NaiveDate,
  pub confirmed_cumulative: i64,
  pub recovered_cumulative: i64,
  pub deaths_cumulative:    i64,
}

impl CaseRecord {
  pub fn new(
    region_id: impl Into<String>,
    subregion_id: Option<String>,
    date: NaiveDate,
    counts: Counts,
  ) -> Self {
    Self {
      region_id: region_id.into(),
      subregion_id,
      date,
      confirmed_cumulative: counts.confirmed,
      recovered_cumulative: counts.recovered,
      deaths_cumulative: counts.deaths,
    }
  }

  pub fn counts(&self) -> Counts {
    Counts {
      confirmed: self.confirmed_cumulative,
      recovered: self.recovered_cumulative,
      deaths:    self.deaths_cumulative,
    }
  }
}

/// The three cumulative metrics of a [`CaseRecord`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
  pub confirmed: i64,
  pub recovered: i64,
  pub deaths:    i64,
}

impl std::ops::Add for Counts {
  type Output = Self;

  fn add(self, rhs: Self) -> Self {
    Self {
      confirmed: self.confirmed + rhs.confirmed,
      recovered: self.recovered + rhs.recovered,
      deaths:    self.deaths + rhs.deaths,
    }
  }
}

// ─── Policies ────────────────────────────────────────────────────────────────

/// The policy an intervention record describes.
///
/// The OxCGRT-derived sources use the three canonical names; US state policy
/// rows keep their free-text name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Policy {
  SchoolClose,
  /// Gatherings restricted to ten people or fewer.
  GathRestrict10,
  StayAtHome,
  Named(String),
}

impl Policy {
  pub fn as_str(&self) -> &str {
    match self {
      Self::SchoolClose => "SchoolClose",
      Self::GathRestrict10 => "GathRestrict10",
      Self::StayAtHome => "StayAtHome",
      Self::Named(name) => name,
    }
  }
}

impl From<String> for Policy {
  fn from(s: String) -> Self {
    match s.as_str() {
      "SchoolClose" => Self::SchoolClose,
      "GathRestrict10" => Self::GathRestrict10,
      "StayAtHome" => Self::StayAtHome,
      _ => Self::Named(s),
    }
  }
}

impl From<&str> for Policy {
  fn from(s: &str) -> Self { Self::from(s.to_string()) }
}

impl From<Policy> for String {
  fn from(p: Policy) -> Self {
    match p {
      Policy::Named(name) => name,
      other => other.as_str().to_string(),
    }
  }
}

impl fmt::Display for Policy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Interventions ───────────────────────────────────────────────────────────

/// One enactment interval of a policy in a region or subregion.
///
/// Several records may share a (region, subregion, policy) when the policy
/// was lifted and re-imposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterventionRecord {
  pub region_id:       String,
  pub subregion_id:    Option<String>,
  pub policy:          Policy,
  pub notes:           Option<String>,
  /// Free text or the URL of the dataset the record came from.
  pub source:          Option<String>,
  pub issue_date:      Option<NaiveDate>,
  /// Required for the record to be persisted; see [`Self::is_dated`].
  pub start_date:      Option<NaiveDate>,
  pub ease_date:       Option<NaiveDate>,
  pub expiration_date: Option<NaiveDate>,
  pub end_date:        Option<NaiveDate>,
}

impl InterventionRecord {
  /// A record with only the identifying fields and an interval set.
  pub fn interval(
    region_id: impl Into<String>,
    subregion_id: Option<String>,
    policy: Policy,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
  ) -> Self {
    Self {
      region_id: region_id.into(),
      subregion_id,
      policy,
      notes: None,
      source: None,
      issue_date: None,
      start_date,
      ease_date: None,
      expiration_date: None,
      end_date,
    }
  }

  /// Whether the record has the start date persistence requires.
  pub fn is_dated(&self) -> bool { self.start_date.is_some() }
}
