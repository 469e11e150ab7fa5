//! Encoding and decoding between record types and SQLite rows.
//!
//! Dates are stored as `YYYY-MM-DD` text, policies as their text name.

use casefeed_core::{
  date,
  record::{CaseRecord, InterventionRecord, Policy},
};
use chrono::NaiveDate;
use rusqlite::Statement;

use crate::{
  Result,
  schema::{CASE_DATA, INTERVENTION_DATA, Table},
};

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { date::to_iso(d) }

pub fn decode_date(s: &str) -> Result<NaiveDate> { Ok(date::parse(s, date::ISO)?) }

fn decode_optional_date(s: Option<String>) -> Result<Option<NaiveDate>> {
  s.as_deref().map(decode_date).transpose()
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// A record type that can be bulk-loaded into its table.
pub trait TableRow: Send + 'static {
  const TABLE: Table;

  /// Execute `stmt` (prepared from [`Table::insert_sql`]) for this record.
  fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize>;
}

impl TableRow for CaseRecord {
  const TABLE: Table = CASE_DATA;

  fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
    stmt.execute(rusqlite::params![
      self.region_id,
      self.subregion_id,
      encode_date(self.date),
      self.confirmed_cumulative,
      self.recovered_cumulative,
      self.deaths_cumulative,
    ])
  }
}

impl TableRow for InterventionRecord {
  const TABLE: Table = INTERVENTION_DATA;

  fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
    stmt.execute(rusqlite::params![
      self.region_id,
      self.subregion_id,
      self.policy.as_str(),
      self.notes,
      self.source,
      self.issue_date.map(encode_date),
      self.start_date.map(encode_date),
      self.ease_date.map(encode_date),
      self.expiration_date.map(encode_date),
      self.end_date.map(encode_date),
    ])
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `case_data` row.
pub struct RawCaseRecord {
  pub region_id:    String,
  pub subregion_id: Option<String>,
  pub date:         String,
  pub confirmed:    i64,
  pub recovered:    i64,
  pub deaths:       i64,
}

impl RawCaseRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      region_id:    row.get(0)?,
      subregion_id: row.get(1)?,
      date:         row.get(2)?,
      confirmed:    row.get(3)?,
      recovered:    row.get(4)?,
      deaths:       row.get(5)?,
    })
  }

  pub fn into_record(self) -> Result<CaseRecord> {
    Ok(CaseRecord {
      region_id:            self.region_id,
      subregion_id:         self.subregion_id,
      date:                 decode_date(&self.date)?,
      confirmed_cumulative: self.confirmed,
      recovered_cumulative: self.recovered,
      deaths_cumulative:    self.deaths,
    })
  }
}

/// Raw values read directly from an `intervention_data` row.
pub struct RawInterventionRecord {
  pub region_id:       String,
  pub subregion_id:    Option<String>,
  pub policy:          String,
  pub notes:           Option<String>,
  pub source:          Option<String>,
  pub issue_date:      Option<String>,
  pub start_date:      Option<String>,
  pub ease_date:       Option<String>,
  pub expiration_date: Option<String>,
  pub end_date:        Option<String>,
}

impl RawInterventionRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      region_id:       row.get(0)?,
      subregion_id:    row.get(1)?,
      policy:          row.get(2)?,
      notes:           row.get(3)?,
      source:          row.get(4)?,
      issue_date:      row.get(5)?,
      start_date:      row.get(6)?,
      ease_date:       row.get(7)?,
      expiration_date: row.get(8)?,
      end_date:        row.get(9)?,
    })
  }

  pub fn into_record(self) -> Result<InterventionRecord> {
    Ok(InterventionRecord {
      region_id:       self.region_id,
      subregion_id:    self.subregion_id,
      policy:          Policy::from(self.policy),
      notes:           self.notes,
      source:          self.source,
      issue_date:      decode_optional_date(self.issue_date)?,
      start_date:      decode_optional_date(self.start_date)?,
      ease_date:       decode_optional_date(self.ease_date)?,
      expiration_date: decode_optional_date(self.expiration_date)?,
      end_date:        decode_optional_date(self.end_date)?,
    })
  }
}
