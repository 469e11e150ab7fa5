//! Calendar-date helpers shared by the parsers and the store.
//!
//! Every date in the pipeline is a [`NaiveDate`]; sources disagree on how
//! they spell one, so each parser names the format it expects.

use chrono::NaiveDate;

use crate::{Error, Result};

/// `2020-03-16`: the canonical form, also used for storage.
pub const ISO: &str = "%Y-%m-%d";
/// `20200316`: US tracker dates and OxCGRT `Date` cells.
pub const COMPACT: &str = "%Y%m%d";
/// `16/03/2020`: ECDC `dateRep`.
pub const DAY_MONTH_YEAR: &str = "%d/%m/%Y";
/// `16Mar2020`: OxCGRT time-series column headers.
pub const DAY_MON_YEAR: &str = "%d%b%Y";

/// Parse `value` with a single `format`.
pub fn parse(value: &str, format: &'static str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(value.trim(), format).map_err(|_| {
    Error::InvalidDate {
      value: value.to_string(),
      format,
    }
  })
}

/// Parse `value` with the first of `formats` that accepts it.
pub fn parse_any(value: &str, formats: &[&'static str]) -> Result<NaiveDate> {
  formats
    .iter()
    .find_map(|f| NaiveDate::parse_from_str(value.trim(), f).ok())
    .ok_or_else(|| Error::InvalidDate {
      value:  value.to_string(),
      format: formats.first().copied().unwrap_or(ISO),
    })
}

/// Render a date in the canonical storage form.
pub fn to_iso(date: NaiveDate) -> String { date.format(ISO).to_string() }
