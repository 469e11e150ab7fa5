//! Parsers for the public datasets casefeed ingests.
//!
//! Each module turns one raw payload (JSON or CSV text) into canonical
//! [`casefeed_core`] records. Pure synchronous; no HTTP or database
//! dependencies, and no state shared between calls.
//!
//! | Module                  | Dataset                              | Output        |
//! |-------------------------|--------------------------------------|---------------|
//! | [`covid_tracking`]      | US state daily snapshots             | cases         |
//! | [`gov_uk`]              | UK overview / nation / region series | cases         |
//! | [`ecdc`]                | ECDC daily cases per country         | cases         |
//! | [`state_policy`]        | US state policy enactments           | interventions |
//! | [`oxcgrt_timeseries`]   | OxCGRT per-indicator world matrices  | interventions |
//! | [`oxcgrt`]              | OxCGRT latest data, UK nations       | interventions |
//!
//! # Quick start
//!
//! ```no_run
//! let json = r#"[{"state": "WA", "date": 20200401, "positive": 10}]"#;
//! let records = casefeed_sources::covid_tracking::parse(json).unwrap();
//! assert_eq!(records[0].subregion_id.as_deref(), Some("US-WA"));
//! ```

pub mod covid_tracking;
pub mod ecdc;
pub mod error;
pub mod geo;
pub mod gov_uk;
pub mod oxcgrt;
pub mod oxcgrt_timeseries;
pub mod state_policy;
pub mod threshold;

mod fill;

pub use error::{Error, Result};

/// A CSV reader over in-memory text that tolerates ragged rows and stray
/// whitespace around cells.
pub(crate) fn csv_reader(input: &str) -> csv::Reader<&[u8]> {
  csv::ReaderBuilder::new()
    .flexible(true)
    .trim(csv::Trim::All)
    .from_reader(input.as_bytes())
}
