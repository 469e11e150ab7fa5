//! Error types for the casefeed source parsers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("CSV error: {0}")]
  Csv(#[from] csv::Error),

  #[error("missing column {0:?}")]
  MissingColumn(String),

  #[error("invalid number in {field}: {value:?}")]
  InvalidNumber { field: &'static str, value: String },

  #[error(transparent)]
  Core(#[from] casefeed_core::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
