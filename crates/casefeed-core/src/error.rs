//! Error types for `casefeed-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid date {value:?} (expected format {format})")]
  InvalidDate { value: String, format: &'static str },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
