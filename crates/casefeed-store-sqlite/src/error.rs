//! Error type for `casefeed-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] casefeed_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// An empty batch was offered; nothing was touched.
  #[error("no data found for table {0}")]
  NoData(&'static str),

  /// The new batch is smaller than the live table; the load was rolled back.
  #[error(
    "new table {table}_import has fewer rows than {table}: {shadow} rows and \
     {live} rows respectively"
  )]
  Regression {
    table:  &'static str,
    live:   u64,
    shadow: u64,
  },
}

impl Error {
  /// Whether this is a regression-guard trip, which `--force` bypasses.
  pub fn is_regression(&self) -> bool { matches!(self, Self::Regression { .. }) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
