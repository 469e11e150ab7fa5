//! Error type for `casefeed-fetch`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("GET {url} returned {status}")]
  Status {
    url:    String,
    status: reqwest::StatusCode,
  },

  #[error("redirect from {0} has no usable Location header")]
  MissingLocation(String),

  #[error("too many redirects fetching {0}")]
  TooManyRedirects(String),

  #[error("invalid url: {0}")]
  Url(#[from] url::ParseError),

  #[error("io error on {path:?}: {error}")]
  Io {
    path:  PathBuf,
    #[source]
    error: std::io::Error,
  },

  /// A payload was fetched but its parser rejected it.
  #[error("failed to parse {dataset}: {error}")]
  Parse {
    dataset: &'static str,
    #[source]
    error:   casefeed_sources::Error,
  },

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

impl Error {
  pub(crate) fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
    Self::Io { path: path.into(), error }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
