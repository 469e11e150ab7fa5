//! Fetch orchestration for casefeed.
//!
//! Downloads every upstream dataset (through an optional on-disk cache),
//! runs the [`casefeed_sources`] parsers, and replaces the persisted tables
//! through any [`casefeed_core::store::RecordStore`]. The `casefeed` binary
//! wires this to configuration and a [`casefeed_store_sqlite::SqliteStore`].

pub mod config;
pub mod error;
pub mod fetcher;
pub mod pipeline;

pub use config::{FetchConfig, SourceUrls};
pub use error::{Error, Result};
pub use fetcher::Fetcher;
pub use pipeline::{RunOptions, RunReport, TableOutcome, run};

#[cfg(test)]
mod tests;
