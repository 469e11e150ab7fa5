//! casefeed binary.
//!
//! Reads `casefeed.toml` (or the path given with `--config`) layered under
//! `CASEFEED_*` environment variables, refreshes every dataset and replaces
//! the tables in the SQLite store. Exits with status 1 if any step failed.
//!
//! ```text
//! casefeed --cache-dir .cache --dry-run
//! ```

use std::{path::PathBuf, process::ExitCode};

use anyhow::Context as _;
use casefeed_core::store::RegressionGuard;
use casefeed_fetch::{FetchConfig, Fetcher, RunOptions};
use casefeed_store_sqlite::SqliteStore;
use clap::Parser;
use tracing::{Instrument as _, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "Refresh casefeed case and intervention data")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "casefeed.toml")]
  config: PathBuf,

  /// Cache downloads here and write JSON snapshots of the parsed records.
  #[arg(long)]
  cache_dir: Option<PathBuf>,

  /// SQLite database to load into.
  #[arg(long)]
  store: Option<PathBuf>,

  /// Replace tables even when the new batch has fewer rows.
  #[arg(long)]
  force: bool,

  /// Fetch and parse only; do not write to the store.
  #[arg(long)]
  dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(casefeed_fetch::config::environment())
    .build()
    .context("failed to read config file")?;

  let mut cfg: FetchConfig = settings
    .try_deserialize()
    .context("failed to deserialise FetchConfig")?;
  if let Some(dir) = cli.cache_dir {
    cfg.cache_dir = Some(dir);
  }
  if let Some(path) = cli.store {
    cfg.store_path = path;
  }

  let options = RunOptions {
    guard:   RegressionGuard::from_force(cli.force),
    dry_run: cli.dry_run,
  };

  let fetcher =
    Fetcher::new(cfg.cache_dir.clone()).context("failed to build HTTP client")?;

  let store = if options.dry_run {
    SqliteStore::open_in_memory().await
  } else {
    SqliteStore::open(&cfg.store_path).await
  }
  .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;

  let span = tracing::info_span!("run", run_id = %Uuid::new_v4());
  let report = casefeed_fetch::run(&fetcher, &cfg.sources, &store, options)
    .instrument(span)
    .await
    .context("refresh aborted")?;

  if report.is_error() {
    return Ok(ExitCode::FAILURE);
  }
  tracing::info!(
    cases = report.case_rows,
    interventions = report.intervention_rows,
    "refresh complete"
  );
  Ok(ExitCode::SUCCESS)
}
