//! The `RecordStore` trait and supporting types.
//!
//! The trait is implemented by storage backends (e.g.
//! `casefeed-store-sqlite`). The fetch orchestrator writes through it without
//! depending on a concrete backend.

use std::future::Future;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::record::{CaseRecord, InterventionRecord};

// ─── Load types ──────────────────────────────────────────────────────────────

/// Whether a load may shrink the live table.
///
/// The feeds are assumed never to shrink, so a smaller batch normally means an
/// upstream fetch or parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegressionGuard {
  /// Abort the load if the new batch has fewer rows than the live table.
  #[default]
  Enforce,
  /// Replace the table regardless of size (`--force`).
  Skip,
}

impl RegressionGuard {
  pub fn from_force(force: bool) -> Self {
    if force { Self::Skip } else { Self::Enforce }
  }

  pub fn is_enforced(self) -> bool { matches!(self, Self::Enforce) }
}

/// What a successful load replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
  pub table:         String,
  /// Row count of the live table before the swap.
  pub previous_rows: u64,
  pub loaded_rows:   u64,
}

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for reading persisted records back.
#[derive(Debug, Clone, Default)]
pub struct RecordQuery {
  pub region_id:    Option<String>,
  /// Restrict to one subregion. Whole-region rows have no subregion and are
  /// only returned when this is `None`.
  pub subregion_id: Option<String>,
  /// Inclusive lower bound on `date` (cases) or `start_date` (interventions).
  pub from:         Option<NaiveDate>,
  /// Inclusive upper bound, same column as `from`.
  pub until:        Option<NaiveDate>,
  pub limit:        Option<usize>,
  pub offset:       Option<usize>,
}

impl RecordQuery {
  pub fn region(region_id: impl Into<String>) -> Self {
    Self { region_id: Some(region_id.into()), ..Self::default() }
  }

  pub fn subregion(
    region_id: impl Into<String>,
    subregion_id: impl Into<String>,
  ) -> Self {
    Self {
      region_id: Some(region_id.into()),
      subregion_id: Some(subregion_id.into()),
      ..Self::default()
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a casefeed storage backend.
///
/// Loads replace a whole table atomically: readers see either the previous
/// batch or the new one, never a mix. An empty batch is rejected before any
/// table is touched.
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Loads ─────────────────────────────────────────────────────────────

  /// Replace the `case_data` table with `records`.
  fn load_case_data(
    &self,
    records: Vec<CaseRecord>,
    guard: RegressionGuard,
  ) -> impl Future<Output = Result<LoadSummary, Self::Error>> + Send + '_;

  /// Replace the `intervention_data` table with `records`.
  fn load_intervention_data(
    &self,
    records: Vec<InterventionRecord>,
    guard: RegressionGuard,
  ) -> impl Future<Output = Result<LoadSummary, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Case records matching `query`, ordered by region, subregion and date.
  fn case_data<'a>(
    &'a self,
    query: &'a RecordQuery,
  ) -> impl Future<Output = Result<Vec<CaseRecord>, Self::Error>> + Send + 'a;

  /// Intervention records matching `query`, ordered by region, subregion,
  /// policy and start date.
  fn intervention_data<'a>(
    &'a self,
    query: &'a RecordQuery,
  ) -> impl Future<Output = Result<Vec<InterventionRecord>, Self::Error>>
  + Send
  + 'a;
}
