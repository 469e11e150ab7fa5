//! [`SqliteStore`], the SQLite implementation of [`RecordStore`].

use std::path::Path;

use casefeed_core::{
  record::{CaseRecord, InterventionRecord},
  store::{LoadSummary, RecordQuery, RecordStore, RegressionGuard},
};
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  encode::{RawCaseRecord, RawInterventionRecord, TableRow, encode_date},
  schema::{Table, schema},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A casefeed record store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// Result of the transactional part of a load.
enum Swap {
  Replaced { previous: u64, loaded: u64 },
  /// The guard tripped and the transaction was rolled back.
  Regressed { live: u64, shadow: u64 },
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing and dry runs.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    let ddl = schema();
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(&ddl)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Replace `R`'s table with `records` through the shadow table.
  async fn load<R: TableRow>(
    &self,
    records: Vec<R>,
    guard: RegressionGuard,
  ) -> Result<LoadSummary> {
    let table = R::TABLE.name;
    if records.is_empty() {
      return Err(Error::NoData(table));
    }
    debug!(table, rows = records.len(), "loading shadow table");

    let swap = self
      .conn
      .call(move |conn| Ok(shadow_swap(conn, &records, guard)?))
      .await?;

    match swap {
      Swap::Replaced { previous, loaded } => {
        info!(table, previous, loaded, "table replaced");
        Ok(LoadSummary {
          table:         table.to_string(),
          previous_rows: previous,
          loaded_rows:   loaded,
        })
      }
      Swap::Regressed { live, shadow } => {
        warn!(table, live, shadow, "new batch is smaller than live table");
        Err(Error::Regression { table, live, shadow })
      }
    }
  }
}

#[cfg(test)]
impl SqliteStore {
  pub(crate) async fn table_names(&self) -> Result<Vec<String>> {
    Ok(
      self
        .conn
        .call(|conn| {
          let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
          )?;
          let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
          Ok(names)
        })
        .await?,
    )
  }

  pub(crate) async fn execute_batch(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Shadow swap ─────────────────────────────────────────────────────────────

/// Load `records` into a shadow table, then swap it in for the live table.
///
/// The shadow and retired tables are dropped afterwards whether or not the
/// swap committed.
fn shadow_swap<R: TableRow>(
  conn: &mut rusqlite::Connection,
  records: &[R],
  guard: RegressionGuard,
) -> rusqlite::Result<Swap> {
  let table = &R::TABLE;
  let swap = swap_in(conn, table, records, guard);
  let cleanup = drop_leftovers(conn, table);
  let swap = swap?;
  cleanup?;
  Ok(swap)
}

fn swap_in<R: TableRow>(
  conn: &mut rusqlite::Connection,
  table: &Table,
  records: &[R],
  guard: RegressionGuard,
) -> rusqlite::Result<Swap> {
  let shadow = table.shadow();
  let retired = table.retired();

  // Dropping `tx` without committing rolls everything back.
  let tx = conn.transaction()?;
  drop_leftovers(&tx, table)?;
  tx.execute_batch(&table.create_sql(&shadow))?;
  {
    let mut stmt = tx.prepare(&table.insert_sql(&shadow))?;
    for record in records {
      record.insert(&mut stmt)?;
    }
  }

  let live = row_count(&tx, table.name)?;
  let loaded = row_count(&tx, &shadow)?;
  if guard.is_enforced() && loaded < live {
    return Ok(Swap::Regressed { live, shadow: loaded });
  }

  tx.execute_batch(&format!(
    "ALTER TABLE {live_name} RENAME TO {retired};
     ALTER TABLE {shadow} RENAME TO {live_name};",
    live_name = table.name,
  ))?;
  tx.commit()?;
  Ok(Swap::Replaced { previous: live, loaded })
}

fn drop_leftovers(conn: &rusqlite::Connection, table: &Table) -> rusqlite::Result<()> {
  conn.execute_batch(&format!(
    "DROP TABLE IF EXISTS {}; DROP TABLE IF EXISTS {};",
    table.retired(),
    table.shadow(),
  ))
}

fn row_count(conn: &rusqlite::Connection, table: &str) -> rusqlite::Result<u64> {
  let n: i64 =
    conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |r| r.get(0))?;
  Ok(n as u64)
}

// ─── Reads ───────────────────────────────────────────────────────────────────

/// Query parameters in the shape both read statements bind.
struct Bounds {
  region_id:    Option<String>,
  subregion_id: Option<String>,
  from:         Option<String>,
  until:        Option<String>,
  limit:        i64,
  offset:       i64,
}

impl From<&RecordQuery> for Bounds {
  fn from(query: &RecordQuery) -> Self {
    Self {
      region_id:    query.region_id.clone(),
      subregion_id: query.subregion_id.clone(),
      from:         query.from.map(encode_date),
      until:        query.until.map(encode_date),
      // A negative LIMIT means no limit in SQLite.
      limit:        query.limit.map_or(-1, |n| n as i64),
      offset:       query.offset.unwrap_or(0) as i64,
    }
  }
}

/// `SELECT` over `table` filtered by [`Bounds`] on `date_column`.
fn select_sql(table: &Table, date_column: &str, order_by: &str) -> String {
  let columns = table
    .columns
    .iter()
    .map(|(col, _)| *col)
    .collect::<Vec<_>>()
    .join(", ");
  format!(
    "SELECT {columns}
     FROM {name}
     WHERE (?1 IS NULL OR region_id = ?1)
       AND (?2 IS NULL OR subregion_id = ?2)
       AND (?3 IS NULL OR {date_column} >= ?3)
       AND (?4 IS NULL OR {date_column} <= ?4)
     ORDER BY {order_by}
     LIMIT ?5 OFFSET ?6",
    name = table.name,
  )
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;

  async fn load_case_data(
    &self,
    records: Vec<CaseRecord>,
    guard: RegressionGuard,
  ) -> Result<LoadSummary> {
    self.load(records, guard).await
  }

  async fn load_intervention_data(
    &self,
    records: Vec<InterventionRecord>,
    guard: RegressionGuard,
  ) -> Result<LoadSummary> {
    self.load(records, guard).await
  }

  async fn case_data(&self, query: &RecordQuery) -> Result<Vec<CaseRecord>> {
    let b = Bounds::from(query);
    let sql = select_sql(
      &CaseRecord::TABLE,
      "date",
      "region_id, subregion_id, date",
    );

    let raws: Vec<RawCaseRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              b.region_id, b.subregion_id, b.from, b.until, b.limit, b.offset,
            ],
            RawCaseRecord::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCaseRecord::into_record).collect()
  }

  async fn intervention_data(
    &self,
    query: &RecordQuery,
  ) -> Result<Vec<InterventionRecord>> {
    let b = Bounds::from(query);
    let sql = select_sql(
      &InterventionRecord::TABLE,
      "start_date",
      "region_id, subregion_id, policy, start_date",
    );

    let raws: Vec<RawInterventionRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              b.region_id, b.subregion_id, b.from, b.until, b.limit, b.offset,
            ],
            RawInterventionRecord::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawInterventionRecord::into_record).collect()
  }
}
