//! SQL schema for the casefeed SQLite store.
//!
//! Table DDL is generated from [`Table`] so a shadow copy can be created
//! under another name with exactly the live table's columns. The tables carry
//! no secondary indexes: index names do not follow a table through
//! `ALTER TABLE ... RENAME`, so they would collide on the next swap.

/// A replaceable table: its live name and column definitions.
pub struct Table {
  pub name:    &'static str,
  pub columns: &'static [(&'static str, &'static str)],
}

pub const CASE_DATA: Table = Table {
  name:    "case_data",
  columns: &[
    ("region_id", "TEXT NOT NULL"),
    ("subregion_id", "TEXT"),
    ("date", "TEXT NOT NULL"), // YYYY-MM-DD
    ("confirmed", "INTEGER NOT NULL"),
    ("recovered", "INTEGER NOT NULL"),
    ("deaths", "INTEGER NOT NULL"),
  ],
};

pub const INTERVENTION_DATA: Table = Table {
  name:    "intervention_data",
  columns: &[
    ("region_id", "TEXT NOT NULL"),
    ("subregion_id", "TEXT"),
    ("policy", "TEXT NOT NULL"),
    ("notes", "TEXT"),
    ("source", "TEXT"),
    ("issue_date", "TEXT"),
    ("start_date", "TEXT"),
    ("ease_date", "TEXT"),
    ("expiration_date", "TEXT"),
    ("end_date", "TEXT"),
  ],
};

impl Table {
  /// Name of the table a new batch is loaded into before the swap.
  pub fn shadow(&self) -> String { format!("{}_import", self.name) }

  /// Name the live table is renamed to during the swap, then dropped.
  pub fn retired(&self) -> String { format!("{}_old", self.name) }

  pub fn create_sql(&self, name: &str) -> String {
    let columns = self
      .columns
      .iter()
      .map(|(col, ty)| format!("    {col} {ty}"))
      .collect::<Vec<_>>()
      .join(",\n");
    format!("CREATE TABLE IF NOT EXISTS {name} (\n{columns}\n);\n")
  }

  pub fn insert_sql(&self, name: &str) -> String {
    let names = self
      .columns
      .iter()
      .map(|(col, _)| *col)
      .collect::<Vec<_>>()
      .join(", ");
    let params = (1..=self.columns.len())
      .map(|i| format!("?{i}"))
      .collect::<Vec<_>>()
      .join(", ");
    format!("INSERT INTO {name} ({names}) VALUES ({params})")
  }
}

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub fn schema() -> String {
  format!(
    "PRAGMA journal_mode = WAL;\n{}{}PRAGMA user_version = 1;\n",
    CASE_DATA.create_sql(CASE_DATA.name),
    INTERVENTION_DATA.create_sql(INTERVENTION_DATA.name),
  )
}
