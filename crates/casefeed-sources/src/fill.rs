//! Forward-fill of cumulative counts per geography key.

use std::{collections::HashMap, hash::Hash};

use casefeed_core::record::Counts;

/// Raw counts as reported on one row; `None` where the source left a gap.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Reported {
  pub confirmed: Option<i64>,
  pub recovered: Option<i64>,
  pub deaths:    Option<i64>,
}

/// Last-known counts per key. Rows must be fed in date order.
///
/// A reported value replaces the last-known one; a gap carries it forward;
/// a key seen for the first time starts from zero.
pub(crate) struct ForwardFill<K> {
  last: HashMap<K, Counts>,
}

impl<K: Eq + Hash> ForwardFill<K> {
  pub fn new() -> Self { Self { last: HashMap::new() } }

  pub fn fill(&mut self, key: K, row: Reported) -> Counts {
    let current = self.last.entry(key).or_default();
    if let Some(c) = row.confirmed {
      current.confirmed = c;
    }
    if let Some(r) = row.recovered {
      current.recovered = r;
    }
    if let Some(d) = row.deaths {
      current.deaths = d;
    }
    *current
  }
}
