//! Threshold-crossing interval extraction over ordinal strictness series.
//!
//! OxCGRT publishes policy strictness as an ordinal level per date. A policy
//! counts as "in effect" on the dates where the level reaches a per-policy
//! threshold. Cells that are blank or non-numeric are `None`.

/// A strictness level; `None` where the source cell is not a number.
pub type Level = Option<f64>;

/// A span of column indices where a level was at or above threshold.
/// `end` is the first index below threshold, or `None` if the span runs
/// through the last column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
  pub start: usize,
  pub end:   Option<usize>,
}

/// Parse a strictness cell. Accepts integers and decimals (`"2"`, `"2.00"`).
pub fn level(cell: &str) -> Level {
  cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Every interval in `levels`. Non-numeric cells count as below threshold,
/// so they close an open interval.
pub fn intervals(levels: &[Level], threshold: f64) -> Vec<Interval> {
  let mut found = Vec::new();
  let mut open: Option<usize> = None;

  for (i, level) in levels.iter().enumerate() {
    let above = level.is_some_and(|l| l >= threshold);
    match (open, above) {
      (None, true) => open = Some(i),
      (Some(start), false) => {
        found.push(Interval { start, end: Some(i) });
        open = None;
      }
      _ => {}
    }
  }

  if let Some(start) = open {
    found.push(Interval { start, end: None });
  }
  found
}

/// The first interval in `levels`, or `None` if the threshold is never
/// reached. Non-numeric cells neither open nor close the interval.
pub fn first_interval(levels: &[Level], threshold: f64) -> Option<Interval> {
  let start = levels
    .iter()
    .position(|l| l.is_some_and(|l| l >= threshold))?;
  let end = levels[start..]
    .iter()
    .position(|l| l.is_some_and(|l| l < threshold))
    .map(|offset| start + offset);
  Some(Interval { start, end })
}
