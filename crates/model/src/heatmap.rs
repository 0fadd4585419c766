// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! The pairwise interference table.
//!
//! `speedup(a, b)` is the runtime factor job `a` experiences while
//! co-running with job `b`. The table is asymmetric and `None` means the
//! pairing was never measured. Call sites choose their own fallback for
//! unknown pairings: the engine substitutes the job's average speedup,
//! host scorers substitute `1.0`, and the rank computation skips the pair.

use std::collections::HashMap;

use crate::Error;

/// An inference engine that predicts the speedup of a pairing from the
/// concatenated feature tags of both jobs.
pub trait SpeedupPredictor: Send {
    /// Predicted speedup for the job whose tags come first, or `None` when
    /// the model cannot score the pairing.
    fn predict(&self, tags: &[String]) -> Option<f64>;
}

/// Asymmetric per-pair speedup table keyed by job name.
#[derive(Debug, Clone, Default)]
pub struct Heatmap {
    rows: HashMap<String, HashMap<String, Option<f64>>>,
}

impl Heatmap {
    /// The empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the JSON form `{"A": {"B": 1.08, "C": null}, ...}`.
    pub fn from_json(text: &str) -> Result<Self, Error> {
        let rows: HashMap<String, HashMap<String, Option<f64>>> = serde_json::from_str(text)
            .map_err(|e| Error::MalformedHeatmap {
                details: e.to_string(),
            })?;
        Ok(Self { rows })
    }

    /// Whether the table holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The speedup `a` experiences next to `b`; `None` when the pairing is
    /// unknown (missing entry or explicit null).
    #[must_use]
    pub fn speedup(&self, a: &str, b: &str) -> Option<f64> {
        self.rows.get(a).and_then(|row| row.get(b).copied())?
    }

    /// All known (non-null) speedups of `a`'s row.
    #[must_use]
    pub fn row_values(&self, a: &str) -> Vec<f64> {
        self.rows
            .get(a)
            .map(|row| row.values().filter_map(|v| *v).collect())
            .unwrap_or_default()
    }

    /// Records the speedup `a` experiences next to `b`.
    pub fn insert(&mut self, a: &str, b: &str, value: Option<f64>) {
        let _ = self
            .rows
            .entry(a.to_owned())
            .or_default()
            .insert(b.to_owned(), value);
    }

    /// Ensures a (possibly empty) row exists for `name`.
    pub fn ensure_row(&mut self, name: &str) {
        let _ = self.rows.entry(name.to_owned()).or_default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip_with_nulls() {
        let map =
            Heatmap::from_json(r#"{"A": {"A": 1.0, "B": 0.5, "C": null}, "B": {"A": 1.2}}"#)
                .expect("valid heatmap json");
        assert_eq!(map.speedup("A", "B"), Some(0.5));
        assert_eq!(map.speedup("A", "C"), None, "null means unknown");
        assert_eq!(map.speedup("B", "Z"), None, "missing means unknown");
        assert_eq!(map.speedup("A", "B"), Some(0.5));
        let mut row = map.row_values("A");
        row.sort_by(f64::total_cmp);
        assert_eq!(row, vec![0.5, 1.0]);
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            Heatmap::from_json("{not json"),
            Err(Error::MalformedHeatmap { .. })
        ));
    }
}
