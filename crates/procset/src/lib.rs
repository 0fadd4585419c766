// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! Processor sets represented as sorted vectors of half-open intervals.
//!
//! A [`ProcSet`] models the processor identifiers a job holds on a socket.
//! Sets at cluster scale are sparse runs of consecutive core IDs, so the
//! representation favors interval runs over per-core bitmaps; all set
//! operations are linear merges over the runs of both operands.
//!
//! The textual form uses inclusive endpoints, matching the workload trace
//! format: `"0-3 8-11"` is cores 0,1,2,3,8,9,10,11 and a single core is
//! written without a dash.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

pub mod error;

pub use error::Error;

/// A half-open run `[lo, hi)` of consecutive processor IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    lo: u32,
    hi: u32,
}

impl Interval {
    /// First processor ID of the run.
    #[must_use]
    pub const fn lo(&self) -> u32 {
        self.lo
    }

    /// One past the last processor ID of the run.
    #[must_use]
    pub const fn hi(&self) -> u32 {
        self.hi
    }

    /// Number of processors in the run.
    #[must_use]
    pub const fn len(&self) -> usize {
        (self.hi - self.lo) as usize
    }

    /// Whether the run is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lo >= self.hi
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hi - self.lo == 1 {
            write!(f, "{}", self.lo)
        } else {
            write!(f, "{}-{}", self.lo, self.hi - 1)
        }
    }
}

/// A set of processor IDs stored as sorted, disjoint, non-adjacent runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProcSet {
    runs: Vec<Interval>,
}

impl ProcSet {
    /// The empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { runs: Vec::new() }
    }

    /// Builds a set covering the inclusive range `lo..=hi`.
    ///
    /// Fails with [`Error::InvalidInterval`] when `lo > hi`.
    pub fn from_bounds(lo: u32, hi: u32) -> Result<Self, Error> {
        if lo > hi {
            return Err(Error::InvalidInterval { lo, hi });
        }
        Ok(Self {
            runs: vec![Interval { lo, hi: hi + 1 }],
        })
    }

    /// Number of processors in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.iter().map(Interval::len).sum()
    }

    /// Whether the set holds no processors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Whether `proc_id` is a member of the set.
    #[must_use]
    pub fn contains(&self, proc_id: u32) -> bool {
        self.runs
            .binary_search_by(|run| {
                if run.hi <= proc_id {
                    std::cmp::Ordering::Less
                } else if run.lo > proc_id {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    /// The sorted runs of the set.
    pub fn intervals(&self) -> impl Iterator<Item = &Interval> {
        self.runs.iter()
    }

    /// The individual processor IDs of the set, in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.runs.iter().flat_map(|run| run.lo..run.hi)
    }

    /// The `k` smallest processors of the set (all of them if `k` exceeds
    /// the set size).
    #[must_use]
    pub fn take(&self, k: usize) -> Self {
        let mut remaining = k;
        let mut runs = Vec::new();
        for run in &self.runs {
            if remaining == 0 {
                break;
            }
            let span = run.len().min(remaining);
            runs.push(Interval {
                lo: run.lo,
                hi: run.lo + span as u32,
            });
            remaining -= span;
        }
        Self { runs }
    }

    /// The union of `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut runs: Vec<Interval> = Vec::with_capacity(self.runs.len() + other.runs.len());
        let (mut i, mut j) = (0, 0);
        while i < self.runs.len() || j < other.runs.len() {
            let next = if j >= other.runs.len()
                || (i < self.runs.len() && self.runs[i].lo <= other.runs[j].lo)
            {
                let run = self.runs[i];
                i += 1;
                run
            } else {
                let run = other.runs[j];
                j += 1;
                run
            };
            match runs.last_mut() {
                // Overlapping or adjacent runs coalesce.
                Some(last) if next.lo <= last.hi => last.hi = last.hi.max(next.hi),
                _ => runs.push(next),
            }
        }
        Self { runs }
    }

    /// The processors of `self` that are not in `other`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        let mut runs = Vec::new();
        let mut j = 0;
        for run in &self.runs {
            let mut lo = run.lo;
            // Skip the cuts that end before this run starts.
            while j < other.runs.len() && other.runs[j].hi <= lo {
                j += 1;
            }
            let mut k = j;
            while lo < run.hi {
                if k >= other.runs.len() || other.runs[k].lo >= run.hi {
                    runs.push(Interval { lo, hi: run.hi });
                    break;
                }
                let cut = other.runs[k];
                if cut.lo > lo {
                    runs.push(Interval { lo, hi: cut.lo });
                }
                if cut.hi >= run.hi {
                    break;
                }
                lo = cut.hi;
                k += 1;
                // A cut may span several of our runs; re-examine it for the
                // next run instead of consuming it here.
            }
        }
        Self { runs }
    }

    /// The processors common to `self` and `other`.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        let mut runs = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.runs.len() && j < other.runs.len() {
            let (a, b) = (self.runs[i], other.runs[j]);
            let lo = a.lo.max(b.lo);
            let hi = a.hi.min(b.hi);
            if lo < hi {
                runs.push(Interval { lo, hi });
            }
            if a.hi <= b.hi {
                i += 1;
            } else {
                j += 1;
            }
        }
        Self { runs }
    }

    fn normalized(mut intervals: Vec<Interval>) -> Self {
        intervals.sort_by_key(|run| run.lo);
        let mut runs: Vec<Interval> = Vec::with_capacity(intervals.len());
        for next in intervals {
            match runs.last_mut() {
                Some(last) if next.lo <= last.hi => last.hi = last.hi.max(next.hi),
                _ => runs.push(next),
            }
        }
        Self { runs }
    }
}

impl From<RangeInclusive<u32>> for ProcSet {
    fn from(range: RangeInclusive<u32>) -> Self {
        let (lo, hi) = (*range.start(), *range.end());
        if lo > hi {
            return Self::new();
        }
        Self {
            runs: vec![Interval { lo, hi: hi + 1 }],
        }
    }
}

impl FromStr for ProcSet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut intervals = Vec::new();
        for token in s.split_whitespace() {
            let (lo, hi) = match token.split_once('-') {
                Some((lo, hi)) => {
                    let lo = lo.parse::<u32>().map_err(|_| Error::Malformed {
                        token: token.to_owned(),
                    })?;
                    let hi = hi.parse::<u32>().map_err(|_| Error::Malformed {
                        token: token.to_owned(),
                    })?;
                    (lo, hi)
                }
                None => {
                    let core = token.parse::<u32>().map_err(|_| Error::Malformed {
                        token: token.to_owned(),
                    })?;
                    (core, core)
                }
            };
            if lo > hi {
                return Err(Error::InvalidInterval { lo, hi });
            }
            intervals.push(Interval { lo, hi: hi + 1 });
        }
        Ok(Self::normalized(intervals))
    }
}

impl fmt::Display for ProcSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, run) in self.runs.iter().enumerate() {
            if idx > 0 {
                write!(f, " ")?;
            }
            write!(f, "{run}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(s: &str) -> ProcSet {
        s.parse().expect("test set should parse")
    }

    #[test]
    fn parse_and_display_round_trip() {
        let ps = set("0-3 8-11 16");
        assert_eq!(ps.to_string(), "0-3 8-11 16");
        assert_eq!(ps.len(), 9);
    }

    #[test]
    fn parse_merges_overlapping_and_adjacent_tokens() {
        assert_eq!(set("0-3 4-7").to_string(), "0-7");
        assert_eq!(set("5-9 0-6").to_string(), "0-9");
    }

    #[test]
    fn parse_rejects_reversed_interval() {
        let err = "7-3".parse::<ProcSet>().unwrap_err();
        assert_eq!(err, Error::InvalidInterval { lo: 7, hi: 3 });
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            "1-x".parse::<ProcSet>().unwrap_err(),
            Error::Malformed { .. }
        ));
    }

    #[test]
    fn union_coalesces_runs() {
        let a = set("0-3 10-11");
        let b = set("4-5 11-12 20");
        assert_eq!(a.union(&b).to_string(), "0-5 10-12 20");
    }

    #[test]
    fn difference_splits_runs() {
        let a = set("0-9");
        let b = set("3-5 8");
        assert_eq!(a.difference(&b).to_string(), "0-2 6-7 9");
    }

    #[test]
    fn difference_cut_spanning_multiple_runs() {
        let a = set("0-3 5-8");
        let b = set("2-6");
        assert_eq!(a.difference(&b).to_string(), "0-1 7-8");
    }

    #[test]
    fn intersection_keeps_overlap_only() {
        let a = set("0-5 10-15");
        let b = set("4-11");
        assert_eq!(a.intersection(&b).to_string(), "4-5 10-11");
    }

    #[test]
    fn take_selects_smallest_cores() {
        let a = set("0-1 8-15");
        assert_eq!(a.take(4).to_string(), "0-1 8-9");
        assert_eq!(a.take(100), a);
        assert!(a.take(0).is_empty());
    }

    #[test]
    fn contains_uses_run_bounds() {
        let a = set("0-3 8-11");
        assert!(a.contains(0));
        assert!(a.contains(11));
        assert!(!a.contains(4));
        assert!(!a.contains(12));
    }

    #[test]
    fn release_then_reacquire_is_identity() {
        let free = set("0-15");
        let held = free.take(6);
        let rest = free.difference(&held);
        assert_eq!(rest.union(&held), free);
    }
}
