// ==============================================================================
// summary.rs - Audit Report Summary
// ==============================================================================
// Description: Reduces aggregate counts to report totals and per-bin rows
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

use crate::aggregator::AggregateCounts;
use crate::geometry::BucketGeometry;
use crate::issues::{Issue, ISSUE_COUNT};

/// Report key holding the number of rows without a usable p-value
pub const PVAL_KEY: &str = "pval";

/// Report key holding the number of data rows
pub const TOTAL_ENTRIES_KEY: &str = "total_entries";

/// Issue label to count, plus the `pval` and `total_entries` entries.
///
/// Serializes as a JSON object whose keys follow the issue taxonomy order,
/// then `pval`, then `total_entries`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssueCounts {
    by_issue: [u64; ISSUE_COUNT],
    missing_pvalue: u64,
    total_entries: u64,
}

impl IssueCounts {
    pub fn from_counts(counts: &AggregateCounts) -> Self {
        Self {
            by_issue: Issue::ALL.map(|issue| counts.issue_total(issue)),
            missing_pvalue: counts.total_missing(),
            total_entries: counts.total_rows(),
        }
    }

    pub fn issue(&self, issue: Issue) -> u64 {
        self.by_issue[issue.index()]
    }

    pub fn missing_pvalue(&self) -> u64 {
        self.missing_pvalue
    }

    pub fn total_entries(&self) -> u64 {
        self.total_entries
    }

    /// Count by report key
    pub fn get(&self, key: &str) -> Option<u64> {
        self.entries()
            .into_iter()
            .find(|(label, _)| *label == key)
            .map(|(_, count)| count)
    }

    /// Report entries in output order
    pub fn entries(&self) -> Vec<(&'static str, u64)> {
        Issue::ALL
            .iter()
            .map(|issue| (issue.label(), self.issue(*issue)))
            .chain([
                (PVAL_KEY, self.missing_pvalue),
                (TOTAL_ENTRIES_KEY, self.total_entries),
            ])
            .collect()
    }
}

impl Serialize for IssueCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries = self.entries();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, count) in entries {
            map.serialize_entry(key, &count)?;
        }
        map.end()
    }
}

impl fmt::Display for IssueCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = self
            .entries()
            .iter()
            .map(|(key, count)| format!("'{}': {}", key, count))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{{{}}}", body)
    }
}

/// One p-value bucket, ready for a table or chart
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct BinSummary {
    pub index: usize,
    /// e.g. `1e-8—1e-5`, or `no p-value` for bucket 0
    pub range: String,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub position: f64,
    pub width: f64,
    pub midpoint: f64,
    pub good: u64,
    pub invalid: u64,
    pub missing: u64,
    /// invalid / (good + invalid); 0 for an empty bucket and for bucket 0
    pub invalid_proportion: f64,
    /// `invalid_proportion` as a whole percentage, rounded half to even
    pub invalid_percentage: u64,
    pub issues: [u64; ISSUE_COUNT],
}

/// Totals handed to report writers
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AuditSummary {
    pub total_entries: u64,
    /// Invalid rows plus rows missing a p-value
    pub invalid_entries: u64,
    pub invalid_proportion: f64,
    pub invalid_percentage: f64,
    /// Rows with a p-value beyond the last tick
    pub unassigned_entries: u64,
    pub issue_counts: IssueCounts,
    pub bins: Vec<BinSummary>,
}

impl AuditSummary {
    /// Overall invalid share formatted with one decimal, e.g. `12.5%`
    pub fn invalid_percentage_label(&self) -> String {
        format!("{:.1}%", self.invalid_percentage)
    }
}

fn proportion(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Per-bucket rows for every bucket of `geometry`
pub fn bin_summaries(counts: &AggregateCounts, geometry: &BucketGeometry) -> Vec<BinSummary> {
    let ticks = geometry.ticks();
    let midpoints = geometry.midpoints();

    (0..geometry.len())
        .map(|index| {
            let good = counts.good[index];
            let invalid = counts.invalid[index];
            let invalid_proportion = if index == 0 {
                0.0
            } else {
                proportion(invalid, good + invalid)
            };

            BinSummary {
                index,
                range: geometry.range_label(index),
                lower: index.checked_sub(1).map(|i| ticks[i]),
                upper: (index > 0).then(|| ticks[index]),
                position: geometry.positions()[index],
                width: geometry.widths()[index],
                midpoint: midpoints[index],
                good,
                invalid,
                missing: counts.missing[index],
                invalid_proportion,
                invalid_percentage: (invalid_proportion * 100.0).round_ties_even() as u64,
                issues: counts.issues[index],
            }
        })
        .collect()
}

/// Reduce aggregate counts into report totals
pub fn summarize(counts: &AggregateCounts, geometry: &BucketGeometry) -> AuditSummary {
    let total_entries = counts.total_rows();
    let invalid_entries = counts.total_invalid() + counts.total_missing();
    let invalid_proportion = proportion(invalid_entries, total_entries);

    AuditSummary {
        total_entries,
        invalid_entries,
        invalid_proportion,
        invalid_percentage: invalid_proportion * 100.0,
        unassigned_entries: counts.unassigned,
        issue_counts: IssueCounts::from_counts(counts),
        bins: bin_summaries(counts, geometry),
    }
}
