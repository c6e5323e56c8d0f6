// ==============================================================================
// aggregator.rs - P-value Stratified Aggregation
// ==============================================================================
// Description: Reduces per-row verdicts into per-bucket and per-issue counts
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================

use rayon::prelude::*;
use serde::Serialize;

use crate::geometry::BucketGeometry;
use crate::issues::{Issue, ISSUE_COUNT};
use crate::models::{ClassifiedRows, RowVerdict, Verdict};

/// Rows per chunk when aggregating in parallel
const PARALLEL_CHUNK_ROWS: usize = 1 << 16;

/// Per-bucket counts of good, invalid and missing-p-value rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateCounts {
    /// Rows with every check passing, per bucket
    pub good: Vec<u64>,
    /// Rows with at least one issue, per bucket
    pub invalid: Vec<u64>,
    /// Rows without a usable p-value; only bucket 0 is ever non-zero
    pub missing: Vec<u64>,
    /// Invalid rows per (bucket, issue)
    pub issues: Vec<[u64; ISSUE_COUNT]>,
    /// Rows whose p-value is above the last tick and landed in no bucket
    pub unassigned: u64,
}

impl AggregateCounts {
    /// All-zero counts for `buckets` buckets
    pub fn zeroed(buckets: usize) -> Self {
        Self {
            good: vec![0; buckets],
            invalid: vec![0; buckets],
            missing: vec![0; buckets],
            issues: vec![[0; ISSUE_COUNT]; buckets],
            unassigned: 0,
        }
    }

    pub fn buckets(&self) -> usize {
        self.good.len()
    }

    /// Add one row to the counts
    pub fn record(&mut self, row: &RowVerdict, geometry: &BucketGeometry) {
        match (row.verdict, row.pvalue) {
            (Verdict::MissingPValue, _) | (_, None) => self.missing[0] += 1,
            (verdict, Some(p)) => match geometry.bucket_for(p) {
                None => self.unassigned += 1,
                Some(bucket) if verdict == Verdict::Good => self.good[bucket] += 1,
                Some(bucket) => {
                    self.invalid[bucket] += 1;
                    for issue in row.issues.iter() {
                        self.issues[bucket][issue.index()] += 1;
                    }
                }
            },
        }
    }

    /// Combine counts from a disjoint set of rows
    pub fn merge(mut self, other: &AggregateCounts) -> Self {
        add_into(&mut self.good, &other.good);
        add_into(&mut self.invalid, &other.invalid);
        add_into(&mut self.missing, &other.missing);
        for (into, from) in self.issues.iter_mut().zip(&other.issues) {
            add_into(into, from);
        }
        self.unassigned += other.unassigned;
        self
    }

    pub fn total_good(&self) -> u64 {
        self.good.iter().sum()
    }

    pub fn total_invalid(&self) -> u64 {
        self.invalid.iter().sum()
    }

    pub fn total_missing(&self) -> u64 {
        self.missing.iter().sum()
    }

    /// Rows counted in any bucket plus unassigned rows
    pub fn total_rows(&self) -> u64 {
        self.total_good() + self.total_invalid() + self.total_missing() + self.unassigned
    }

    /// Invalid rows carrying `issue`, across all buckets
    pub fn issue_total(&self, issue: Issue) -> u64 {
        self.issues.iter().map(|row| row[issue.index()]).sum()
    }
}

fn add_into(into: &mut [u64], from: &[u64]) {
    into.iter_mut().zip(from).for_each(|(a, b)| *a += b);
}

/// Count every classified row into its bucket
pub fn aggregate(rows: &ClassifiedRows, geometry: &BucketGeometry) -> AggregateCounts {
    let mut counts = AggregateCounts::zeroed(geometry.len());
    for row in rows.iter() {
        counts.record(&row, geometry);
    }
    counts
}

/// Same result as [`aggregate`], computed over row chunks in parallel
pub fn aggregate_parallel(rows: &ClassifiedRows, geometry: &BucketGeometry) -> AggregateCounts {
    let pvalues = rows.pvalues().par_chunks(PARALLEL_CHUNK_ROWS);
    let verdicts = rows.verdicts().par_chunks(PARALLEL_CHUNK_ROWS);
    let issues = rows.issues().par_chunks(PARALLEL_CHUNK_ROWS);

    pvalues
        .zip(verdicts)
        .zip(issues)
        .map(|((pvalues, verdicts), issues)| {
            let mut counts = AggregateCounts::zeroed(geometry.len());
            for ((pvalue, verdict), issues) in pvalues.iter().zip(verdicts).zip(issues) {
                let row = RowVerdict {
                    pvalue: *pvalue,
                    verdict: *verdict,
                    issues: *issues,
                };
                counts.record(&row, geometry);
            }
            counts
        })
        .reduce(
            || AggregateCounts::zeroed(geometry.len()),
            |left, right| left.merge(&right),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{TickSet, WidthRule};
    use crate::issues::IssueFlags;
    use proptest::prelude::*;

    fn geometry() -> BucketGeometry {
        BucketGeometry::build(&TickSet::default(), WidthRule::Log10)
    }

    fn invalid(p: f64, issues: &[Issue]) -> RowVerdict {
        RowVerdict::with_issues(p, issues.iter().copied().collect())
    }

    fn sample_rows() -> ClassifiedRows {
        let mut rows = ClassifiedRows::new();
        rows.extend([
            RowVerdict::with_issues(0.04, IssueFlags::empty()),
            RowVerdict::with_issues(1e-9, IssueFlags::empty()),
            invalid(1e-9, &[Issue::RsId, Issue::Chromosome]),
            invalid(0.03, &[Issue::RsId]),
            RowVerdict::missing_pvalue(),
            RowVerdict::missing_pvalue(),
        ]);
        rows
    }

    #[test]
    fn test_aggregate_counts() {
        let counts = aggregate(&sample_rows(), &geometry());

        assert_eq!(counts.buckets(), 7);
        assert_eq!(counts.good, vec![0, 1, 0, 0, 0, 1, 0]);
        assert_eq!(counts.invalid, vec![0, 1, 0, 0, 1, 0, 0]);
        assert_eq!(counts.missing, vec![2, 0, 0, 0, 0, 0, 0]);
        assert_eq!(counts.issues[1][Issue::RsId.index()], 1);
        assert_eq!(counts.issues[1][Issue::Chromosome.index()], 1);
        assert_eq!(counts.issues[4][Issue::RsId.index()], 1);
        assert_eq!(counts.issue_total(Issue::RsId), 2);
        assert_eq!(counts.issue_total(Issue::Format), 0);
        assert_eq!(counts.total_rows(), 6);
        assert_eq!(counts.unassigned, 0);
    }

    #[test]
    fn test_boundary_pvalue_goes_to_lower_bucket() {
        let mut rows = ClassifiedRows::new();
        rows.push(RowVerdict::with_issues(1e-5, IssueFlags::empty()));
        let counts = aggregate(&rows, &geometry());
        assert_eq!(counts.good[2], 1);
        assert_eq!(counts.good[3], 0);
    }

    #[test]
    fn test_pvalue_above_last_tick_is_dropped() {
        let ticks = TickSet::from_values(&[0.0, 0.01, 0.1]).unwrap();
        let geometry = BucketGeometry::build(&ticks, WidthRule::Log10);

        let mut rows = ClassifiedRows::new();
        rows.push(RowVerdict::with_issues(0.5, IssueFlags::empty()));
        rows.push(invalid(0.9, &[Issue::BasePair]));
        rows.push(RowVerdict::with_issues(0.05, IssueFlags::empty()));

        let counts = aggregate(&rows, &geometry);
        assert_eq!(counts.total_good(), 1);
        assert_eq!(counts.total_invalid(), 0);
        assert_eq!(counts.issue_total(Issue::BasePair), 0);
        assert_eq!(counts.unassigned, 2);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut rows = ClassifiedRows::new();
        for i in 0..(PARALLEL_CHUNK_ROWS * 2 + 17) {
            let row = match i % 4 {
                0 => RowVerdict::missing_pvalue(),
                1 => RowVerdict::with_issues((i as f64) / 1e6 % 1.0, IssueFlags::empty()),
                2 => invalid(1e-7, &[Issue::EffectSize]),
                _ => invalid(0.2, &[Issue::Format]),
            };
            rows.push(row);
        }

        let geometry = geometry();
        assert_eq!(aggregate_parallel(&rows, &geometry), aggregate(&rows, &geometry));
    }

    #[test]
    fn test_empty_rows() {
        let counts = aggregate(&ClassifiedRows::new(), &geometry());
        assert_eq!(counts, AggregateCounts::zeroed(7));
        assert_eq!(aggregate_parallel(&ClassifiedRows::new(), &geometry()), counts);
    }

    fn arb_row() -> impl Strategy<Value = RowVerdict> {
        prop_oneof![
            Just(RowVerdict::missing_pvalue()),
            (0.0f64..=1.0, 0u16..(1 << ISSUE_COUNT)).prop_map(|(p, bits)| {
                let flags = Issue::ALL
                    .into_iter()
                    .filter(|issue| bits & (1 << issue.index()) != 0)
                    .collect();
                RowVerdict::with_issues(p, flags)
            }),
        ]
    }

    proptest! {
        #[test]
        fn prop_counts_are_conserved(rows in proptest::collection::vec(arb_row(), 0..200)) {
            let mut classified = ClassifiedRows::new();
            classified.extend(rows.iter().copied());

            let counts = aggregate(&classified, &geometry());
            prop_assert_eq!(counts.unassigned, 0);
            prop_assert_eq!(
                counts.total_good() + counts.total_invalid() + counts.missing[0],
                rows.len() as u64
            );
            prop_assert!(counts.missing[1..].iter().all(|m| *m == 0));
            prop_assert_eq!(counts.good[0] + counts.invalid[0], 0);
        }

        #[test]
        fn prop_order_does_not_matter(mut rows in proptest::collection::vec(arb_row(), 0..100)) {
            let mut forward = ClassifiedRows::new();
            forward.extend(rows.iter().copied());
            rows.reverse();
            let mut backward = ClassifiedRows::new();
            backward.extend(rows.iter().copied());

            prop_assert_eq!(aggregate(&forward, &geometry()), aggregate(&backward, &geometry()));
        }
    }
}
