// ==============================================================================
// models.rs - Row Classification Data Models
// ==============================================================================
// Description: Verdicts and per-row result arrays for summary statistics audit
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================

use serde::{Deserialize, Serialize};

use crate::issues::IssueFlags;

/// Outcome of validating one summary statistics row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// Every checked field is valid
    Good,
    /// p-value absent, unparsable or outside [0, 1]; other fields not examined
    MissingPValue,
    /// p-value present but at least one issue was found
    Invalid,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Good => "Good",
            Verdict::MissingPValue => "MissingPValue",
            Verdict::Invalid => "Invalid",
        }
    }
}

/// Verdict for a single row together with its p-value and issues
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowVerdict {
    /// Parsed p-value; `None` exactly when the verdict is `MissingPValue`
    pub pvalue: Option<f64>,
    pub verdict: Verdict,
    pub issues: IssueFlags,
}

impl RowVerdict {
    pub fn missing_pvalue() -> Self {
        Self {
            pvalue: None,
            verdict: Verdict::MissingPValue,
            issues: IssueFlags::empty(),
        }
    }

    /// `Good` when no issue was raised, `Invalid` otherwise
    pub fn with_issues(pvalue: f64, issues: IssueFlags) -> Self {
        let verdict = if issues.is_empty() {
            Verdict::Good
        } else {
            Verdict::Invalid
        };
        Self {
            pvalue: Some(pvalue),
            verdict,
            issues,
        }
    }
}

/// Per-row results: three parallel arrays indexed by data row ordinal
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedRows {
    pvalues: Vec<Option<f64>>,
    verdicts: Vec<Verdict>,
    issues: Vec<IssueFlags>,
}

impl ClassifiedRows {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(rows: usize) -> Self {
        Self {
            pvalues: Vec::with_capacity(rows),
            verdicts: Vec::with_capacity(rows),
            issues: Vec::with_capacity(rows),
        }
    }

    pub fn push(&mut self, row: RowVerdict) {
        self.pvalues.push(row.pvalue);
        self.verdicts.push(row.verdict);
        self.issues.push(row.issues);
    }

    /// Append rows classified elsewhere, keeping their order
    pub fn extend<I: IntoIterator<Item = RowVerdict>>(&mut self, rows: I) {
        for row in rows {
            self.push(row);
        }
    }

    pub fn len(&self) -> usize {
        self.verdicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty()
    }

    pub fn pvalues(&self) -> &[Option<f64>] {
        &self.pvalues
    }

    pub fn verdicts(&self) -> &[Verdict] {
        &self.verdicts
    }

    pub fn issues(&self) -> &[IssueFlags] {
        &self.issues
    }

    pub fn get(&self, index: usize) -> Option<RowVerdict> {
        Some(RowVerdict {
            pvalue: *self.pvalues.get(index)?,
            verdict: *self.verdicts.get(index)?,
            issues: *self.issues.get(index)?,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = RowVerdict> + '_ {
        self.pvalues
            .iter()
            .zip(&self.verdicts)
            .zip(&self.issues)
            .map(|((pvalue, verdict), issues)| RowVerdict {
                pvalue: *pvalue,
                verdict: *verdict,
                issues: *issues,
            })
    }

    pub fn count(&self, verdict: Verdict) -> usize {
        self.verdicts.iter().filter(|v| **v == verdict).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::Issue;

    #[test]
    fn test_with_issues_sets_verdict() {
        let good = RowVerdict::with_issues(0.5, IssueFlags::empty());
        assert_eq!(good.verdict, Verdict::Good);
        assert_eq!(good.pvalue, Some(0.5));

        let mut flags = IssueFlags::empty();
        flags.insert(Issue::BasePair);
        let invalid = RowVerdict::with_issues(0.5, flags);
        assert_eq!(invalid.verdict, Verdict::Invalid);
    }

    #[test]
    fn test_parallel_arrays_stay_aligned() {
        let mut rows = ClassifiedRows::with_capacity(2);
        rows.push(RowVerdict::missing_pvalue());
        rows.extend([RowVerdict::with_issues(0.01, IssueFlags::empty())]);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows.pvalues().len(), rows.issues().len());
        assert_eq!(rows.get(0).unwrap().verdict, Verdict::MissingPValue);
        assert_eq!(rows.get(1).unwrap().pvalue, Some(0.01));
        assert!(rows.get(2).is_none());
        assert_eq!(rows.count(Verdict::Good), 1);
        assert_eq!(rows.iter().count(), 2);
    }

    #[test]
    fn test_verdict_str() {
        assert_eq!(Verdict::Good.as_str(), "Good");
        assert_eq!(Verdict::MissingPValue.as_str(), "MissingPValue");
        assert_eq!(Verdict::Invalid.as_str(), "Invalid");
    }
}
