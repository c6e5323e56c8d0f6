// ==============================================================================
// issues.rs - Issue Taxonomy
// ==============================================================================
// Description: Fixed, ordered list of per-row defects and a compact flag set
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================
// Issue indices are part of the report format: consumers address issues by
// position, so variants must never be reordered.
// ==============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of checkable defects
pub const ISSUE_COUNT: usize = 9;

/// A defect the row validator can detect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Issue {
    /// Row is too short for the column mapping (or a required column is unmapped)
    Format = 0,
    /// rsID does not look like `rs<digits>`
    RsId = 1,
    /// Chromosome outside the accepted categories
    Chromosome = 2,
    /// Base pair position missing or negative
    BasePair = 3,
    /// Effect allele is not a nucleotide code
    EffectAllele = 4,
    /// Other allele is not a nucleotide code
    OtherAllele = 5,
    /// Effect allele frequency outside [0, 1]
    EffectAlleleFrequency = 6,
    /// Standard error is not a number
    StandardError = 7,
    /// Effect size (beta / odds ratio) is not a number
    EffectSize = 8,
}

impl Issue {
    /// All issues in report order
    pub const ALL: [Issue; ISSUE_COUNT] = [
        Issue::Format,
        Issue::RsId,
        Issue::Chromosome,
        Issue::BasePair,
        Issue::EffectAllele,
        Issue::OtherAllele,
        Issue::EffectAlleleFrequency,
        Issue::StandardError,
        Issue::EffectSize,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Issue> {
        Issue::ALL.get(index).copied()
    }

    /// Label used as the key in the issue-count report
    pub fn label(self) -> &'static str {
        match self {
            Issue::Format => "format",
            Issue::RsId => "rsID",
            Issue::Chromosome => "Chr",
            Issue::BasePair => "BP",
            Issue::EffectAllele => "EA",
            Issue::OtherAllele => "OA",
            Issue::EffectAlleleFrequency => "EAF",
            Issue::StandardError => "SE",
            Issue::EffectSize => "beta",
        }
    }

    /// Chart colour used by report renderers
    pub fn color(self) -> &'static str {
        match self {
            Issue::Format => "#ff0000",
            Issue::RsId => "#777ae5",
            Issue::Chromosome => "#cf44a1",
            Issue::BasePair => "#ff4481",
            Issue::EffectAllele => "#ffa121",
            Issue::OtherAllele => "#ff9191",
            Issue::EffectAlleleFrequency => "#fdbc64",
            Issue::StandardError => "#563E3E",
            Issue::EffectSize => "#175a63",
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Set of issues found on one row, one bit per [`Issue`] index
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct IssueFlags(u16);

impl IssueFlags {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, issue: Issue) {
        self.0 |= 1 << issue.index();
    }

    pub fn contains(self, issue: Issue) -> bool {
        self.0 & (1 << issue.index()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Issues present, in taxonomy order
    pub fn iter(self) -> impl Iterator<Item = Issue> {
        Issue::ALL.into_iter().filter(move |issue| self.contains(*issue))
    }

    /// Flags as a fixed boolean vector indexed by issue position
    pub fn to_array(self) -> [bool; ISSUE_COUNT] {
        Issue::ALL.map(|issue| self.contains(issue))
    }
}

impl FromIterator<Issue> for IssueFlags {
    fn from_iter<I: IntoIterator<Item = Issue>>(iter: I) -> Self {
        let mut flags = IssueFlags::empty();
        for issue in iter {
            flags.insert(issue);
        }
        flags
    }
}

impl fmt::Debug for IssueFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(Issue::label)).finish()
    }
}
