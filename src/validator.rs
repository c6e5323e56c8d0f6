// ==============================================================================
// validator.rs - Summary Statistics Row Validation
// ==============================================================================
// Description: Classifies one GWAS summary statistics row and flags its issues
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================
// Runs once per data row (tens of millions of times per file). Nothing here
// returns an error: every malformed value degrades to an issue flag.
// ==============================================================================

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

use crate::config::{AuditConfig, ColumnIndexMap, ResolvedColumns, VALIDATED_COLUMNS};
use crate::issues::{Issue, IssueFlags};
use crate::models::RowVerdict;

/// Values treated as "no value" (compared case-insensitively)
const NULL_VALUES: [&str; 6] = ["", " ", ".", "-", "na", "nan"];

/// Placeholder allele meaning "no nucleotide"
const NO_NUCLEOTIDE: &str = ".";

/// Accepted chromosome codes
const CHROMOSOMES: [&str; 38] = [
    "1", "01", "2", "02", "3", "03", "4", "04", "5", "05", "6", "06", "7", "07", "8", "08", "9",
    "09", "10", "11", "12", "13", "14", "15", "16", "17", "18", "19", "20", "21", "22", "23", "X",
    "x", "Y", "y", "M", "m",
];

/// `\d` is any Unicode decimal digit (category Nd), not only 0-9
static RSID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^rs\d+$").expect("Invalid rsID regex"));

static DECIMAL_DIGIT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d$").expect("Invalid decimal digit regex"));

/// Validated fields of one row, in [`ResolvedColumns::indices`] order
type RowFields<'a> = [Option<&'a str>; VALIDATED_COLUMNS];

/// Validates rows against a fixed column mapping
#[derive(Debug, Clone, Copy)]
pub struct RowValidator {
    columns: ResolvedColumns,
    last_index: Option<usize>,
    allow_multi_nucleotide: bool,
}

impl RowValidator {
    pub fn new(columns: &ColumnIndexMap, allow_multi_nucleotide: bool) -> Self {
        let columns = columns.resolve();
        Self {
            columns,
            last_index: columns.last_index(),
            allow_multi_nucleotide,
        }
    }

    pub fn from_config(columns: &ColumnIndexMap, config: &AuditConfig) -> Self {
        Self::new(columns, config.allow_multi_nucleotide)
    }

    /// Split a raw line on `separator` and classify it.
    ///
    /// Only the mapped fields are kept and splitting stops after the last
    /// mapped column, so nothing is allocated per row.
    pub fn classify_line(&self, line: &str, separator: char) -> RowVerdict {
        let indices = self.columns.indices();
        let mut fields: RowFields = [None; VALIDATED_COLUMNS];

        for (position, value) in line.split(separator).enumerate() {
            for (slot, index) in fields.iter_mut().zip(&indices) {
                if *index == Some(position) {
                    *slot = Some(value);
                }
            }
            if self.last_index.map_or(true, |last| position >= last) {
                break;
            }
        }

        self.classify_fields(fields)
    }

    /// Classify one row of fields.
    ///
    /// # Order of checks
    /// 1. p-value: absent, null-like, unparsable or outside [0, 1] gives
    ///    `MissingPValue` and nothing else is examined
    /// 2. every other required field must exist, otherwise only the
    ///    `Format` issue is raised
    /// 3. each field is checked independently and raises its own issue
    pub fn classify(&self, fields: &[&str]) -> RowVerdict {
        let row = self
            .columns
            .indices()
            .map(|index| index.and_then(|i| fields.get(i).copied()));
        self.classify_fields(row)
    }

    fn classify_fields(&self, fields: RowFields<'_>) -> RowVerdict {
        let [pval, rsid, chr, bp, ea, oa, eaf, se, beta] = fields;

        let Some(pvalue) = pval.and_then(parse_pvalue) else {
            return RowVerdict::missing_pvalue();
        };

        let (
            Some(rsid),
            Some(chr),
            Some(bp),
            Some(ea),
            Some(oa),
            Some(eaf),
            Some(se),
            Some(beta),
        ) = (rsid, chr, bp, ea, oa, eaf, se, beta)
        else {
            let mut issues = IssueFlags::empty();
            issues.insert(Issue::Format);
            return RowVerdict::with_issues(pvalue, issues);
        };

        let mut issues = IssueFlags::empty();
        let checks = [
            (Issue::RsId, is_valid_rsid(rsid)),
            (Issue::Chromosome, is_valid_chromosome(chr)),
            (Issue::BasePair, is_valid_position(bp)),
            (Issue::EffectAllele, is_valid_allele(ea, self.allow_multi_nucleotide)),
            (Issue::OtherAllele, is_valid_allele(oa, self.allow_multi_nucleotide)),
            (Issue::EffectAlleleFrequency, is_valid_frequency(eaf)),
            (Issue::StandardError, is_valid_number(se)),
            (Issue::EffectSize, is_valid_number(beta)),
        ];
        for (issue, valid) in checks {
            if !valid {
                issues.insert(issue);
            }
        }

        RowVerdict::with_issues(pvalue, issues)
    }
}

/// Case-insensitive membership in the null-like value set
pub fn is_null(value: &str) -> bool {
    NULL_VALUES.iter().any(|null| value.eq_ignore_ascii_case(null))
}

fn is_decimal_digit(c: char) -> bool {
    let mut buffer = [0u8; 4];
    DECIMAL_DIGIT_REGEX.is_match(c.encode_utf8(&mut buffer))
}

/// Value of a Unicode decimal digit. Nd characters are assigned in
/// contiguous runs of ten starting at zero.
fn decimal_digit_value(c: char) -> Option<u32> {
    if c.is_ascii() {
        return c.to_digit(10);
    }
    if !is_decimal_digit(c) {
        return None;
    }
    let mut zero = c as u32;
    while let Some(previous) = zero.checked_sub(1).and_then(char::from_u32) {
        if !is_decimal_digit(previous) {
            break;
        }
        zero -= 1;
    }
    Some((c as u32 - zero) % 10)
}

/// Rewrite `_` digit group separators and non-ASCII decimal digits into a
/// form `f64::from_str` accepts. `None` when a separator is misplaced.
fn normalize_number(value: &str) -> Option<Cow<'_, str>> {
    if value.bytes().all(|b| b.is_ascii() && b != b'_') {
        return Some(Cow::Borrowed(value));
    }

    let chars: Vec<char> = value.chars().collect();
    let mut normalized = String::with_capacity(value.len());
    for (i, c) in chars.iter().enumerate() {
        if *c == '_' {
            let after_digit = i > 0 && decimal_digit_value(chars[i - 1]).is_some();
            let before_digit = chars
                .get(i + 1)
                .is_some_and(|next| decimal_digit_value(*next).is_some());
            if !(after_digit && before_digit) {
                return None;
            }
        } else if let Some(digit) = decimal_digit_value(*c) {
            normalized.push(char::from_digit(digit, 10)?);
        } else {
            normalized.push(*c);
        }
    }
    Some(Cow::Owned(normalized))
}

/// Lenient float parsing: surrounding whitespace, `1_000` style separators
/// and any Unicode decimal digits are accepted
fn parse_float(value: &str) -> Option<f64> {
    normalize_number(value.trim())?.parse::<f64>().ok()
}

/// p-value in [0, 1], or `None` when it should count as missing
pub fn parse_pvalue(value: &str) -> Option<f64> {
    if is_null(value) {
        return None;
    }
    parse_float(value).filter(|p| (0.0..=1.0).contains(p))
}

/// `rs` followed by one or more decimal digits, nothing else
pub fn is_valid_rsid(value: &str) -> bool {
    RSID_REGEX.is_match(value)
}

/// Accepts a chromosome code as is, or after dropping a three character
/// prefix such as `chr`
pub fn is_valid_chromosome(value: &str) -> bool {
    let stripped = value
        .char_indices()
        .nth(3)
        .map_or("", |(offset, _)| &value[offset..]);
    CHROMOSOMES.contains(&value) || CHROMOSOMES.contains(&stripped)
}

/// Non-negative position; scientific notation allowed, fraction truncated
pub fn is_valid_position(value: &str) -> bool {
    parse_float(value).is_some_and(|bp| bp.is_finite() && bp.trunc() >= 0.0)
}

fn is_nucleotide(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), 'a' | 't' | 'c' | 'g')
}

/// Nucleotide code check for effect / other allele
pub fn is_valid_allele(value: &str, allow_multi_nucleotide: bool) -> bool {
    if value.is_empty() {
        return false;
    }
    if value == NO_NUCLEOTIDE {
        return true;
    }
    if allow_multi_nucleotide {
        value.chars().all(is_nucleotide)
    } else {
        let mut chars = value.chars();
        matches!((chars.next(), chars.next()), (Some(c), None) if is_nucleotide(c))
    }
}

/// Frequency in [0, 1]
pub fn is_valid_frequency(value: &str) -> bool {
    parse_float(value).is_some_and(|f| (0.0..=1.0).contains(&f))
}

/// Parses as a number and is not one of the null-like spellings (`nan`)
pub fn is_valid_number(value: &str) -> bool {
    parse_float(value).is_some() && !is_null(value)
}
