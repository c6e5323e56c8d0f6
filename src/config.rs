// ==============================================================================
// config.rs - Audit Configuration
// ==============================================================================
// Description: Column index mapping, p-value ticks and audit settings
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Default p-value tick labels (numeric values are parsed from these)
pub const DEFAULT_TICK_LABELS: [&str; 7] = ["0", "1e-8", "1e-5", "1e-3", ".03", ".3", "1"];

/// Semantic column names understood by the validator
pub mod columns {
    pub const CHR: &str = "Chr";
    pub const BP: &str = "BP";
    pub const RSID: &str = "rsID";
    pub const OA: &str = "OA";
    pub const EA: &str = "EA";
    pub const EAF: &str = "EAF";
    pub const BETA: &str = "beta";
    pub const SE: &str = "SE";
    pub const PVAL: &str = "pval";
    pub const N: &str = "N";
    pub const INFO: &str = "INFO";

    /// Column order of the "standard" layout
    pub const STANDARD_ORDER: [&str; 11] = [CHR, BP, RSID, OA, EA, EAF, BETA, SE, PVAL, N, INFO];
}

/// Errors raised before any row is processed
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown ticks width rule: {0} (expected log10 or uniform)")]
    UnknownWidthRule(String),

    #[error("at least one p-value tick is required")]
    EmptyTicks,

    #[error("invalid tick label '{0}': not a number")]
    InvalidTick(String),

    #[error("ticks have to be in strictly ascending order")]
    TicksNotAscending,

    #[error("ticks have to be in range from 0 to 1")]
    TicksOutOfRange,

    #[error("provided GWAS file doesn't exist: {0}")]
    MissingInput(PathBuf),

    #[error("provided column config file doesn't exist: {0}")]
    MissingColumnConfig(PathBuf),

    #[error("failed to read column config {path}: {source}")]
    ColumnConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid column config: {0}")]
    InvalidColumnConfig(#[from] serde_json::Error),

    #[error("column config must be a JSON object of column name to index")]
    ColumnConfigNotObject,

    #[error("batch size must be greater than zero")]
    ZeroBatchSize,
}

/// Mapping from semantic column name to zero-based field position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnIndexMap {
    indices: BTreeMap<String, usize>,
}

impl ColumnIndexMap {
    /// `Chr,BP,rsID,OA,EA,EAF,beta,SE,pval,N,INFO` at positions 0-10
    pub fn standard() -> Self {
        let indices = columns::STANDARD_ORDER
            .iter()
            .enumerate()
            .map(|(position, name)| (name.to_string(), position))
            .collect();
        Self { indices }
    }

    /// Parse a JSON object of column indices.
    ///
    /// Only non-negative integer values are taken as indices; other entries
    /// (such as a genome build string) are ignored.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let object = value.as_object().ok_or(ConfigError::ColumnConfigNotObject)?;

        let indices = object
            .iter()
            .filter_map(|(name, value)| {
                value
                    .as_u64()
                    .and_then(|index| usize::try_from(index).ok())
                    .map(|index| (name.clone(), index))
            })
            .collect();

        Ok(Self { indices })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::MissingColumnConfig(path.to_path_buf()));
        }
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::ColumnConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// `"standard"` selects the standard layout, anything else is a JSON path
    pub fn load(spec: &str) -> Result<Self, ConfigError> {
        if spec == "standard" {
            Ok(Self::standard())
        } else {
            Self::from_json_file(spec)
        }
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.indices.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Look up every column the validator reads
    pub fn resolve(&self) -> ResolvedColumns {
        ResolvedColumns {
            pval: self.get(columns::PVAL),
            rsid: self.get(columns::RSID),
            chr: self.get(columns::CHR),
            bp: self.get(columns::BP),
            ea: self.get(columns::EA),
            oa: self.get(columns::OA),
            eaf: self.get(columns::EAF),
            se: self.get(columns::SE),
            beta: self.get(columns::BETA),
        }
    }
}

/// Number of columns the validator reads
pub const VALIDATED_COLUMNS: usize = 9;

/// Pre-resolved positions of the validated columns; `None` means unmapped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub pval: Option<usize>,
    pub rsid: Option<usize>,
    pub chr: Option<usize>,
    pub bp: Option<usize>,
    pub ea: Option<usize>,
    pub oa: Option<usize>,
    pub eaf: Option<usize>,
    pub se: Option<usize>,
    pub beta: Option<usize>,
}

impl ResolvedColumns {
    /// Positions in the fixed order pval, rsID, Chr, BP, EA, OA, EAF, SE, beta
    pub fn indices(&self) -> [Option<usize>; VALIDATED_COLUMNS] {
        [
            self.pval, self.rsid, self.chr, self.bp, self.ea, self.oa, self.eaf, self.se, self.beta,
        ]
    }

    /// Highest mapped position; fields past it are never read
    pub fn last_index(&self) -> Option<usize> {
        self.indices().into_iter().flatten().max()
    }
}

/// How bucket widths are derived from tick values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidthRule {
    /// Every bucket has unit width
    Uniform,
    /// Widths proportional to the log10 distance between ticks
    #[default]
    Log10,
}

impl WidthRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidthRule::Uniform => "uniform",
            WidthRule::Log10 => "log10",
        }
    }
}

impl FromStr for WidthRule {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "log10" => Ok(WidthRule::Log10),
            "uniform" | "even" => Ok(WidthRule::Uniform),
            _ => Err(ConfigError::UnknownWidthRule(s.to_string())),
        }
    }
}

impl fmt::Display for WidthRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated, strictly ascending p-value tick boundaries in [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickSet {
    labels: Vec<String>,
    values: Vec<f64>,
}

impl TickSet {
    /// Parse tick labels such as `"1e-8"` or `".03"`
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Result<Self, ConfigError> {
        let labels: Vec<String> = labels.iter().map(|l| l.as_ref().trim().to_string()).collect();
        let values = labels
            .iter()
            .map(|label| {
                label
                    .parse::<f64>()
                    .map_err(|_| ConfigError::InvalidTick(label.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::check(&values)?;
        Ok(Self { labels, values })
    }

    /// Build from numeric values; labels are their default formatting
    pub fn from_values(values: &[f64]) -> Result<Self, ConfigError> {
        Self::check(values)?;
        Ok(Self {
            labels: values.iter().map(|v| v.to_string()).collect(),
            values: values.to_vec(),
        })
    }

    fn check(values: &[f64]) -> Result<(), ConfigError> {
        let (first, last) = match (values.first(), values.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Err(ConfigError::EmptyTicks),
        };
        if values.iter().any(|v| v.is_nan()) {
            return Err(ConfigError::TicksOutOfRange);
        }
        if values.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ConfigError::TicksNotAscending);
        }
        if first < 0.0 || last > 1.0 {
            return Err(ConfigError::TicksOutOfRange);
        }
        Ok(())
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for TickSet {
    fn default() -> Self {
        Self {
            labels: DEFAULT_TICK_LABELS.iter().map(|l| l.to_string()).collect(),
            values: vec![0.0, 1e-8, 1e-5, 1e-3, 0.03, 0.3, 1.0],
        }
    }
}

/// Settings for one audit run
#[derive(Debug, Clone, PartialEq)]
pub struct AuditConfig {
    pub ticks: TickSet,
    pub width_rule: WidthRule,
    /// Accept alleles longer than one nucleotide (e.g. `ACGT`)
    pub allow_multi_nucleotide: bool,
    /// Field separator of the input table
    pub separator: char,
    /// When set, rows are classified in parallel batches of this many lines
    pub batch_size: Option<usize>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            ticks: TickSet::default(),
            width_rule: WidthRule::Log10,
            allow_multi_nucleotide: true,
            separator: '\t',
            batch_size: None,
        }
    }
}

impl AuditConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == Some(0) {
            return Err(ConfigError::ZeroBatchSize);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_mapping() {
        let map = ColumnIndexMap::standard();
        assert_eq!(map.len(), 11);
        assert_eq!(map.get("Chr"), Some(0));
        assert_eq!(map.get("pval"), Some(8));
        assert_eq!(map.get("INFO"), Some(10));
        assert_eq!(map.get("missing"), None);

        let resolved = map.resolve();
        assert_eq!(resolved.rsid, Some(2));
        assert_eq!(resolved.beta, Some(6));
        assert_eq!(resolved.se, Some(7));
        assert_eq!(resolved.indices()[0], Some(8));
        assert_eq!(resolved.last_index(), Some(8));

        let partial = ColumnIndexMap::from_json_str(r#"{"rsID": 4, "pval": 1}"#).unwrap();
        assert_eq!(partial.resolve().last_index(), Some(4));
        assert_eq!(ColumnIndexMap::from_json_str("{}").unwrap().resolve().last_index(), None);
    }

    #[test]
    fn test_json_mapping_ignores_non_index_values() {
        let map = ColumnIndexMap::from_json_str(
            r#"{"rsID": 0, "pval": 3, "build": "GRCh37", "BP": -1, "EAF": 1.5}"#,
        )
        .unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("rsID"), Some(0));
        assert_eq!(map.get("pval"), Some(3));
        assert_eq!(map.get("build"), None);
        assert_eq!(map.get("BP"), None);
    }

    #[test]
    fn test_json_mapping_rejects_non_object() {
        assert!(matches!(
            ColumnIndexMap::from_json_str("[1, 2, 3]"),
            Err(ConfigError::ColumnConfigNotObject)
        ));
        assert!(matches!(
            ColumnIndexMap::from_json_str("{not json"),
            Err(ConfigError::InvalidColumnConfig(_))
        ));
    }

    #[test]
    fn test_missing_column_config_file() {
        let err = ColumnIndexMap::load("/nonexistent/columns.json").unwrap_err();
        assert!(matches!(err, ConfigError::MissingColumnConfig(_)));
    }

    #[test]
    fn test_width_rule_parsing() {
        assert_eq!("log10".parse::<WidthRule>().unwrap(), WidthRule::Log10);
        assert_eq!("LOG10".parse::<WidthRule>().unwrap(), WidthRule::Log10);
        assert_eq!("even".parse::<WidthRule>().unwrap(), WidthRule::Uniform);
        assert_eq!("uniform".parse::<WidthRule>().unwrap(), WidthRule::Uniform);
        assert!(matches!(
            "linear".parse::<WidthRule>(),
            Err(ConfigError::UnknownWidthRule(_))
        ));
    }

    #[test]
    fn test_default_ticks_match_labels() {
        let parsed = TickSet::from_labels(&DEFAULT_TICK_LABELS).unwrap();
        assert_eq!(parsed, TickSet::default());
    }

    #[test]
    fn test_tick_validation() {
        assert!(matches!(
            TickSet::from_labels::<&str>(&[]),
            Err(ConfigError::EmptyTicks)
        ));
        assert!(matches!(
            TickSet::from_labels(&["0", "abc"]),
            Err(ConfigError::InvalidTick(_))
        ));
        assert!(matches!(
            TickSet::from_labels(&["0", "0.5", "0.5"]),
            Err(ConfigError::TicksNotAscending)
        ));
        assert!(matches!(
            TickSet::from_labels(&["0.5", "0.1"]),
            Err(ConfigError::TicksNotAscending)
        ));
        assert!(matches!(
            TickSet::from_values(&[-0.1, 0.5]),
            Err(ConfigError::TicksOutOfRange)
        ));
        assert!(matches!(
            TickSet::from_values(&[0.0, 1.5]),
            Err(ConfigError::TicksOutOfRange)
        ));
        assert!(TickSet::from_values(&[0.0, 0.5]).is_ok());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = AuditConfig {
            batch_size: Some(0),
            ..AuditConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroBatchSize)));
        assert!(AuditConfig::default().validate().is_ok());
    }
}
