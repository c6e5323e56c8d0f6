// ==============================================================================
// output.rs - Audit Report Output
// ==============================================================================
// Description: Writes the audit summary to a report directory as JSON and CSV
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================
// Files written:
//   issues.json   issue label -> count, plus pval and total_entries
//   summary.json  totals, per-bin breakdown, geometry and run metadata
//   bins.csv      one row per p-value bucket
//   audit.jsonl   audit trail of the run
// ==============================================================================

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

use crate::audit::AuditTrail;
use crate::geometry::BucketGeometry;
use crate::issues::Issue;
use crate::summary::{AuditSummary, BinSummary};

/// Files produced in a report directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Issue-count mapping only
    Issues,
    /// Full summary with bins and metadata
    Json,
    /// Per-bin table
    Csv,
    /// Audit trail, one event per line
    AuditLog,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Issues,
        OutputFormat::Json,
        OutputFormat::Csv,
        OutputFormat::AuditLog,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            OutputFormat::Issues => "issues.json",
            OutputFormat::Json => "summary.json",
            OutputFormat::Csv => "bins.csv",
            OutputFormat::AuditLog => "audit.jsonl",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Issues | OutputFormat::Json => "application/json",
            OutputFormat::Csv => "text/csv",
            OutputFormat::AuditLog => "application/x-ndjson",
        }
    }
}

/// Facts about the run stored alongside the summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub run_id: String,
    pub generated_at: String,
    pub input_file: String,
    pub input_sha256: String,
    pub width_rule: String,
    pub ticks: Vec<String>,
    pub allow_multi_nucleotide: bool,
    pub tool_version: String,
}

#[derive(Serialize)]
struct SummaryDocument<'a> {
    metadata: &'a ReportMetadata,
    summary: &'a AuditSummary,
    geometry: &'a BucketGeometry,
    issue_labels: Vec<&'static str>,
    issue_colors: Vec<&'static str>,
}

/// Writes report files into one directory
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Write every report file, creating the directory if needed
    ///
    /// # Returns
    /// * HashMap of format -> file path
    pub async fn write(
        &self,
        summary: &AuditSummary,
        geometry: &BucketGeometry,
        metadata: &ReportMetadata,
        trail: &AuditTrail,
    ) -> Result<HashMap<OutputFormat, PathBuf>> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("Failed to create report directory {:?}", self.output_dir))?;

        let mut result = HashMap::new();
        for format in OutputFormat::ALL {
            let contents = match format {
                OutputFormat::Issues => serde_json::to_vec_pretty(&summary.issue_counts)
                    .context("Failed to serialize issue counts")?,
                OutputFormat::Json => serde_json::to_vec_pretty(&SummaryDocument {
                    metadata,
                    summary,
                    geometry,
                    issue_labels: Issue::ALL.iter().map(|i| i.label()).collect(),
                    issue_colors: Issue::ALL.iter().map(|i| i.color()).collect(),
                })
                .context("Failed to serialize summary")?,
                OutputFormat::Csv => bins_csv(&summary.bins)?,
                OutputFormat::AuditLog => trail
                    .to_json_lines()
                    .context("Failed to serialize audit trail")?
                    .into_bytes(),
            };

            let path = self.output_dir.join(format.file_name());
            tokio::fs::write(&path, contents)
                .await
                .with_context(|| format!("Failed to write {:?}", path))?;
            info!("Wrote {:?}", path);
            result.insert(format, path);
        }

        Ok(result)
    }
}

/// Per-bin table: counts, proportions and one column per issue
pub fn bins_csv(bins: &[BinSummary]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec![
        "bin".to_string(),
        "range".to_string(),
        "lower".to_string(),
        "upper".to_string(),
        "good".to_string(),
        "invalid".to_string(),
        "missing_pval".to_string(),
        "invalid_proportion".to_string(),
        "invalid_percentage".to_string(),
    ];
    header.extend(Issue::ALL.iter().map(|issue| issue.label().to_string()));
    writer.write_record(&header)?;

    let optional = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();
    for bin in bins {
        let mut record = vec![
            bin.index.to_string(),
            bin.range.clone(),
            optional(bin.lower),
            optional(bin.upper),
            bin.good.to_string(),
            bin.invalid.to_string(),
            bin.missing.to_string(),
            bin.invalid_proportion.to_string(),
            bin.invalid_percentage.to_string(),
        ];
        record.extend(bin.issues.iter().map(|count| count.to_string()));
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e))
}
