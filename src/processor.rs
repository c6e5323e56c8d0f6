// ==============================================================================
// processor.rs - Summary Statistics Audit Pipeline
// ==============================================================================
// Description: Classifies, aggregates and reports on one GWAS summary file
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================
// Pipeline:
//   1. configuration checks (ticks, input file) - fatal before any row is read
//   2. single streaming pass classifying every data row
//   3. p-value stratified aggregation
//   4. summary reduction
//   5. optional report directory output
// ==============================================================================

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::aggregator::{aggregate, aggregate_parallel, AggregateCounts};
use crate::audit::{AuditEvent, AuditEventType, AuditTrail, LogSeverity};
use crate::config::{AuditConfig, ColumnIndexMap, ConfigError};
use crate::geometry::BucketGeometry;
use crate::models::Verdict;
use crate::output::{OutputFormat, ReportMetadata, ReportWriter};
use crate::parsers::SummaryStatsClassifier;
use crate::summary::{summarize, AuditSummary};

/// Everything produced by one audit run
#[derive(Debug)]
pub struct AuditOutcome {
    pub run_id: uuid::Uuid,
    pub geometry: BucketGeometry,
    pub counts: AggregateCounts,
    pub summary: AuditSummary,
    /// Empty when no report directory was requested
    pub report_files: HashMap<OutputFormat, PathBuf>,
    /// Audit events recorded up to the end of the run
    pub audit_events: Vec<AuditEvent>,
}

/// Audits one summary statistics file
pub struct SummaryStatsAuditor {
    input_path: PathBuf,
    columns: ColumnIndexMap,
    config: AuditConfig,
    report_dir: Option<PathBuf>,
}

impl SummaryStatsAuditor {
    pub fn new(
        input_path: PathBuf,
        columns: ColumnIndexMap,
        config: AuditConfig,
        report_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            input_path,
            columns,
            config,
            report_dir,
        }
    }

    /// Main processing pipeline
    pub async fn process(&self) -> Result<AuditOutcome> {
        let mut trail = AuditTrail::new();
        trail.record(
            AuditEventType::RunStarted,
            Some(self.input_path.display().to_string()),
            serde_json::json!({
                "columns": self.columns.len(),
                "width_rule": self.config.width_rule,
                "ticks": self.config.ticks.labels(),
                "allow_multi_nucleotide": self.config.allow_multi_nucleotide,
                "batch_size": self.config.batch_size,
            }),
        );

        match self.run(&mut trail).await {
            Ok(mut outcome) => {
                outcome.audit_events = trail.events().to_vec();
                Ok(outcome)
            }
            Err(e) => {
                trail.record(
                    AuditEventType::RunFailed,
                    Some(self.input_path.display().to_string()),
                    serde_json::json!({
                        "error": format!("{:#}", e),
                        "success": false,
                    }),
                );
                Err(e)
            }
        }
    }

    async fn run(&self, trail: &mut AuditTrail) -> Result<AuditOutcome> {
        let main_start = Instant::now();

        // 1. Configuration checks
        self.config.validate()?;
        if !self.input_path.is_file() {
            return Err(ConfigError::MissingInput(self.input_path.clone()).into());
        }
        let geometry = BucketGeometry::build(&self.config.ticks, self.config.width_rule);
        debug!("Bucket widths: {:?}", geometry.widths());
        trail.record(
            AuditEventType::InputValidated,
            Some(self.input_path.display().to_string()),
            serde_json::json!({ "buckets": geometry.len() }),
        );

        // 2-3. Classify and aggregate off the async runtime
        let classify_start = Instant::now();
        let classifier = SummaryStatsClassifier::new(&self.columns, &self.config);
        let path = self.input_path.clone();
        let parallel = self.config.batch_size.is_some();
        let blocking_geometry = geometry.clone();

        let (row_count, verdict_counts, counts) = tokio::task::spawn_blocking(move || {
            let rows = classifier.classify_file(&path)?;
            info!(
                "--- classification: {} rows in {:.2?} ---",
                rows.len(),
                classify_start.elapsed()
            );

            let aggregate_start = Instant::now();
            let counts = if parallel {
                aggregate_parallel(&rows, &blocking_geometry)
            } else {
                aggregate(&rows, &blocking_geometry)
            };
            info!("--- aggregation: {:.2?} ---", aggregate_start.elapsed());

            let verdict_counts = [Verdict::Good, Verdict::Invalid, Verdict::MissingPValue]
                .map(|verdict| rows.count(verdict));
            Ok::<_, anyhow::Error>((rows.len(), verdict_counts, counts))
        })
        .await
        .context("Classification task panicked")?
        .with_context(|| format!("Failed to classify {:?}", self.input_path))?;

        trail.record(
            AuditEventType::ClassificationCompleted,
            Some(self.input_path.display().to_string()),
            serde_json::json!({
                "rows": row_count,
                "good": verdict_counts[0],
                "invalid": verdict_counts[1],
                "missing_pval": verdict_counts[2],
            }),
        );

        let aggregation_event = AuditEvent::new(
            trail.run_id(),
            AuditEventType::AggregationCompleted,
            None,
            serde_json::json!({
                "buckets": counts.buckets(),
                "unassigned": counts.unassigned,
            }),
        );
        if counts.unassigned > 0 {
            warn!(
                "{} rows have a p-value above the last tick and were not assigned to any bin",
                counts.unassigned
            );
            trail.push(aggregation_event.with_severity(LogSeverity::Warning));
        } else {
            trail.push(aggregation_event);
        }

        // 4. Summary
        let summary = summarize(&counts, &geometry);
        info!(
            "Invalid SNPs: {}/{} ({})",
            summary.invalid_entries,
            summary.total_entries,
            summary.invalid_percentage_label()
        );
        info!("=== audit: {:.2?} ===", main_start.elapsed());

        // 5. Report directory
        let report_files = match &self.report_dir {
            Some(dir) => {
                trail.record(
                    AuditEventType::RunCompleted,
                    Some(self.input_path.display().to_string()),
                    serde_json::json!({
                        "total_entries": summary.total_entries,
                        "invalid_entries": summary.invalid_entries,
                        "success": true,
                    }),
                );
                let metadata = self.build_metadata(trail).await?;
                let files = ReportWriter::new(dir)
                    .write(&summary, &geometry, &metadata, trail)
                    .await
                    .context("Failed to write audit report")?;
                trail.record(
                    AuditEventType::ReportWritten,
                    Some(dir.display().to_string()),
                    serde_json::json!({ "files": files.len() }),
                );
                files
            }
            None => {
                trail.record(
                    AuditEventType::RunCompleted,
                    Some(self.input_path.display().to_string()),
                    serde_json::json!({
                        "total_entries": summary.total_entries,
                        "invalid_entries": summary.invalid_entries,
                        "success": true,
                    }),
                );
                HashMap::new()
            }
        };

        Ok(AuditOutcome {
            run_id: trail.run_id(),
            geometry,
            counts,
            summary,
            report_files,
            audit_events: Vec::new(),
        })
    }

    async fn build_metadata(&self, trail: &AuditTrail) -> Result<ReportMetadata> {
        let path = self.input_path.clone();
        let input_sha256 = tokio::task::spawn_blocking(move || compute_sha256(&path))
            .await
            .context("Checksum task panicked")??;

        Ok(ReportMetadata {
            run_id: trail.run_id().to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            input_file: self
                .input_path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default(),
            input_sha256,
            width_rule: self.config.width_rule.to_string(),
            ticks: self.config.ticks.labels().to_vec(),
            allow_multi_nucleotide: self.config.allow_multi_nucleotide,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }
}

/// SHA-256 of the raw (possibly compressed) input file
pub fn compute_sha256(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::Issue;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    const CONTENTS: &str = "\
Chr\tBP\trsID\tOA\tEA\tEAF\tbeta\tSE\tpval\tN\tINFO
chr7\t10500\trs123\tA\tG\t0.3\t0.01\t0.02\t0.04\t1000\t0.9
1\t20000\t456\tT\tC\t0.5\t0.01\t0.02\t1e-9\t1000\t0.9
2\t30000\trs789\tT\tC\t0.5\t0.01\t0.02\tNA\t1000\t0.9
";

    fn create_test_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_compute_sha256() {
        let file = create_test_file("abc");
        assert_eq!(
            compute_sha256(file.path()).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_process_without_report_dir() {
        let file = create_test_file(CONTENTS);
        let auditor = SummaryStatsAuditor::new(
            file.path().to_path_buf(),
            ColumnIndexMap::standard(),
            AuditConfig::default(),
            None,
        );

        let outcome = auditor.process().await.unwrap();
        assert!(outcome.report_files.is_empty());
        assert_eq!(outcome.summary.total_entries, 3);
        assert_eq!(outcome.summary.invalid_entries, 2);
        assert_eq!(outcome.summary.issue_counts.issue(Issue::RsId), 1);
        assert_eq!(outcome.summary.issue_counts.missing_pvalue(), 1);
        assert_eq!(outcome.counts.good[5], 1);
        assert_eq!(outcome.counts.invalid[1], 1);
    }

    #[tokio::test]
    async fn test_process_writes_report() {
        let file = create_test_file(CONTENTS);
        let dir = TempDir::new().unwrap();
        let config = AuditConfig {
            batch_size: Some(2),
            ..AuditConfig::default()
        };
        let auditor = SummaryStatsAuditor::new(
            file.path().to_path_buf(),
            ColumnIndexMap::standard(),
            config,
            Some(dir.path().join("report")),
        );

        let outcome = auditor.process().await.unwrap();
        assert_eq!(outcome.report_files.len(), 4);

        let summary: serde_json::Value = serde_json::from_slice(
            &std::fs::read(dir.path().join("report").join("summary.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(summary["metadata"]["run_id"], outcome.run_id.to_string());
        assert_eq!(summary["metadata"]["input_sha256"].as_str().unwrap().len(), 64);

        let audit_log = std::fs::read_to_string(dir.path().join("report").join("audit.jsonl")).unwrap();
        assert!(audit_log.contains("run_started"));
        assert!(audit_log.contains("run_completed"));
    }

    #[tokio::test]
    async fn test_audit_events_in_run_order() {
        let file = create_test_file(CONTENTS);
        let auditor = SummaryStatsAuditor::new(
            file.path().to_path_buf(),
            ColumnIndexMap::standard(),
            AuditConfig::default(),
            None,
        );

        let outcome = auditor.process().await.unwrap();
        let types: Vec<_> = outcome
            .audit_events
            .iter()
            .map(|event| event.event_type.clone())
            .collect();
        assert_eq!(
            types,
            vec![
                AuditEventType::RunStarted,
                AuditEventType::InputValidated,
                AuditEventType::ClassificationCompleted,
                AuditEventType::AggregationCompleted,
                AuditEventType::RunCompleted,
            ]
        );
        assert!(outcome
            .audit_events
            .iter()
            .all(|event| event.severity == LogSeverity::Info && event.run_id == outcome.run_id));
    }

    #[tokio::test]
    async fn test_unassigned_rows_raise_aggregation_severity() {
        let file = create_test_file(CONTENTS);
        let config = AuditConfig {
            ticks: crate::config::TickSet::from_labels(&["0", "0.01"]).unwrap(),
            ..AuditConfig::default()
        };
        let auditor = SummaryStatsAuditor::new(
            file.path().to_path_buf(),
            ColumnIndexMap::standard(),
            config,
            None,
        );

        let outcome = auditor.process().await.unwrap();
        // 0.04 lies above the last tick
        assert_eq!(outcome.counts.unassigned, 1);

        let aggregation = outcome
            .audit_events
            .iter()
            .find(|event| event.event_type == AuditEventType::AggregationCompleted)
            .unwrap();
        assert_eq!(aggregation.severity, LogSeverity::Warning);
        assert_eq!(aggregation.details["unassigned"], 1);
    }

    #[tokio::test]
    async fn test_missing_input_is_config_error() {
        let auditor = SummaryStatsAuditor::new(
            PathBuf::from("/nonexistent/gwas.tsv"),
            ColumnIndexMap::standard(),
            AuditConfig::default(),
            None,
        );

        let err = auditor.process().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::MissingInput(_))
        ));
    }
}
