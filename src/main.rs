// ==============================================================================
// main.rs - GWAS Summary Statistics Audit Entry Point
// ==============================================================================
// Description: Command line entry point for summary statistics quality audit
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sumstats_audit::config::{AuditConfig, ColumnIndexMap, ConfigError, TickSet, WidthRule, DEFAULT_TICK_LABELS};
use sumstats_audit::processor::SummaryStatsAuditor;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// GWAS summary statistics file (delimited text or gzip, header on the first line)
    gwas_file: PathBuf,

    /// JSON file mapping column names to indices, or "standard"
    columns: String,

    /// Directory for the report files (printed to the console when omitted)
    report_dir: Option<PathBuf>,

    /// Comma separated p-value ticks [default: 0,1e-8,1e-5,1e-3,.03,.3,1]
    #[arg(long, value_delimiter = ',')]
    ticks: Option<Vec<String>>,

    /// Bin width rule: log10 or uniform
    #[arg(long, env = "SUMSTATS_WIDTH_RULE", default_value = "log10")]
    width_rule: String,

    /// Only accept single nucleotide alleles
    #[arg(long)]
    no_multi_nucleotide: bool,

    /// Field separator: "tab", "comma", "space" or a single character
    #[arg(long, default_value = "tab")]
    separator: String,

    /// Classify rows in parallel batches of this many lines
    #[arg(long, env = "SUMSTATS_BATCH_SIZE")]
    batch_size: Option<usize>,

    /// Worker threads for parallel classification (defaults to all cores)
    #[arg(long)]
    threads: Option<usize>,

    /// Do not wait for Enter before exiting in console mode
    #[arg(long)]
    no_pause: bool,
}

fn parse_separator(value: &str) -> Result<char> {
    match value {
        "tab" | "\\t" => Ok('\t'),
        "comma" => Ok(','),
        "space" => Ok(' '),
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => anyhow::bail!("Invalid separator '{}': expected a single character", other),
            }
        }
    }
}

fn build_config(args: &Args) -> Result<AuditConfig> {
    let ticks = match &args.ticks {
        Some(labels) => TickSet::from_labels(labels)?,
        None => TickSet::from_labels(&DEFAULT_TICK_LABELS)?,
    };
    let width_rule: WidthRule = args.width_rule.parse()?;

    let config = AuditConfig {
        ticks,
        width_rule,
        allow_multi_nucleotide: !args.no_multi_nucleotide,
        separator: parse_separator(&args.separator)?,
        batch_size: args.batch_size,
    };
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sumstats_audit=info,audit=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Summary statistics audit starting...");

    // Parse command line arguments
    let args = Args::parse();

    let config = build_config(&args).context("Invalid audit settings")?;

    if !args.gwas_file.is_file() {
        return Err(ConfigError::MissingInput(args.gwas_file.clone()).into());
    }
    let columns = ColumnIndexMap::load(&args.columns)?;
    info!("Loaded {} column indices from '{}'", columns.len(), args.columns);

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure worker threads")?;
    }

    let auditor = SummaryStatsAuditor::new(
        args.gwas_file.clone(),
        columns,
        config,
        args.report_dir.clone(),
    );
    let outcome = auditor.process().await?;

    println!("issues_count = {}", outcome.summary.issue_counts);

    match &args.report_dir {
        Some(dir) => info!("Report written to {:?}", dir),
        None => {
            println!(
                "invalid SNPs: {}/{} ({})",
                outcome.summary.invalid_entries,
                outcome.summary.total_entries,
                outcome.summary.invalid_percentage_label()
            );
            if !args.no_pause && std::io::stdin().is_terminal() {
                println!("Press Enter to exit");
                let mut line = String::new();
                std::io::stdin().read_line(&mut line)?;
            }
        }
    }

    Ok(())
}
