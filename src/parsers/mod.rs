// ==============================================================================
// parsers/mod.rs - File parser modules
// ==============================================================================
// Description: Readers for GWAS summary statistics tables
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================

pub mod summary_stats;

pub use summary_stats::{count_lines, open_input, ClassifyError, SummaryStatsClassifier};
