// ==============================================================================
// parsers/summary_stats.rs - Streaming Summary Statistics Classifier
// ==============================================================================
// Description: Single-pass reader that classifies every GWAS summary row
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================
// Format: Delimited text (tab by default), plain or gzip, one header line
// Example:
//   Chr    BP       rsID      OA   EA   EAF    beta    SE     pval
//   7      10500    rs123     A    G    0.3    0.01    0.02   0.04
//   chr1   69869    rs548049  T    C    NA     0.2     0.1    NA
// ==============================================================================

use flate2::read::MultiGzDecoder;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{AuditConfig, ColumnIndexMap};
use crate::models::ClassifiedRows;
use crate::validator::RowValidator;

/// Gzip magic number
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Errors that stop the classification pass
#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("an error occurred on line {line} of the GWAS summary statistics file: {source}")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },
}

/// Open a summary statistics file, transparently decompressing gzip input
pub fn open_input(path: impl AsRef<Path>) -> Result<Box<dyn BufRead + Send>, ClassifyError> {
    let path = path.as_ref();
    let open_error = |source| ClassifyError::Open {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(open_error)?;
    let mut magic = [0u8; 2];
    let is_gzip = match file.read_exact(&mut magic) {
        Ok(()) => magic == GZIP_MAGIC,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => false,
        Err(e) => return Err(open_error(e)),
    };

    // reopen rather than seek so the decoder sees the whole stream
    let file = File::open(path).map_err(open_error)?;
    if is_gzip {
        debug!("Detected gzip input: {:?}", path);
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Number of newline characters in the (decoded) file, as `wc -l` reports
pub fn count_lines(path: impl AsRef<Path>) -> Result<usize, ClassifyError> {
    let mut reader = open_input(path)?;
    let mut lines = 0;

    loop {
        let buffer = reader
            .fill_buf()
            .map_err(|source| ClassifyError::Read { line: lines + 1, source })?;
        if buffer.is_empty() {
            break;
        }
        lines += buffer.iter().filter(|b| **b == b'\n').count();
        let consumed = buffer.len();
        reader.consume(consumed);
    }

    Ok(lines)
}

fn strip_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Classifies every data row of a summary statistics table in one pass
#[derive(Debug, Clone, Copy)]
pub struct SummaryStatsClassifier {
    validator: RowValidator,
    separator: char,
    batch_size: Option<usize>,
}

impl SummaryStatsClassifier {
    pub fn new(columns: &ColumnIndexMap, config: &AuditConfig) -> Self {
        Self {
            validator: RowValidator::from_config(columns, config),
            separator: config.separator,
            batch_size: config.batch_size,
        }
    }

    /// Classify a whole file: count its lines, skip the header, then read
    /// each data row once
    pub fn classify_file(&self, path: impl AsRef<Path>) -> Result<ClassifiedRows, ClassifyError> {
        let path = path.as_ref();

        let line_count = count_lines(path)?;
        info!("Number of lines in the file: {}", line_count);

        let mut reader = open_input(path)?;
        let mut header = String::new();
        let header_bytes = reader
            .read_line(&mut header)
            .map_err(|source| ClassifyError::Read { line: 1, source })?;
        if header_bytes == 0 {
            warn!("Input file is empty: {:?}", path);
        }

        self.classify_rows(reader, line_count.saturating_sub(1))
    }

    /// Classify rows from a reader positioned just after the header line.
    ///
    /// `expected_rows` only sizes the result arrays; reading always stops at
    /// end of input, so a shorter or longer stream is handled.
    pub fn classify_rows<R: BufRead>(
        &self,
        reader: R,
        expected_rows: usize,
    ) -> Result<ClassifiedRows, ClassifyError> {
        let rows = match self.batch_size {
            Some(batch_size) => self.classify_batched(reader, expected_rows, batch_size.max(1))?,
            None => self.classify_sequential(reader, expected_rows)?,
        };

        if rows.len() != expected_rows {
            debug!(
                "Classified {} rows, {} were expected from the line count",
                rows.len(),
                expected_rows
            );
        }
        Ok(rows)
    }

    fn classify_sequential<R: BufRead>(
        &self,
        mut reader: R,
        expected_rows: usize,
    ) -> Result<ClassifiedRows, ClassifyError> {
        let mut rows = ClassifiedRows::with_capacity(expected_rows);
        let mut line = String::new();
        // line 1 is the header
        let mut line_number = 1;

        loop {
            line.clear();
            line_number += 1;
            let bytes = reader
                .read_line(&mut line)
                .map_err(|source| ClassifyError::Read { line: line_number, source })?;
            if bytes == 0 {
                break;
            }
            rows.push(self.validator.classify_line(strip_line_ending(&line), self.separator));
        }

        Ok(rows)
    }

    /// Read `batch_size` lines at a time and validate each batch in parallel;
    /// batches are appended in file order
    fn classify_batched<R: BufRead>(
        &self,
        mut reader: R,
        expected_rows: usize,
        batch_size: usize,
    ) -> Result<ClassifiedRows, ClassifyError> {
        let mut rows = ClassifiedRows::with_capacity(expected_rows);
        let mut batch: Vec<String> = Vec::with_capacity(batch_size);
        let mut line_number = 1;
        let mut exhausted = false;

        while !exhausted {
            batch.clear();
            while batch.len() < batch_size {
                let mut line = String::new();
                line_number += 1;
                let bytes = reader
                    .read_line(&mut line)
                    .map_err(|source| ClassifyError::Read { line: line_number, source })?;
                if bytes == 0 {
                    exhausted = true;
                    break;
                }
                batch.push(line);
            }

            let verdicts: Vec<_> = batch
                .par_iter()
                .map(|line| self.validator.classify_line(strip_line_ending(line), self.separator))
                .collect();
            rows.extend(verdicts);
        }

        Ok(rows)
    }
}
