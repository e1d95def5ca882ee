//! Presenting a matching run: per-record log lines, a CSV export, and a summary.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use thiserror::Error;

use crate::catalog::{CatalogRecord, MatchReport};

/// Header row of the CSV export.
pub const CSV_HEADER: [&str; 3] = ["Title", "Author", "Call Number"];

/// Errors raised while writing the report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The output file could not be created
    #[error("cannot create report '{path}': {source}\n  Suggestion: Check that the directory exists and is writable")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A row could not be written
    #[error("failed to write report: {0}")]
    Csv(#[from] csv::Error),
}

/// One line describing where a record can be found.
#[must_use]
pub fn match_line(record: &CatalogRecord) -> String {
    let author = record.author.as_deref().unwrap_or("unknown author");
    match record.call_number.as_deref() {
        Some(call_number) => format!("{} by {author} @ {call_number}", record.title),
        None => format!("{} by {author} (call # unknown)", record.title),
    }
}

/// End-of-run totals.
#[must_use]
pub fn summary_line(report: &MatchReport) -> String {
    let mut line = format!(
        "{} found in catalog: {} with call number, {} without",
        report.records.len(),
        report.resolved_count(),
        report.unresolved_count()
    );
    if !report.failed_batches.is_empty() {
        line.push_str(&format!(
            "; {} of {} searches failed",
            report.failed_batches.len(),
            report.searched_batches
        ));
    }
    line
}

/// Writes one row per record under [`CSV_HEADER`]. Missing values are empty cells.
///
/// # Errors
///
/// Returns [`ReportError::Csv`] when a row cannot be written.
pub fn write_csv<W: Write>(writer: W, records: &[CatalogRecord]) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(CSV_HEADER)?;
    for record in records {
        writer.write_record([
            record.title.as_str(),
            record.author.as_deref().unwrap_or_default(),
            record.call_number.as_deref().unwrap_or_default(),
        ])?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Creates `path` and writes the CSV export into it.
///
/// # Errors
///
/// Returns [`ReportError::Io`] if the file cannot be created.
pub fn write_csv_file(path: &Path, records: &[CatalogRecord]) -> Result<(), ReportError> {
    let file = File::create(path).map_err(|source| ReportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    write_csv(file, records)
}
