//! Reporting and export: CSV dataset and plain-text summary.
//!
//! Provides the two text artifacts of a run:
//! - **CSV**: every merged row with both closes and both daily returns
//! - **Text report**: correlation, divergence count, first divergences
//!
//! Text artifacts go through [`write_with_fallback`]: a plain UTF-8 write,
//! then one retry as BOM-prefixed UTF-8 if the first attempt fails.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use corrlab_core::domain::{AnalysisSummary, MergedRecord};
use serde::Serialize;
use thiserror::Error;

use crate::config::ColumnNames;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Encoding a text artifact was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextEncoding {
    Utf8,
    /// UTF-8 with a leading byte-order mark.
    Utf8Bom,
}

impl TextEncoding {
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            TextEncoding::Utf8 => text.as_bytes().to_vec(),
            TextEncoding::Utf8Bom => {
                let mut bytes = Vec::with_capacity(UTF8_BOM.len() + text.len());
                bytes.extend_from_slice(UTF8_BOM);
                bytes.extend_from_slice(text.as_bytes());
                bytes
            }
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextEncoding::Utf8 => write!(f, "utf-8"),
            TextEncoding::Utf8Bom => write!(f, "utf-8 with BOM"),
        }
    }
}

/// Failure to persist a text artifact after every attempt.
#[derive(Debug, Error)]
#[error("failed to write {path}: {source}")]
pub struct ExportError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Destination for encoded artifacts.
pub trait TextSink {
    fn write_bytes(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;
}

/// Writes straight to the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSink;

impl TextSink for FsSink {
    fn write_bytes(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        std::fs::write(path, bytes)
    }
}

/// Write `text` as UTF-8, retrying once as BOM-prefixed UTF-8.
///
/// Returns the encoding that succeeded. When both attempts fail the error
/// carries the second failure.
pub fn write_with_fallback(
    sink: &dyn TextSink,
    path: &Path,
    text: &str,
) -> Result<TextEncoding, ExportError> {
    let first = match sink.write_bytes(path, &TextEncoding::Utf8.encode(text)) {
        Ok(()) => return Ok(TextEncoding::Utf8),
        Err(e) => e,
    };
    tracing::warn!(
        path = %path.display(),
        error = %first,
        "Write failed, retrying with {}",
        TextEncoding::Utf8Bom
    );

    match sink.write_bytes(path, &TextEncoding::Utf8Bom.encode(text)) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "Saved with {} encoding", TextEncoding::Utf8Bom);
            Ok(TextEncoding::Utf8Bom)
        }
        Err(source) => {
            tracing::error!(path = %path.display(), error = %source, "Second attempt failed");
            Err(ExportError {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the merged dataset as CSV.
///
/// Columns: date, equity close, crypto close, equity pct, crypto pct.
/// Undefined percent changes are empty cells.
pub fn export_merged_csv(records: &[MergedRecord], columns: &ColumnNames) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(columns.header())?;

    for r in records {
        wtr.write_record([
            r.date.to_string(),
            r.equity_close.to_string(),
            r.crypto_close.to_string(),
            optional_cell(r.equity_pct_change),
            optional_cell(r.crypto_pct_change),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn optional_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

// ─── Text report ────────────────────────────────────────────────────

/// Labels used in report prose.
#[derive(Debug, Clone)]
pub struct ReportLabels<'a> {
    pub equity: &'a str,
    pub crypto: &'a str,
}

/// Render the plain-text analysis report.
pub fn render_report(
    summary: &AnalysisSummary,
    labels: &ReportLabels<'_>,
    columns: &ColumnNames,
) -> String {
    let mut out = String::with_capacity(512);

    out.push_str(&format!(
        "Correlation between {} and {} daily returns: {}\n",
        labels.equity,
        labels.crypto,
        format_correlation(summary.correlation)
    ));
    out.push_str(&format!(
        "Number of divergence days: {}\n",
        summary.divergence_count
    ));
    out.push_str(&format!(
        "\nDivergence details (first {} rows):\n",
        corrlab_core::analysis::SAMPLE_SIZE
    ));

    if summary.sample_divergences.is_empty() {
        out.push_str("(none)\n");
        return out;
    }

    let e_col = columns.equity_pct();
    let c_col = columns.crypto_pct();
    let e_width = e_col.len().max(10);
    let c_width = c_col.len().max(10);

    out.push_str(&format!(
        "{:>10}  {:>e_width$}  {:>c_width$}\n",
        "date", e_col, c_col
    ));
    for r in &summary.sample_divergences {
        out.push_str(&format!(
            "{:>10}  {:>e_width$.6}  {:>c_width$.6}\n",
            r.date.to_string(),
            r.equity_pct_change,
            r.crypto_pct_change
        ));
    }
    out
}

/// Two-decimal correlation, or an explanation when it is undefined.
pub fn format_correlation(correlation: Option<f64>) -> String {
    match correlation {
        Some(r) => format!("{r:.2}"),
        None => "undefined (fewer than 2 paired returns)".to_string(),
    }
}
