//! Merged rows, divergence rows, and the analysis summary.

use chrono::NaiveDate;
use serde::Serialize;

/// One date present in both series, with day-over-day returns in percent.
///
/// `*_pct_change` is `None` on the first merged row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MergedRecord {
    pub date: NaiveDate,
    pub equity_close: f64,
    pub crypto_close: f64,
    pub equity_pct_change: Option<f64>,
    pub crypto_pct_change: Option<f64>,
}

impl MergedRecord {
    /// Both percent changes, when both are defined.
    pub fn paired_changes(&self) -> Option<(f64, f64)> {
        match (self.equity_pct_change, self.crypto_pct_change) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        }
    }
}

/// A merged row where the two assets moved apart in opposite directions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DivergenceRecord {
    pub date: NaiveDate,
    pub equity_pct_change: f64,
    pub crypto_pct_change: f64,
}

/// Headline numbers for the text report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    /// Pearson correlation of daily returns; `None` with fewer than two
    /// paired observations or a constant series.
    pub correlation: Option<f64>,
    /// Rows where both returns are defined.
    pub paired_observations: usize,
    pub divergence_count: usize,
    /// First divergences in date order.
    pub sample_divergences: Vec<DivergenceRecord>,
}
