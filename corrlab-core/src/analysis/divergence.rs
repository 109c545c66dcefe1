//! Divergence detection: both assets move apart, in opposite directions.

use super::correlation::correlation;
use crate::domain::{AnalysisSummary, DivergenceRecord, MergedRecord};

/// Default minimum spread between the two returns, in percentage points.
pub const DEFAULT_DIVERGENCE_THRESHOLD: f64 = 2.0;

/// Divergences listed in the text report.
pub const SAMPLE_SIZE: usize = 5;

/// Divergence predicate.
///
/// True iff `|a - b| > threshold` and the returns have strictly opposite
/// signs. A zero return on either side never qualifies. Symmetric in `a`, `b`.
pub fn is_divergence(a: f64, b: f64, threshold: f64) -> bool {
    (a - b).abs() > threshold && a * b < 0.0
}

/// All divergence rows, in date order.
pub fn detect_divergences(records: &[MergedRecord], threshold: f64) -> Vec<DivergenceRecord> {
    records
        .iter()
        .filter_map(|r| {
            let (e, c) = r.paired_changes()?;
            is_divergence(e, c, threshold).then_some(DivergenceRecord {
                date: r.date,
                equity_pct_change: e,
                crypto_pct_change: c,
            })
        })
        .collect()
}

/// Correlation, divergence count, and the first few divergences.
pub fn summarize(records: &[MergedRecord], threshold: f64) -> AnalysisSummary {
    let divergences = detect_divergences(records, threshold);
    AnalysisSummary {
        correlation: correlation(records),
        paired_observations: records.iter().filter(|r| r.paired_changes().is_some()).count(),
        divergence_count: divergences.len(),
        sample_divergences: divergences.into_iter().take(SAMPLE_SIZE).collect(),
    }
}
