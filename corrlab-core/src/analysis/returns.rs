//! Day-over-day percentage returns over the merged rows.
//!
//! Returns are computed row to row after the join, not per source series.
//! When a date is missing from one input, the next merged return spans the
//! gap without adjusting for its length.

use crate::data::AlignedRow;
use crate::domain::MergedRecord;

/// Percent change of each value against the previous one.
///
/// Index 0 is `None`. Index `i` is `(v[i] - v[i-1]) / v[i-1] * 100`, or
/// `None` when the previous value is zero or either operand is non-finite.
pub fn percent_changes(values: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }
    out.push(None);
    out.extend(values.windows(2).map(|w| percent_change(w[0], w[1])));
    out
}

/// Percent change from `prev` to `curr`.
pub fn percent_change(prev: f64, curr: f64) -> Option<f64> {
    if !prev.is_finite() || !curr.is_finite() || prev == 0.0 {
        return None;
    }
    Some((curr - prev) / prev * 100.0)
}

/// Attach both return columns to the aligned rows.
pub fn merge_with_returns(rows: &[AlignedRow]) -> Vec<MergedRecord> {
    let equity: Vec<f64> = rows.iter().map(|r| r.equity).collect();
    let crypto: Vec<f64> = rows.iter().map(|r| r.crypto).collect();
    let equity_pct = percent_changes(&equity);
    let crypto_pct = percent_changes(&crypto);

    rows.iter()
        .zip(equity_pct)
        .zip(crypto_pct)
        .map(|((row, e_pct), c_pct)| MergedRecord {
            date: row.date,
            equity_close: row.equity,
            crypto_close: row.crypto,
            equity_pct_change: e_pct,
            crypto_pct_change: c_pct,
        })
        .collect()
}
