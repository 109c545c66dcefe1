//! Two-series time alignment.
//!
//! Given the equity and crypto series, keep only the dates both contain.
//! Unmatched dates are dropped; no value is ever forward-filled or invented.

use crate::domain::Series;
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;

/// One date present in both series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlignedRow {
    pub date: NaiveDate,
    pub equity: f64,
    pub crypto: f64,
}

/// Inner-join two series on date.
///
/// Both inputs are sorted with unique dates, so a single merge pass yields
/// rows in ascending date order.
pub fn inner_join(equity: &Series, crypto: &Series) -> Vec<AlignedRow> {
    let a = equity.points();
    let b = crypto.points();
    let mut rows = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        match a[i].date.cmp(&b[j].date) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                rows.push(AlignedRow {
                    date: a[i].date,
                    equity: a[i].value,
                    crypto: b[j].value,
                });
                i += 1;
                j += 1;
            }
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PricePoint;

    fn series(points: &[(&str, f64)]) -> Series {
        Series::from_points(
            points
                .iter()
                .map(|(d, v)| {
                    PricePoint::new(NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap(), *v)
                })
                .collect(),
        )
    }

    #[test]
    fn join_drops_unmatched_dates() {
        // Equity has no weekend rows; crypto trades every day.
        let equity = series(&[
            ("2024-01-05", 100.0),
            ("2024-01-08", 101.0),
            ("2024-01-09", 102.0),
        ]);
        let crypto = series(&[
            ("2024-01-05", 40.0),
            ("2024-01-06", 41.0),
            ("2024-01-07", 42.0),
            ("2024-01-08", 43.0),
        ]);

        let rows = inner_join(&equity, &crypto);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date.to_string(), "2024-01-05");
        assert_eq!((rows[0].equity, rows[0].crypto), (100.0, 40.0));
        assert_eq!(rows[1].date.to_string(), "2024-01-08");
        assert_eq!((rows[1].equity, rows[1].crypto), (101.0, 43.0));
    }

    #[test]
    fn disjoint_series_produce_nothing() {
        let equity = series(&[("2024-01-01", 1.0)]);
        let crypto = series(&[("2024-01-02", 2.0)]);
        assert!(inner_join(&equity, &crypto).is_empty());
    }

    #[test]
    fn empty_side_produces_nothing() {
        let equity = series(&[("2024-01-01", 1.0)]);
        assert!(inner_join(&equity, &Series::default()).is_empty());
        assert!(inner_join(&Series::default(), &equity).is_empty());
    }
}
