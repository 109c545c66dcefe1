//! End-to-end analysis on the three-day reference scenario.

use chrono::NaiveDate;
use corrlab_core::analysis::{detect_divergences, merge_with_returns, summarize};
use corrlab_core::data::inner_join;
use corrlab_core::domain::{PricePoint, Series};

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
}

fn series(values: &[(u32, f64)]) -> Series {
    Series::from_points(
        values
            .iter()
            .map(|&(day, v)| PricePoint::new(d(day), v))
            .collect(),
    )
}

#[test]
fn three_day_scenario() {
    let equity = series(&[(3, 100.0), (4, 102.0), (5, 99.0)]);
    let crypto = series(&[(3, 50.0), (4, 49.0), (5, 52.0)]);

    let merged = merge_with_returns(&inner_join(&equity, &crypto));
    assert_eq!(merged.len(), 3);
    assert_eq!(merged[0].equity_pct_change, None);
    assert_eq!(merged[0].crypto_pct_change, None);

    let (e2, c2) = merged[1].paired_changes().unwrap();
    assert!((e2 - 2.0).abs() < 1e-9);
    assert!((c2 + 2.0).abs() < 1e-9);

    let (e3, c3) = merged[2].paired_changes().unwrap();
    assert!((e3 - (-2.941_176_470_588_235)).abs() < 1e-9);
    assert!((c3 - 6.122_448_979_591_836).abs() < 1e-9);

    let divergences = detect_divergences(&merged, 2.0);
    let dates: Vec<_> = divergences.iter().map(|r| r.date).collect();
    assert_eq!(dates, vec![d(4), d(5)]);

    let summary = summarize(&merged, 2.0);
    assert_eq!(summary.divergence_count, 2);
    assert_eq!(summary.paired_observations, 2);
    // Two points always lie on a line; both moves are opposite, so r = -1.
    assert!((summary.correlation.unwrap() + 1.0).abs() < 1e-9);
}

#[test]
fn single_overlap_has_undefined_correlation() {
    let equity = series(&[(3, 100.0), (4, 101.0)]);
    let crypto = series(&[(4, 50.0), (5, 51.0)]);

    let merged = merge_with_returns(&inner_join(&equity, &crypto));
    let summary = summarize(&merged, 2.0);

    assert_eq!(merged.len(), 1);
    assert_eq!(summary.correlation, None);
    assert_eq!(summary.divergence_count, 0);
}
