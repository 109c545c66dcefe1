//! Property tests for alignment and analysis invariants.
//!
//! Uses proptest to verify:
//! 1. Merge only emits dates present in both inputs, with their real values
//! 2. Merged dates are strictly increasing
//! 3. Row 0 has no returns; later rows follow the percent-change formula
//! 4. The divergence predicate is symmetric
//! 5. Correlation stays inside [-1, 1]

use chrono::{Days, NaiveDate};
use corrlab_core::analysis::{correlation, is_divergence, merge_with_returns, pearson};
use corrlab_core::data::inner_join;
use corrlab_core::domain::{PricePoint, Series};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 2, 25).unwrap()
}

/// Series over a 60-day window with random gaps and positive prices.
fn arb_series() -> impl Strategy<Value = Series> {
    proptest::collection::btree_map(0u64..60, 1.0..1000.0_f64, 0..40).prop_map(|m| {
        Series::from_points(
            m.into_iter()
                .map(|(offset, v)| PricePoint::new(base_date() + Days::new(offset), v))
                .collect(),
        )
    })
}

fn arb_return() -> impl Strategy<Value = f64> {
    -20.0..20.0_f64
}

// ── Alignment ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn merge_never_fabricates(equity in arb_series(), crypto in arb_series()) {
        let rows = inner_join(&equity, &crypto);
        for row in &rows {
            prop_assert_eq!(equity.get(row.date), Some(row.equity));
            prop_assert_eq!(crypto.get(row.date), Some(row.crypto));
        }
        let expected = equity.dates().filter(|d| crypto.get(*d).is_some()).count();
        prop_assert_eq!(rows.len(), expected);
    }

    #[test]
    fn merged_dates_strictly_increase(equity in arb_series(), crypto in arb_series()) {
        let rows = inner_join(&equity, &crypto);
        for pair in rows.windows(2) {
            prop_assert!(pair[0].date < pair[1].date);
        }
    }
}

// ── Returns ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn returns_follow_formula(equity in arb_series(), crypto in arb_series()) {
        let rows = inner_join(&equity, &crypto);
        let merged = merge_with_returns(&rows);
        prop_assert_eq!(merged.len(), rows.len());

        if let Some(first) = merged.first() {
            prop_assert!(first.equity_pct_change.is_none());
            prop_assert!(first.crypto_pct_change.is_none());
        }
        for i in 1..merged.len() {
            let e = (rows[i].equity - rows[i - 1].equity) / rows[i - 1].equity * 100.0;
            let c = (rows[i].crypto - rows[i - 1].crypto) / rows[i - 1].crypto * 100.0;
            prop_assert!((merged[i].equity_pct_change.unwrap() - e).abs() < 1e-9);
            prop_assert!((merged[i].crypto_pct_change.unwrap() - c).abs() < 1e-9);
        }
    }

    #[test]
    fn correlation_is_bounded(equity in arb_series(), crypto in arb_series()) {
        let merged = merge_with_returns(&inner_join(&equity, &crypto));
        if let Some(r) = correlation(&merged) {
            prop_assert!((-1.0..=1.0).contains(&r));
        }
    }

    #[test]
    fn pearson_is_bounded(pairs in proptest::collection::vec((arb_return(), arb_return()), 2..50)) {
        if let Some(r) = pearson(&pairs) {
            prop_assert!((-1.0..=1.0).contains(&r));
        }
    }
}

// ── Divergence ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn divergence_is_symmetric(a in arb_return(), b in arb_return(), threshold in 0.0..10.0_f64) {
        prop_assert_eq!(is_divergence(a, b, threshold), is_divergence(b, a, threshold));
    }

    #[test]
    fn same_sign_never_diverges(a in 0.0..20.0_f64, b in 0.0..20.0_f64) {
        prop_assert!(!is_divergence(a, b, 0.0));
        prop_assert!(!is_divergence(-a, -b, 0.0));
    }
}
