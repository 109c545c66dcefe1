//! Pearson correlation of daily returns.

use crate::domain::MergedRecord;

/// Pearson correlation coefficient over paired observations.
///
/// Returns `None` with fewer than two pairs, or when either side has zero
/// variance relative to its magnitude. The result is clamped to `[-1, 1]` to absorb rounding.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_a = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    let mut sq_a = 0.0;
    let mut sq_b = 0.0;
    for &(a, b) in pairs {
        let da = a - mean_a;
        let db = b - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
        sq_a += a * a;
        sq_b += b * b;
    }

    if is_flat(var_a, sq_a, n) || is_flat(var_b, sq_b, n) {
        return None;
    }

    let r = cov / (var_a.sqrt() * var_b.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Spread indistinguishable from rounding noise in the mean.
///
/// The tolerance scales with the values, so tiny but varying returns still count.
fn is_flat(var: f64, sum_sq: f64, n: f64) -> bool {
    let tol = n * f64::EPSILON;
    var <= sum_sq * tol * tol
}

/// Correlation of the two return columns over rows where both are defined.
pub fn correlation(records: &[MergedRecord]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = records.iter().filter_map(|r| r.paired_changes()).collect();
    pearson(&pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_positive() {
        let pairs = [(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)];
        assert!((pearson(&pairs).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn perfect_negative() {
        let pairs = [(1.0, -1.0), (2.0, -2.0), (3.0, -3.0)];
        assert!((pearson(&pairs).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn known_value() {
        // x = [1,2,3,4], y = [2,1,4,3]: cov = 3, var_x = var_y = 5
        let pairs = [(1.0, 2.0), (2.0, 1.0), (3.0, 4.0), (4.0, 3.0)];
        assert!((pearson(&pairs).unwrap() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn two_pairs_are_enough() {
        assert!(pearson(&[(1.0, 5.0), (2.0, 3.0)]).is_some());
    }

    #[test]
    fn insufficient_data_is_none() {
        assert_eq!(pearson(&[]), None);
        assert_eq!(pearson(&[(1.0, 1.0)]), None);
    }

    #[test]
    fn constant_series_is_none() {
        assert_eq!(pearson(&[(1.0, 1.0), (1.0, 2.0), (1.0, 3.0)]), None);
        // The mean of 0.1s is not exactly 0.1.
        assert_eq!(pearson(&[(0.1, 1.0), (0.1, 2.0), (0.1, 3.0)]), None);
    }

    #[test]
    fn tiny_varying_returns_are_defined() {
        let pairs = [(1e-9, 2e-9), (2e-9, 4e-9), (3e-9, 6e-9)];
        assert!((pearson(&pairs).unwrap() - 1.0).abs() < 1e-9);
    }
}
