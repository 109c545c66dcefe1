//! Two-panel comparison chart rendered with plotters (SVG backend).
//!
//! Top: both closes normalized to 1.0 on the first merged date.
//! Bottom: both daily returns, with divergence days marked on top of the lines.

use std::path::Path;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use corrlab_core::domain::{DivergenceRecord, MergedRecord};
use plotters::prelude::*;

pub const CHART_SIZE: (u32, u32) = (1400, 1000);

const EQUITY_LINE: RGBColor = RGBColor(128, 0, 128);
const CRYPTO_LINE: RGBColor = RGBColor(0, 128, 128);
const EQUITY_RETURN: RGBColor = RGBColor(0, 128, 0);
const CRYPTO_RETURN: RGBColor = RGBColor(255, 165, 0);
const EQUITY_MARK: RGBColor = RED;
const CRYPTO_MARK: RGBColor = BLUE;

/// Series names shown in legends.
#[derive(Debug, Clone)]
pub struct ChartLabels<'a> {
    pub equity: &'a str,
    pub crypto: &'a str,
    /// Window length, used in the top panel title.
    pub window_days: u32,
}

fn period_phrase(window_days: u32) -> String {
    match window_days {
        365 | 366 => "Last 12 Months".to_string(),
        n => format!("Last {n} Days"),
    }
}

/// Normalize a column by its first value, so the series starts at 1.0.
///
/// Returns `None` when the column is empty or starts at zero.
pub fn normalize(values: &[f64]) -> Option<Vec<f64>> {
    let first = *values.first()?;
    if first == 0.0 || !first.is_finite() {
        return None;
    }
    Some(values.iter().map(|v| v / first).collect())
}

/// Render the comparison chart to an SVG file.
pub fn render_comparison_chart(
    path: &Path,
    records: &[MergedRecord],
    divergences: &[DivergenceRecord],
    labels: &ChartLabels<'_>,
) -> Result<()> {
    let (first, last) = match (records.first(), records.last()) {
        (Some(f), Some(l)) => (f.date, l.date),
        _ => return Err(anyhow!("no merged rows to plot")),
    };
    // A one-day range would collapse the x axis.
    let x_range = first..last.max(first.succ_opt().unwrap_or(first));

    let equity_norm = normalize(&records.iter().map(|r| r.equity_close).collect::<Vec<_>>())
        .ok_or_else(|| anyhow!("cannot normalize {} closes", labels.equity))?;
    let crypto_norm = normalize(&records.iter().map(|r| r.crypto_close).collect::<Vec<_>>())
        .ok_or_else(|| anyhow!("cannot normalize {} closes", labels.crypto))?;

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((2, 1));

    // ── Panel 1: normalized prices ──
    let (lo, hi) = bounds(equity_norm.iter().chain(crypto_norm.iter()).copied());
    let mut top = ChartBuilder::on(&panels[0])
        .caption(
            format!(
                "Normalized Price Comparison over {}",
                period_phrase(labels.window_days)
            ),
            ("sans-serif", 24.0).into_font(),
        )
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range.clone(), lo..hi)?;
    top.configure_mesh()
        .x_desc("Date")
        .y_desc("Normalized Price")
        .x_label_formatter(&|d: &NaiveDate| d.format("%Y-%m").to_string())
        .draw()?;

    top.draw_series(LineSeries::new(
        records.iter().zip(&equity_norm).map(|(r, v)| (r.date, *v)),
        &EQUITY_LINE,
    ))?
    .label(labels.equity)
    .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], EQUITY_LINE));
    top.draw_series(LineSeries::new(
        records.iter().zip(&crypto_norm).map(|(r, v)| (r.date, *v)),
        &CRYPTO_LINE,
    ))?
    .label(labels.crypto)
    .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], CRYPTO_LINE));
    top.configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    // ── Panel 2: daily returns with divergences ──
    let equity_pct: Vec<(NaiveDate, f64)> = records
        .iter()
        .filter_map(|r| r.equity_pct_change.map(|v| (r.date, v)))
        .collect();
    let crypto_pct: Vec<(NaiveDate, f64)> = records
        .iter()
        .filter_map(|r| r.crypto_pct_change.map(|v| (r.date, v)))
        .collect();
    let (lo, hi) = bounds(equity_pct.iter().chain(crypto_pct.iter()).map(|p| p.1));

    let mut bottom = ChartBuilder::on(&panels[1])
        .caption(
            "Daily Percentage Changes with Divergences",
            ("sans-serif", 24.0).into_font(),
        )
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, lo..hi)?;
    bottom
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Daily Return (%)")
        .x_label_formatter(&|d: &NaiveDate| d.format("%Y-%m").to_string())
        .draw()?;

    let equity_return_label = format!("{} % Change", labels.equity);
    let crypto_return_label = format!("{} % Change", labels.crypto);
    bottom
        .draw_series(LineSeries::new(equity_pct, &EQUITY_RETURN))?
        .label(equity_return_label.as_str())
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], EQUITY_RETURN));
    bottom
        .draw_series(LineSeries::new(crypto_pct, &CRYPTO_RETURN))?
        .label(crypto_return_label.as_str())
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], CRYPTO_RETURN));

    // Markers after the lines so they sit on top.
    let equity_mark_label = format!("{} divergence", labels.equity);
    let crypto_mark_label = format!("{} divergence", labels.crypto);
    bottom
        .draw_series(
            divergences
                .iter()
                .map(|d| Circle::new((d.date, d.equity_pct_change), 4, EQUITY_MARK.filled())),
        )?
        .label(equity_mark_label.as_str())
        .legend(|(x, y)| Circle::new((x + 10, y), 4, EQUITY_MARK.filled()));
    bottom
        .draw_series(
            divergences
                .iter()
                .map(|d| Circle::new((d.date, d.crypto_pct_change), 4, CRYPTO_MARK.filled())),
        )?
        .label(crypto_mark_label.as_str())
        .legend(|(x, y)| Circle::new((x + 10, y), 4, CRYPTO_MARK.filled()));
    bottom
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Padded min/max of the values; `-1..1` when there are none.
fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() || !hi.is_finite() {
        return (-1.0, 1.0);
    }
    let pad = ((hi - lo) * 0.05).max(0.01);
    (lo - pad, hi + pad)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_starts_at_one() {
        let norm = normalize(&[50.0, 49.0, 52.0]).unwrap();
        assert_eq!(norm[0], 1.0);
        assert!((norm[1] - 0.98).abs() < 1e-12);
        assert!((norm[2] - 1.04).abs() < 1e-12);
    }

    #[test]
    fn normalize_rejects_empty_and_zero_start() {
        assert_eq!(normalize(&[]), None);
        assert_eq!(normalize(&[0.0, 1.0]), None);
    }

    #[test]
    fn period_phrase_names_a_year() {
        assert_eq!(period_phrase(365), "Last 12 Months");
        assert_eq!(period_phrase(90), "Last 90 Days");
    }

    proptest::proptest! {
        #[test]
        fn normalize_preserves_ratios(values in proptest::collection::vec(1.0f64..1e6, 1..50)) {
            let norm = normalize(&values).unwrap();
            proptest::prop_assert_eq!(norm[0], 1.0);
            for (n, v) in norm.iter().zip(&values) {
                proptest::prop_assert!((n * values[0] - v).abs() <= 1e-9 * v.abs());
            }
        }

        #[test]
        fn bounds_contain_every_value(values in proptest::collection::vec(-1e3f64..1e3, 1..50)) {
            let (lo, hi) = bounds(values.iter().copied());
            proptest::prop_assert!(values.iter().all(|v| *v > lo && *v < hi));
        }
    }

    #[test]
    fn bounds_pad_range() {
        let (lo, hi) = bounds([1.0, 3.0].into_iter());
        assert!(lo < 1.0 && hi > 3.0);
        assert_eq!(bounds(std::iter::empty()), (-1.0, 1.0));
        let (lo, hi) = bounds([2.0].into_iter());
        assert!(lo < 2.0 && hi > 2.0);
    }
}
