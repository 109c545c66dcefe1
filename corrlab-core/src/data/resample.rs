//! Daily resampling for intraday price points.

use crate::domain::{PricePoint, Series};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Collapse timestamped prices to one arithmetic mean per calendar day.
///
/// Days without any input point are absent from the output (no
/// interpolation). Non-finite prices are ignored.
pub fn daily_mean<I>(points: I) -> Series
where
    I: IntoIterator<Item = (NaiveDate, f64)>,
{
    let mut buckets: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for (date, price) in points {
        if !price.is_finite() {
            continue;
        }
        let entry = buckets.entry(date).or_insert((0.0, 0));
        entry.0 += price;
        entry.1 += 1;
    }

    let daily = buckets
        .into_iter()
        .map(|(date, (sum, count))| PricePoint::new(date, sum / count as f64))
        .collect();
    Series::from_points(daily)
}
