//! In-memory provider for offline runs and tests.

use super::provider::{DataError, DataSource, FetchResult, PriceProvider};
use crate::domain::Series;
use crate::window::DateWindow;

/// Provider that serves a fixed series, or a fixed failure.
#[derive(Debug, Clone)]
pub struct StaticProvider {
    instrument: String,
    outcome: Result<Series, DataError>,
}

impl StaticProvider {
    /// Serve `series`, clipped to the requested window.
    pub fn new(instrument: impl Into<String>, series: Series) -> Self {
        Self {
            instrument: instrument.into(),
            outcome: Ok(series),
        }
    }

    /// Always fail with `error`.
    pub fn failing(instrument: impl Into<String>, error: DataError) -> Self {
        Self {
            instrument: instrument.into(),
            outcome: Err(error),
        }
    }
}

impl PriceProvider for StaticProvider {
    fn name(&self) -> &str {
        "fixture"
    }

    fn instrument(&self) -> &str {
        &self.instrument
    }

    fn fetch(&self, window: &DateWindow) -> Result<FetchResult, DataError> {
        let series = self.outcome.clone()?;
        let clipped = Series::from_points(
            series
                .points()
                .iter()
                .copied()
                .filter(|p| window.contains(p.date))
                .collect(),
        );
        if clipped.is_empty() {
            return Err(DataError::EmptyData {
                provider: self.name().to_string(),
                instrument: self.instrument.clone(),
            });
        }
        Ok(FetchResult {
            instrument: self.instrument.clone(),
            raw_points: clipped.len(),
            series: clipped,
            source: DataSource::Fixture,
        })
    }
}
