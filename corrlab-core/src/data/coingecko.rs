//! CoinGecko market-chart provider for the crypto leg.
//!
//! The `market_chart/range` endpoint returns `[epoch_millis, price]` pairs at
//! a granularity that depends on the range length (hourly for short ranges,
//! daily for a year). Either way the points are resampled to one mean per
//! UTC calendar day.

use super::provider::{
    build_client, transport_error, DataError, DataSource, FetchResult, PriceProvider,
    DEFAULT_TIMEOUT,
};
use super::resample::daily_mean;
use crate::domain::Series;
use crate::window::DateWindow;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

const PROVIDER: &str = "coingecko";

#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    /// `[epoch_millis, price]`; the price is null for gaps in the feed.
    #[serde(default)]
    prices: Vec<(f64, Option<f64>)>,
}

/// Settings for [`CoinGeckoProvider`].
#[derive(Debug, Clone)]
pub struct CoinGeckoSettings {
    pub base_url: String,
    pub coin_id: String,
    pub vs_currency: String,
    pub timeout: Duration,
}

impl CoinGeckoSettings {
    pub fn new(coin_id: impl Into<String>, vs_currency: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            coin_id: coin_id.into(),
            vs_currency: vs_currency.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    fn range_url(&self) -> String {
        format!(
            "{}/coins/{}/market_chart/range",
            self.base_url.trim_end_matches('/'),
            self.coin_id
        )
    }
}

/// CoinGecko market-chart data provider.
pub struct CoinGeckoProvider {
    client: reqwest::blocking::Client,
    settings: CoinGeckoSettings,
}

impl CoinGeckoProvider {
    pub fn new(settings: CoinGeckoSettings) -> Result<Self, DataError> {
        let client = build_client(settings.timeout)?;
        Ok(Self { client, settings })
    }

    fn request(&self, window: &DateWindow) -> Result<String, DataError> {
        let from = window.start_epoch_secs().to_string();
        let to = window.end_epoch_secs().to_string();

        let resp = self
            .client
            .get(self.settings.range_url())
            .query(&[
                ("vs_currency", self.settings.vs_currency.as_str()),
                ("from", from.as_str()),
                ("to", to.as_str()),
            ])
            .send()
            .map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(
                provider = PROVIDER,
                coin = %self.settings.coin_id,
                status = status.as_u16(),
                "Error fetching crypto data"
            );
            return Err(DataError::HttpStatus {
                provider: PROVIDER.into(),
                status: status.as_u16(),
            });
        }

        resp.text().map_err(transport_error)
    }
}

impl PriceProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn instrument(&self) -> &str {
        &self.settings.coin_id
    }

    fn fetch(&self, window: &DateWindow) -> Result<FetchResult, DataError> {
        let body = self.request(window)?;
        let (series, raw_points) = match parse_market_chart(&self.settings.coin_id, &body) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(provider = PROVIDER, coin = %self.settings.coin_id, error = %e, "No crypto data");
                return Err(e);
            }
        };
        tracing::info!(
            provider = PROVIDER,
            coin = %self.settings.coin_id,
            raw_points,
            days = series.len(),
            "Fetched crypto prices"
        );
        Ok(FetchResult {
            instrument: self.settings.coin_id.clone(),
            series,
            source: DataSource::CoinGecko,
            raw_points,
        })
    }
}

/// Parse a market-chart body and resample it to daily means.
///
/// Returns the daily series and the number of raw price points. Points with a
/// null price are skipped.
pub fn parse_market_chart(coin_id: &str, body: &str) -> Result<(Series, usize), DataError> {
    let resp: MarketChartResponse = serde_json::from_str(body).map_err(|e| {
        DataError::ResponseFormat(format!("failed to parse market chart for {coin_id}: {e}"))
    })?;

    if resp.prices.is_empty() {
        return Err(DataError::EmptyData {
            provider: PROVIDER.into(),
            instrument: coin_id.to_string(),
        });
    }

    let raw_points = resp.prices.len();
    let dated = resp
        .prices
        .iter()
        .filter_map(|&(ts, price)| price.map(|p| (ts, p)))
        .map(|(ts, price)| Ok((utc_date_from_millis(ts)?, price)))
        .collect::<Result<Vec<_>, DataError>>()?;

    let series = daily_mean(dated);
    if series.is_empty() {
        return Err(DataError::EmptyData {
            provider: PROVIDER.into(),
            instrument: coin_id.to_string(),
        });
    }
    Ok((series, raw_points))
}

/// UTC calendar date of an epoch-milliseconds timestamp.
pub fn utc_date_from_millis(ts: f64) -> Result<NaiveDate, DataError> {
    if !ts.is_finite() {
        return Err(DataError::InvalidDate(ts.to_string()));
    }
    DateTime::from_timestamp_millis(ts as i64)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| DataError::InvalidDate(ts.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn millis_map_to_utc_date() {
        // 2024-01-01T23:59:59.999Z
        assert_eq!(utc_date_from_millis(1_704_153_599_999.0).unwrap(), d("2024-01-01"));
        // 2024-01-02T00:00:00Z
        assert_eq!(utc_date_from_millis(1_704_153_600_000.0).unwrap(), d("2024-01-02"));
    }

    #[test]
    fn non_finite_timestamp_rejected() {
        assert!(utc_date_from_millis(f64::NAN).is_err());
    }

    #[test]
    fn intraday_points_are_averaged() {
        let body = r#"{"prices": [
            [1704067200000, 42000.0],
            [1704110400000, 43000.0],
            [1704153600000, 44000.0]
        ], "market_caps": [], "total_volumes": []}"#;
        let (series, raw) = parse_market_chart("bitcoin", body).unwrap();
        assert_eq!(raw, 3);
        assert_eq!(series.len(), 2);
        assert_eq!(series.get(d("2024-01-01")), Some(42500.0));
        assert_eq!(series.get(d("2024-01-02")), Some(44000.0));
    }

    #[test]
    fn null_prices_are_skipped() {
        let body = r#"{"prices": [
            [1708819200000, 50000.5],
            [1708840800000, null],
            [1708905600000, null]
        ]}"#;
        let (series, raw) = parse_market_chart("bitcoin", body).unwrap();
        assert_eq!(raw, 3);
        assert_eq!(series.len(), 1);
        assert_eq!(series.get(d("2024-02-25")), Some(50000.5));
    }

    #[test]
    fn all_null_prices_is_empty_error() {
        let body = r#"{"prices": [[1708819200000, null], [1708840800000, null]]}"#;
        let err = parse_market_chart("bitcoin", body).unwrap_err();
        assert!(matches!(err, DataError::EmptyData { .. }));
    }

    #[test]
    fn empty_prices_is_empty_error() {
        let err = parse_market_chart("bitcoin", r#"{"prices": []}"#).unwrap_err();
        assert!(matches!(err, DataError::EmptyData { .. }));
    }

    #[test]
    fn malformed_pair_is_format_error() {
        let err = parse_market_chart("bitcoin", r#"{"prices": [[1704067200000]]}"#).unwrap_err();
        assert!(matches!(err, DataError::ResponseFormat(_)));
    }

    #[test]
    fn range_url_trims_trailing_slash() {
        let mut settings = CoinGeckoSettings::new("bitcoin", "usd");
        settings.base_url = "https://example.test/api/v3/".into();
        assert_eq!(
            settings.range_url(),
            "https://example.test/api/v3/coins/bitcoin/market_chart/range"
        );
    }
}
