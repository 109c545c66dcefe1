//! Marketstack end-of-day provider for the equity leg.
//!
//! Fetches daily closes for one symbol from the v1 `eod` endpoint. The
//! provider truncates results at `limit` rows, so the limit must cover the
//! whole window (a year of trading days fits in the default 500).

use super::provider::{
    build_client, transport_error, DataError, DataSource, FetchResult, PriceProvider,
    DEFAULT_TIMEOUT,
};
use crate::domain::{PricePoint, Series};
use crate::window::DateWindow;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://api.marketstack.com/v1/eod";
pub const DEFAULT_LIMIT: u32 = 500;

const PROVIDER: &str = "marketstack";

/// Marketstack EOD response body.
#[derive(Debug, Deserialize)]
struct EodResponse {
    #[serde(default)]
    data: Vec<EodRecord>,
}

#[derive(Debug, Deserialize)]
struct EodRecord {
    date: String,
    close: Option<Price>,
}

/// Closing prices arrive as JSON numbers, or as strings on some plans.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Price {
    Number(f64),
    Text(String),
}

impl Price {
    fn value(&self) -> Result<f64, DataError> {
        match self {
            Price::Number(v) => Ok(*v),
            Price::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| DataError::ResponseFormat(format!("non-numeric close: '{s}'"))),
        }
    }
}

/// Settings for [`MarketstackProvider`].
#[derive(Debug, Clone)]
pub struct MarketstackSettings {
    pub base_url: String,
    pub symbol: String,
    pub api_key: String,
    pub limit: u32,
    pub timeout: Duration,
}

impl MarketstackSettings {
    pub fn new(symbol: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            symbol: symbol.into(),
            api_key: api_key.into(),
            limit: DEFAULT_LIMIT,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Marketstack EOD data provider.
pub struct MarketstackProvider {
    client: reqwest::blocking::Client,
    settings: MarketstackSettings,
}

impl MarketstackProvider {
    pub fn new(settings: MarketstackSettings) -> Result<Self, DataError> {
        let client = build_client(settings.timeout)?;
        Ok(Self { client, settings })
    }

    fn request(&self, window: &DateWindow) -> Result<String, DataError> {
        let date_from = window.start().format("%Y-%m-%d").to_string();
        let date_to = window.end().format("%Y-%m-%d").to_string();
        let limit = self.settings.limit.to_string();

        let resp = self
            .client
            .get(&self.settings.base_url)
            .query(&[
                ("access_key", self.settings.api_key.as_str()),
                ("symbols", self.settings.symbol.as_str()),
                ("date_from", date_from.as_str()),
                ("date_to", date_to.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(
                provider = PROVIDER,
                symbol = %self.settings.symbol,
                status = status.as_u16(),
                "Error fetching equity data"
            );
            return Err(DataError::HttpStatus {
                provider: PROVIDER.into(),
                status: status.as_u16(),
            });
        }

        resp.text().map_err(transport_error)
    }
}

impl PriceProvider for MarketstackProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn instrument(&self) -> &str {
        &self.settings.symbol
    }

    fn fetch(&self, window: &DateWindow) -> Result<FetchResult, DataError> {
        let body = self.request(window)?;
        let (series, raw_points) = match parse_eod_response(&self.settings.symbol, &body) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(provider = PROVIDER, symbol = %self.settings.symbol, error = %e, "No equity data");
                return Err(e);
            }
        };
        tracing::info!(
            provider = PROVIDER,
            symbol = %self.settings.symbol,
            records = raw_points,
            days = series.len(),
            "Fetched equity closes"
        );
        Ok(FetchResult {
            instrument: self.settings.symbol.clone(),
            series,
            source: DataSource::Marketstack,
            raw_points,
        })
    }
}

/// Parse an EOD response body into a daily series.
///
/// Returns the series and the number of records in the body. Records with a
/// null close are skipped.
pub fn parse_eod_response(symbol: &str, body: &str) -> Result<(Series, usize), DataError> {
    let resp: EodResponse = serde_json::from_str(body)
        .map_err(|e| DataError::ResponseFormat(format!("failed to parse EOD response for {symbol}: {e}")))?;

    let raw_points = resp.data.len();
    let mut points = Vec::with_capacity(raw_points);
    for record in &resp.data {
        let Some(close) = &record.close else {
            continue;
        };
        points.push(PricePoint::new(
            parse_provider_date(&record.date)?,
            close.value()?,
        ));
    }

    if points.is_empty() {
        return Err(DataError::EmptyData {
            provider: PROVIDER.into(),
            instrument: symbol.to_string(),
        });
    }

    Ok((Series::from_points(points), raw_points))
}

/// Parse a provider timestamp into a bare calendar date.
///
/// Accepts `2025-02-24T00:00:00+0000`, RFC 3339, naive datetimes, and plain
/// dates. Any UTC offset is dropped and the local wall-clock date is kept.
pub fn parse_provider_date(raw: &str) -> Result<NaiveDate, DataError> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(dt.naive_local().date());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local().date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt.date());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| DataError::InvalidDate(raw.to_string()))
}
