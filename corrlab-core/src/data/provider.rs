//! Price provider trait and structured error types.
//!
//! The PriceProvider trait abstracts over data sources (Marketstack EOD,
//! CoinGecko market chart, in-memory fixtures) so the pipeline can be run
//! against injected series in tests.

use crate::domain::Series;
use crate::window::DateWindow;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Default per-request timeout for provider HTTP clients.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Structured error types for data operations.
///
/// Every variant means "no series": callers treat any of them as an absent
/// dataset. They are displayable in both CLI output and log lines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("{provider} returned HTTP {status}")]
    HttpStatus { provider: String, status: u16 },

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("{provider} returned no data for '{instrument}'")]
    EmptyData { provider: String, instrument: String },

    #[error("response format changed: {0}")]
    ResponseFormat(String),

    #[error("invalid date in response: '{0}'")]
    InvalidDate(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl DataError {
    /// True for failures reported by the remote side rather than by parsing.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            DataError::HttpStatus { .. } | DataError::NetworkUnreachable(_)
        )
    }
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataSource {
    Marketstack,
    CoinGecko,
    Fixture,
}

/// Result of a successful fetch for one instrument.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub instrument: String,
    pub series: Series,
    pub source: DataSource,
    /// Points in the response before daily aggregation.
    pub raw_points: usize,
}

/// Trait for daily price providers.
///
/// A provider is bound to one instrument at construction; `fetch` only varies
/// the date window.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Instrument this provider fetches (ticker or coin id).
    fn instrument(&self) -> &str;

    /// Fetch one value per calendar day inside the window.
    fn fetch(&self, window: &DateWindow) -> Result<FetchResult, DataError>;
}

/// Build the blocking HTTP client shared by the network providers.
pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::blocking::Client, DataError> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("corrlab/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| DataError::Client(e.to_string()))
}

/// Transport error text without the request URL (it carries the API key).
pub(crate) fn transport_error(err: reqwest::Error) -> DataError {
    DataError::NetworkUnreachable(err.without_url().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_message_names_provider() {
        let err = DataError::HttpStatus {
            provider: "marketstack".into(),
            status: 401,
        };
        assert_eq!(err.to_string(), "marketstack returned HTTP 401");
        assert!(err.is_transport());
    }

    #[test]
    fn empty_data_is_not_transport() {
        let err = DataError::EmptyData {
            provider: "coingecko".into(),
            instrument: "bitcoin".into(),
        };
        assert!(!err.is_transport());
        assert!(err.to_string().contains("bitcoin"));
    }
}
