//! Serializable pipeline configuration.
//!
//! Every field has a default, so an empty TOML file is a valid config. The
//! defaults reproduce the reference run: QQQ against bitcoin for the year
//! ending 2025-02-24, with a 2.0 percentage-point divergence threshold.

use chrono::NaiveDate;
use corrlab_core::analysis::DEFAULT_DIVERGENCE_THRESHOLD;
use corrlab_core::data::{coingecko, marketstack, CoinGeckoSettings, MarketstackSettings};
use corrlab_core::{DateWindow, WindowError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable consulted for the equity API key.
pub const API_KEY_ENV: &str = "MARKETSTACK_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("invalid window: {0}")]
    Window(#[from] WindowError),
}

/// Complete configuration for one analysis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub window: WindowConfig,
    pub equity: EquityConfig,
    pub crypto: CryptoConfig,
    pub analysis: AnalysisConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Last day of the window (inclusive).
    pub end_date: NaiveDate,
    /// Calendar days before `end_date` where the window starts.
    pub window_days: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            end_date: NaiveDate::from_ymd_opt(2025, 2, 24).unwrap_or_default(),
            window_days: 365,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EquityConfig {
    /// Ticker used as the index proxy.
    pub symbol: String,
    /// Display name for chart legends and the report.
    pub label: String,
    pub base_url: String,
    /// Maximum rows the provider may return.
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for EquityConfig {
    fn default() -> Self {
        Self {
            symbol: "QQQ".into(),
            label: "Nasdaq".into(),
            base_url: marketstack::DEFAULT_BASE_URL.into(),
            limit: marketstack::DEFAULT_LIMIT,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CryptoConfig {
    /// CoinGecko coin id.
    pub coin_id: String,
    pub label: String,
    pub vs_currency: String,
    pub base_url: String,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            coin_id: "bitcoin".into(),
            label: "Bitcoin".into(),
            vs_currency: "usd".into(),
            base_url: coingecko::DEFAULT_BASE_URL.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Minimum spread between the two daily returns, in percentage points.
    pub threshold_pct: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            threshold_pct: DEFAULT_DIVERGENCE_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Artifact directory. `None` means the directory holding the executable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl PipelineConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply the environment key, overriding any key from the file.
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.equity.api_key = Some(key.trim().to_string());
            }
        }
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.equity.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("equity.symbol is empty".into()));
        }
        if self.crypto.coin_id.trim().is_empty() {
            return Err(ConfigError::Invalid("crypto.coin_id is empty".into()));
        }
        if self.equity.limit == 0 {
            return Err(ConfigError::Invalid("equity.limit must be positive".into()));
        }
        if !self.analysis.threshold_pct.is_finite() || self.analysis.threshold_pct <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "analysis.threshold_pct must be a positive number, got {}",
                self.analysis.threshold_pct
            )));
        }
        match self.equity.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {}
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "equity.api_key is not set (use the config file, {API_KEY_ENV}, or --api-key)"
                )))
            }
        }
        self.date_window()?;
        Ok(())
    }

    /// The trailing window described by `[window]`.
    pub fn date_window(&self) -> Result<DateWindow, ConfigError> {
        Ok(DateWindow::trailing(
            self.window.end_date,
            self.window.window_days,
        )?)
    }

    pub fn marketstack_settings(&self) -> MarketstackSettings {
        let mut settings = MarketstackSettings::new(
            self.equity.symbol.clone(),
            self.equity.api_key.clone().unwrap_or_default(),
        );
        settings.base_url = self.equity.base_url.clone();
        settings.limit = self.equity.limit;
        settings
    }

    pub fn coingecko_settings(&self) -> CoinGeckoSettings {
        let mut settings =
            CoinGeckoSettings::new(self.crypto.coin_id.clone(), self.crypto.vs_currency.clone());
        settings.base_url = self.crypto.base_url.clone();
        settings
    }

    /// Column and file naming derived from the two instruments.
    pub fn columns(&self) -> ColumnNames {
        ColumnNames::new(&self.equity.symbol, &self.crypto.coin_id)
    }

    /// Copy safe to print: the API key is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if let Some(key) = copy.equity.api_key.as_mut() {
            *key = mask(key);
        }
        copy
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

/// CSV column names and artifact file names for an instrument pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    pub equity: String,
    pub crypto: String,
}

impl ColumnNames {
    pub fn new(equity_symbol: &str, crypto_id: &str) -> Self {
        Self {
            equity: column_name(equity_symbol),
            crypto: column_name(crypto_id),
        }
    }

    pub fn equity_pct(&self) -> String {
        format!("{}_pct", self.equity)
    }

    pub fn crypto_pct(&self) -> String {
        format!("{}_pct", self.crypto)
    }

    /// Full CSV header, in column order.
    pub fn header(&self) -> [String; 5] {
        [
            "date".to_string(),
            self.equity.clone(),
            self.crypto.clone(),
            self.equity_pct(),
            self.crypto_pct(),
        ]
    }

    pub fn csv_file_name(&self) -> String {
        format!("{}_{}_data.csv", self.equity, self.crypto)
    }
}

fn column_name(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

fn mask(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    format!("{visible}****")
}
