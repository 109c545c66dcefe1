//! CorrLab Core: domain types, price providers, alignment, and analysis.
//!
//! This crate contains everything up to (but not including) file output:
//! - Domain types (price points, series, merged and divergence records)
//! - The trailing date window both providers share
//! - Marketstack (equity EOD) and CoinGecko (crypto market chart) providers
//! - Daily mean resampling and inner-join alignment
//! - Percent returns, Pearson correlation, and divergence detection

pub mod analysis;
pub mod data;
pub mod domain;
pub mod window;

pub use window::{DateWindow, WindowError};
