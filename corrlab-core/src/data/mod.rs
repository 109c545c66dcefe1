//! Data acquisition: providers, daily resampling, alignment

pub mod align;
pub mod coingecko;
pub mod fixture;
pub mod marketstack;
pub mod provider;
pub mod resample;

pub use align::{inner_join, AlignedRow};
pub use coingecko::{CoinGeckoProvider, CoinGeckoSettings};
pub use fixture::StaticProvider;
pub use marketstack::{MarketstackProvider, MarketstackSettings};
pub use provider::{DataError, DataSource, FetchResult, PriceProvider};
pub use resample::daily_mean;
