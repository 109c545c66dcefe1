//! Domain types for CorrLab

pub mod record;
pub mod series;

pub use record::{AnalysisSummary, DivergenceRecord, MergedRecord};
pub use series::{PricePoint, Series};
