//! Return, correlation, and divergence analysis: pure functions over merged rows.

pub mod correlation;
pub mod divergence;
pub mod returns;

pub use correlation::{correlation, pearson};
pub use divergence::{
    detect_divergences, is_divergence, summarize, DEFAULT_DIVERGENCE_THRESHOLD, SAMPLE_SIZE,
};
pub use returns::{merge_with_returns, percent_change, percent_changes};
