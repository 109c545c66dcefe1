//! CorrLab Runner: config, pipeline orchestration, and artifact export.
//!
//! This crate builds on `corrlab-core` to provide:
//! - Layered TOML/env configuration for one analysis run
//! - The fetch → align → analyze pipeline with concurrent provider calls
//! - CSV and plain-text report export with an encoding fallback
//! - The two-panel comparison chart

pub mod chart;
pub mod config;
pub mod export;
pub mod output;
pub mod pipeline;

pub use chart::{render_comparison_chart, ChartLabels};
pub use config::{ColumnNames, ConfigError, PipelineConfig, API_KEY_ENV};
pub use export::{
    export_merged_csv, render_report, write_with_fallback, ExportError, FsSink, TextEncoding,
    TextSink,
};
pub use output::{install_dir, resolve_output_dir};
pub use pipeline::{
    analyze, persist, run_pipeline, Analysis, ArtifactKind, ArtifactReport, ArtifactStatus,
    PipelineError, PipelineOutcome,
};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_is_send_sync() {
        assert_send::<PipelineConfig>();
        assert_sync::<PipelineConfig>();
    }

    #[test]
    fn analysis_is_send_sync() {
        assert_send::<Analysis>();
        assert_sync::<Analysis>();
    }

    #[test]
    fn pipeline_error_is_send_sync() {
        assert_send::<PipelineError>();
        assert_sync::<PipelineError>();
    }

    #[test]
    fn fs_sink_is_send_sync() {
        assert_send::<FsSink>();
        assert_sync::<FsSink>();
    }
}
