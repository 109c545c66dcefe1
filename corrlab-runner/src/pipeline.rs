//! Pipeline runner: wires providers, alignment, analysis, and export.
//!
//! Two entry points:
//! - `analyze()`: fetch both legs, join, and compute returns and divergences.
//!   No filesystem access.
//! - `run_pipeline()`: `analyze()` followed by `persist()`. Used by the CLI.
//!
//! Both fetches are always attempted before the run aborts on a missing leg,
//! so the user sees every provider failure at once.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use corrlab_core::analysis::{detect_divergences, merge_with_returns, summarize};
use corrlab_core::data::{inner_join, DataError, FetchResult, PriceProvider};
use corrlab_core::domain::{AnalysisSummary, DivergenceRecord, MergedRecord};
use corrlab_core::DateWindow;

use crate::chart::{render_comparison_chart, ChartLabels};
use crate::config::{ConfigError, PipelineConfig};
use crate::export::{
    export_merged_csv, render_report, write_with_fallback, ReportLabels, TextEncoding, TextSink,
};
use crate::output::{CHART_FILE, REPORT_FILE};

/// Errors that stop the pipeline before any artifact is written.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to fetch one or both datasets ({})", describe_missing(.equity, .crypto))]
    MissingSeries {
        equity: Option<DataError>,
        crypto: Option<DataError>,
    },

    #[error("no dates in common between {equity} and {crypto} in {window}")]
    NoOverlap {
        equity: String,
        crypto: String,
        window: DateWindow,
    },
}

impl PipelineError {
    /// True when a provider was unreachable or rejected the request, as opposed
    /// to answering with unusable data.
    pub fn is_transport(&self) -> bool {
        match self {
            PipelineError::MissingSeries { equity, crypto } => [equity, crypto]
                .into_iter()
                .flatten()
                .any(DataError::is_transport),
            _ => false,
        }
    }
}

fn describe_missing(equity: &Option<DataError>, crypto: &Option<DataError>) -> String {
    let parts: Vec<String> = [("equity", equity), ("crypto", crypto)]
        .into_iter()
        .filter_map(|(leg, err)| err.as_ref().map(|e| format!("{leg}: {e}")))
        .collect();
    parts.join("; ")
}

/// Everything computed from the two series.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub window: DateWindow,
    pub equity_raw_points: usize,
    pub crypto_raw_points: usize,
    pub records: Vec<MergedRecord>,
    pub divergences: Vec<DivergenceRecord>,
    pub summary: AnalysisSummary,
}

/// Which artifact an outcome refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArtifactKind {
    Chart,
    Csv,
    Report,
}

/// Result of writing one artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ArtifactStatus {
    Written {
        path: PathBuf,
        encoding: Option<TextEncoding>,
    },
    Failed {
        path: PathBuf,
        error: String,
    },
}

/// Per-artifact outcomes; a failed artifact does not stop the others.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArtifactReport {
    pub outcomes: Vec<(ArtifactKind, ArtifactStatus)>,
}

impl ArtifactReport {
    pub fn all_written(&self) -> bool {
        self.outcomes
            .iter()
            .all(|(_, s)| matches!(s, ArtifactStatus::Written { .. }))
    }

    pub fn status(&self, kind: ArtifactKind) -> Option<&ArtifactStatus> {
        self.outcomes.iter().find(|(k, _)| *k == kind).map(|(_, s)| s)
    }

    fn push(&mut self, kind: ArtifactKind, status: ArtifactStatus) {
        self.outcomes.push((kind, status));
    }
}

/// Analysis plus what was written to disk.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub analysis: Analysis,
    pub output_dir: PathBuf,
    pub artifacts: ArtifactReport,
}

/// Fetch both legs concurrently, then join and analyze.
pub fn analyze(
    config: &PipelineConfig,
    equity: &dyn PriceProvider,
    crypto: &dyn PriceProvider,
) -> Result<Analysis, PipelineError> {
    let window = config.date_window()?;
    tracing::info!(
        %window,
        equity = equity.instrument(),
        crypto = crypto.instrument(),
        "Fetching datasets"
    );

    let (equity_result, crypto_result) =
        rayon::join(|| equity.fetch(&window), || crypto.fetch(&window));

    let (equity_fetch, crypto_fetch) = match (equity_result, crypto_result) {
        (Ok(e), Ok(c)) => (e, c),
        (e, c) => {
            let err = PipelineError::MissingSeries {
                equity: e.err(),
                crypto: c.err(),
            };
            tracing::error!(error = %err, "Error fetching one or both datasets");
            return Err(err);
        }
    };

    analyze_series(config, window, equity_fetch, crypto_fetch)
}

/// Join and analyze two already-fetched series.
pub fn analyze_series(
    config: &PipelineConfig,
    window: DateWindow,
    equity: FetchResult,
    crypto: FetchResult,
) -> Result<Analysis, PipelineError> {
    let rows = inner_join(&equity.series, &crypto.series);
    tracing::info!(
        equity_source = ?equity.source,
        crypto_source = ?crypto.source,
        equity_days = equity.series.len(),
        crypto_days = crypto.series.len(),
        merged = rows.len(),
        "Aligned series"
    );
    if rows.is_empty() {
        return Err(PipelineError::NoOverlap {
            equity: equity.instrument,
            crypto: crypto.instrument,
            window,
        });
    }

    let records = merge_with_returns(&rows);
    let threshold = config.analysis.threshold_pct;
    let divergences = detect_divergences(&records, threshold);
    let summary = summarize(&records, threshold);

    match summary.correlation {
        Some(r) => tracing::info!(correlation = r, "Correlation of daily returns"),
        None => tracing::warn!(
            paired = summary.paired_observations,
            "Correlation undefined"
        ),
    }
    tracing::info!(count = summary.divergence_count, threshold, "Divergence days");

    Ok(Analysis {
        window,
        equity_raw_points: equity.raw_points,
        crypto_raw_points: crypto.raw_points,
        records,
        divergences,
        summary,
    })
}

/// Write chart, CSV, and report into `output_dir`.
///
/// Each artifact is attempted regardless of earlier failures.
pub fn persist(
    config: &PipelineConfig,
    analysis: &Analysis,
    output_dir: &Path,
    sink: &dyn TextSink,
) -> ArtifactReport {
    let mut report = ArtifactReport::default();
    let columns = config.columns();

    // Chart
    let chart_path = output_dir.join(CHART_FILE);
    let chart_labels = ChartLabels {
        equity: &config.equity.label,
        crypto: &config.crypto.label,
        window_days: config.window.window_days,
    };
    let status = match render_comparison_chart(
        &chart_path,
        &analysis.records,
        &analysis.divergences,
        &chart_labels,
    ) {
        Ok(()) => {
            tracing::info!(path = %chart_path.display(), "Saved chart");
            ArtifactStatus::Written {
                path: chart_path,
                encoding: None,
            }
        }
        Err(e) => {
            tracing::error!(path = %chart_path.display(), error = %e, "Error saving chart");
            ArtifactStatus::Failed {
                path: chart_path,
                error: format!("{e:#}"),
            }
        }
    };
    report.push(ArtifactKind::Chart, status);

    // CSV
    let csv_path = output_dir.join(columns.csv_file_name());
    let status = match export_merged_csv(&analysis.records, &columns) {
        Ok(text) => write_text_artifact(sink, csv_path, &text),
        Err(e) => {
            tracing::error!(error = %e, "Error serializing CSV");
            ArtifactStatus::Failed {
                path: csv_path,
                error: format!("{e:#}"),
            }
        }
    };
    report.push(ArtifactKind::Csv, status);

    // Report
    let report_path = output_dir.join(REPORT_FILE);
    let labels = ReportLabels {
        equity: &config.equity.label,
        crypto: &config.crypto.label,
    };
    let text = render_report(&analysis.summary, &labels, &columns);
    report.push(
        ArtifactKind::Report,
        write_text_artifact(sink, report_path, &text),
    );

    report
}

fn write_text_artifact(sink: &dyn TextSink, path: PathBuf, text: &str) -> ArtifactStatus {
    match write_with_fallback(sink, &path, text) {
        Ok(encoding) => {
            tracing::info!(path = %path.display(), %encoding, "Saved file");
            ArtifactStatus::Written {
                path,
                encoding: Some(encoding),
            }
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e.source, "Error saving file");
            ArtifactStatus::Failed {
                path,
                error: e.to_string(),
            }
        }
    }
}

/// Full run: fetch, analyze, write artifacts.
///
/// Returns `Err` only when the analysis cannot be produced; in that case no
/// file is touched.
pub fn run_pipeline(
    config: &PipelineConfig,
    equity: &dyn PriceProvider,
    crypto: &dyn PriceProvider,
    output_dir: &Path,
    sink: &dyn TextSink,
) -> Result<PipelineOutcome, PipelineError> {
    let analysis = analyze(config, equity, crypto)?;
    let artifacts = persist(config, &analysis, output_dir, sink);
    Ok(PipelineOutcome {
        analysis,
        output_dir: output_dir.to_path_buf(),
        artifacts,
    })
}
