//! CorrLab CLI: run the equity/crypto co-movement analysis.
//!
//! Commands:
//! - `run`: fetch both series, analyze, and write chart, CSV, and report
//! - `config`: print the effective configuration with the API key masked

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use corrlab_core::data::{CoinGeckoProvider, MarketstackProvider};
use corrlab_runner::export::format_correlation;
use corrlab_runner::{
    resolve_output_dir, run_pipeline, ArtifactKind, ArtifactStatus, FsSink, PipelineConfig,
    PipelineOutcome,
};

#[derive(Parser)]
#[command(
    name = "corrlab",
    about = "CorrLab CLI: equity index vs. crypto daily-return correlation"
)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. info, debug, corrlab_core=trace).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, analyze, and write artifacts.
    Run(RunArgs),
    /// Print the effective configuration as TOML.
    Config {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Last day of the window (YYYY-MM-DD).
    #[arg(long)]
    end_date: Option<String>,

    /// Window length in calendar days.
    #[arg(long)]
    window_days: Option<u32>,

    /// Equity ticker (e.g. QQQ).
    #[arg(long)]
    symbol: Option<String>,

    /// CoinGecko coin id (e.g. bitcoin).
    #[arg(long)]
    coin: Option<String>,

    /// Divergence threshold in percentage points.
    #[arg(long)]
    threshold: Option<f64>,

    /// Marketstack access key. Overrides MARKETSTACK_API_KEY.
    #[arg(long)]
    api_key: Option<String>,

    /// Artifact directory. Defaults to the executable's directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    // .env may set RUST_LOG, so it is loaded before the subscriber.
    dotenvy::dotenv().ok();
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Run(args) => run_cmd(args),
        Commands::Config { config } => config_cmd(config),
    }
}

fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// `RUST_LOG` if set, else `level`, else `info`.
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Defaults, then the TOML file, then the environment.
fn load_config(path: Option<&PathBuf>) -> Result<PipelineConfig> {
    let mut config = match path {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    config.apply_env();
    Ok(config)
}

fn apply_overrides(config: &mut PipelineConfig, args: &RunArgs) -> Result<()> {
    if let Some(end) = args.end_date.as_deref() {
        config.window.end_date = NaiveDate::parse_from_str(end, "%Y-%m-%d")
            .with_context(|| format!("invalid --end-date '{end}', expected YYYY-MM-DD"))?;
    }
    if let Some(days) = args.window_days {
        config.window.window_days = days;
    }
    if let Some(symbol) = &args.symbol {
        config.equity.symbol = symbol.clone();
    }
    if let Some(coin) = &args.coin {
        config.crypto.coin_id = coin.clone();
    }
    if let Some(threshold) = args.threshold {
        config.analysis.threshold_pct = threshold;
    }
    if let Some(key) = &args.api_key {
        config.equity.api_key = Some(key.clone());
    }
    if let Some(dir) = &args.output_dir {
        config.output.dir = Some(dir.clone());
    }
    Ok(())
}

fn run_cmd(args: RunArgs) -> Result<()> {
    let mut config = load_config(args.config.as_ref())?;
    apply_overrides(&mut config, &args)?;
    if let Err(e) = config.validate() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let equity = MarketstackProvider::new(config.marketstack_settings())?;
    let crypto = CoinGeckoProvider::new(config.coingecko_settings())?;
    let output_dir = resolve_output_dir(config.output.dir.as_deref())?;
    tracing::debug!(
        cwd = ?std::env::current_dir().ok(),
        output_dir = %output_dir.display(),
        "Resolved output directory"
    );

    match run_pipeline(&config, &equity, &crypto, &output_dir, &FsSink) {
        Ok(outcome) => {
            print_summary(&config, &outcome);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {e}");
            if e.is_transport() {
                eprintln!("Check network access and the Marketstack API key.");
            }
            eprintln!("No output files were written.");
            std::process::exit(1);
        }
    }
}

fn config_cmd(path: Option<PathBuf>) -> Result<()> {
    let config = load_config(path.as_ref())?;
    print!("{}", config.redacted().to_toml()?);
    Ok(())
}

fn print_summary(config: &PipelineConfig, outcome: &PipelineOutcome) {
    let analysis = &outcome.analysis;
    let summary = &analysis.summary;

    println!();
    println!("=== Co-movement Analysis ===");
    println!(
        "Window:           {} ({} days)",
        analysis.window,
        analysis.window.len_days()
    );
    println!(
        "Equity:           {} ({} raw points)",
        config.equity.symbol, analysis.equity_raw_points
    );
    println!(
        "Crypto:           {} ({} raw points)",
        config.crypto.coin_id, analysis.crypto_raw_points
    );
    println!("Merged days:      {}", analysis.records.len());
    println!("Paired returns:   {}", summary.paired_observations);
    println!();
    println!(
        "Correlation between {} and {} daily returns: {}",
        config.equity.label,
        config.crypto.label,
        format_correlation(summary.correlation)
    );
    println!(
        "Number of divergence days: {} (threshold {}%)",
        summary.divergence_count, config.analysis.threshold_pct
    );
    println!();
    println!("--- Artifacts ---");
    for (kind, status) in &outcome.artifacts.outcomes {
        let name = match kind {
            ArtifactKind::Chart => "Chart",
            ArtifactKind::Csv => "CSV",
            ArtifactKind::Report => "Report",
        };
        match status {
            ArtifactStatus::Written {
                path,
                encoding: Some(enc),
            } => println!("{name:<8} saved: {} ({enc})", path.display()),
            ArtifactStatus::Written {
                path,
                encoding: None,
            } => println!("{name:<8} saved: {}", path.display()),
            ArtifactStatus::Failed { path, error } => {
                println!("{name:<8} FAILED: {} ({error})", path.display())
            }
        }
    }
    println!();
    if outcome.artifacts.all_written() {
        println!("Analysis complete. Files saved in {}", outcome.output_dir.display());
    } else {
        println!(
            "Analysis complete with errors. Check {} for partial output.",
            outcome.output_dir.display()
        );
    }
}
