//! cbrfx CLI: fetch, plot and status commands.
//!
//! Commands:
//! - `fetch`: download daily rates from the CBR archive into the CSV log, then chart them
//! - `plot`: render the chart from an existing log
//! - `status`: report log location, record count, date span and resume point

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use cbrfx_core::data::CbrClient;
use cbrfx_core::data::ThreadSleeper;
use cbrfx_core::store::{Checkpoint, CsvRateLog};
use cbrfx_runner::{render_rate_chart, ChartOutcome, IngestConfig, Ingestor, RunSummary};

#[derive(Parser)]
#[command(
    name = "cbrfx",
    about = "cbrfx: resumable CBR daily exchange-rate downloader"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch daily rates into the CSV log (resuming where it left off), then chart them.
    Fetch {
        #[command(flatten)]
        opts: ConfigArgs,

        /// Skip chart rendering.
        #[arg(long, default_value_t = false)]
        no_chart: bool,
    },
    /// Render the chart from the existing CSV log.
    Plot {
        #[command(flatten)]
        opts: ConfigArgs,
    },
    /// Report the log's record count, date span and resume point.
    Status {
        #[command(flatten)]
        opts: ConfigArgs,
    },
}

/// Flags shared by every command. They override values from `--config`.
#[derive(Args)]
struct ConfigArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Currency code (e.g. USD, KZT).
    #[arg(long)]
    currency: Option<String>,

    /// Start date (YYYY-MM-DD).
    #[arg(long)]
    start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD).
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Requests per second against the archive.
    #[arg(long)]
    rps: Option<f64>,

    /// CSV log path. Defaults to data/dataset_{CODE}.csv.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Chart path. Defaults to data/{CODE}_rub_{year}.svg.
    #[arg(long)]
    chart: Option<PathBuf>,
}

impl ConfigArgs {
    fn resolve(self) -> Result<IngestConfig> {
        let mut config = match &self.config {
            Some(path) => IngestConfig::from_file(path)?,
            None => IngestConfig::default(),
        };
        if let Some(currency) = self.currency {
            config.currency = currency;
        }
        if let Some(start) = self.start {
            config.start_date = start;
        }
        if let Some(end) = self.end {
            config.end_date = end;
        }
        if let Some(rps) = self.rps {
            config.requests_per_sec = rps;
        }
        if self.output.is_some() {
            config.output_csv = self.output;
        }
        if self.chart.is_some() {
            config.output_chart = self.chart;
        }
        let config = config.validated()?;
        tracing::debug!(?config, "resolved configuration");
        Ok(config)
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch { opts, no_chart } => run_fetch(opts.resolve()?, no_chart),
        Commands::Plot { opts } => run_plot(&opts.resolve()?),
        Commands::Status { opts } => run_status(&opts.resolve()?),
    }
}

/// `RUST_LOG` filter (default `info`); `CBRFX_LOG_FORMAT=json` for JSON lines.
fn init_tracing() {
    let log_format = std::env::var("CBRFX_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }
}

fn run_fetch(config: IngestConfig, no_chart: bool) -> Result<()> {
    let client = CbrClient::from_settings(&config.source, config.retry.clone())
        .context("failed to build HTTP client")?;
    let store = CsvRateLog::new(config.csv_path());

    let mut ingestor = Ingestor::new(config, client, store, ThreadSleeper);
    let summary = ingestor.run()?;
    print_summary(&summary);

    if no_chart {
        return Ok(());
    }
    let records = ingestor.store().load_all()?;
    let config = ingestor.config();
    report_chart(render_rate_chart(&records, &config.currency, &config.chart_path())?);
    Ok(())
}

fn run_plot(config: &IngestConfig) -> Result<()> {
    let records = CsvRateLog::new(config.csv_path()).load_all()?;
    report_chart(render_rate_chart(&records, &config.currency, &config.chart_path())?);
    Ok(())
}

fn run_status(config: &IngestConfig) -> Result<()> {
    let log = CsvRateLog::new(config.csv_path());
    let path = log.path();
    if !path.exists() {
        println!("Rate log does not exist yet: {}", path.display());
        println!("Next fetch starts at {}", config.start_date);
        return Ok(());
    }

    let records = log.load_all()?;
    println!("Rate log: {}", path.display());
    println!("  Currency: {}", config.currency);
    println!("  Records:  {}", records.len());
    if let (Some(first), Some(last)) = (records.first(), records.last()) {
        println!("  Span:     {} .. {}", first.date, last.date);
        println!("  Last:     {}", last.formatted_rate());
    }
    match log.read()? {
        Some(cursor) if cursor > config.end_date => {
            println!("  Range through {} is covered", config.end_date)
        }
        Some(cursor) => println!("  Next fetch starts at {cursor}"),
        None => println!("  Next fetch starts at {}", config.start_date),
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let stats = &summary.stats;
    if summary.cancelled {
        println!("Cancelled before {}.", summary.end);
    }
    println!(
        "Done: saved {} rows, missing {} days. File: {}",
        stats.saved, stats.missing, summary.output
    );
    if !stats.skipped.is_empty() {
        let days: Vec<String> = stats.skipped.iter().map(|d| d.to_string()).collect();
        println!(
            "Skipped after fetch errors ({}): {}",
            days.len(),
            days.join(", ")
        );
    }
}

fn report_chart(outcome: ChartOutcome) {
    match outcome {
        ChartOutcome::Written(path) => println!("Chart saved: {}", path.display()),
        ChartOutcome::NoData => println!("No data to chart."),
    }
}
