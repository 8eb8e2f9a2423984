//! CLI entry point for the GHI transformer.
//!
//! Applies one transform (energy aggregation, CSV export, coordinate
//! enrichment, index splitting or structure repair) to a file or directory
//! of GeoJSON irradiance records, writing into an empty output directory.

mod infra;

use crate::infra::nrel::client::NrelGridClient;
use anyhow::Result;
use clap::Parser;
use ghi_transformer::config::{self, GridSettings, RunConfig};
use ghi_transformer::pipeline;
use ghi_transformer::transforms::{CsvFlush, Operation};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "ghi_transformer")]
#[command(about = "Calculate statistics from GHI", long_about = None)]
struct Cli {
    /// Hours of data covered by each input group
    #[arg(long = "interval_hours", default_value_t = 1)]
    interval_hours: u32,

    /// Instant of time index 0 (YYYY-MM-DDTHH:MM:SS)
    #[arg(long, default_value = "2007-01-01T00:00:00")]
    epoch: String,

    /// When tocsv writes its per-location files
    #[arg(long, value_enum, default_value_t = CsvFlush::PerFile)]
    csv_flush: CsvFlush,

    /// Coordinate grid URL for addlatlon (overrides GHI_GRID_URL)
    #[arg(long)]
    grid_url: Option<String>,

    /// Transform to apply
    #[arg(value_enum)]
    op: Operation,

    /// Input file or directory of files
    input: PathBuf,

    /// Existing, empty output directory
    output: PathBuf,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/ghi_transformer.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("ghi_transformer.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let mut run_config = RunConfig::new(cli.op, &cli.input, &cli.output).with_interval_hours(cli.interval_hours)?;
    run_config.epoch = config::parse_epoch(&cli.epoch)?;
    run_config.csv_flush = cli.csv_flush;

    info!(
        op = ?run_config.operation,
        input = %run_config.input.display(),
        output = %run_config.output.display(),
        interval = %run_config.interval,
        "Interval of the data"
    );

    let grid = NrelGridClient::new(GridSettings::from_env(cli.grid_url));
    let summary = pipeline::run(&run_config, &grid)?;

    println!(
        "{} files processed, {} skipped, {} groups",
        summary.files_processed, summary.files_skipped, summary.groups
    );

    Ok(())
}
