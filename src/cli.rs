//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::tracing_sink::TracingSink;
use crate::domain::cache::CacheStore;
use crate::domain::error::TradingSystemError;
use crate::domain::frame::Frame;
use crate::domain::memoize::with_cache;
use crate::domain::ohlcv::{bars_from_frame, OHLCV_COLUMNS};
use crate::domain::operation::{op, Operation};
use crate::domain::retry::with_retry;
use crate::domain::settings::ResilienceSettings;
use crate::domain::timing::with_timing;
use crate::domain::validate::{with_validation, Tabular};
use crate::ports::data_port::DataPort;
use crate::ports::telemetry_port::PerformanceSink;

#[derive(Parser, Debug)]
#[command(name = "tradeguard", about = "Resilience wrappers for trading-system operations")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the resolved resilience settings
    Settings {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Load a CSV through the wrapper stack and report its shape
    Check {
        #[arg(short, long)]
        file: PathBuf,
        /// Columns the table must contain
        #[arg(long, value_delimiter = ',')]
        require: Vec<String>,
        #[arg(long)]
        min_rows: Option<usize>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn execute(cli: Cli) -> Result<(), TradingSystemError> {
    match cli.command {
        Command::Settings { config } => run_settings(config.as_ref()),
        Command::Check {
            file,
            require,
            min_rows,
            config,
        } => run_check(&file, require, min_rows, config.as_ref()),
    }
}

/// Settings from `path`, or the defaults when no file is given.
pub fn resolve_settings(path: Option<&PathBuf>) -> Result<ResilienceSettings, TradingSystemError> {
    match path {
        Some(path) => ResilienceSettings::from_config(&FileConfigAdapter::from_file(path)?),
        None => Ok(ResilienceSettings::default()),
    }
}

pub fn format_settings(settings: &ResilienceSettings) -> String {
    let retry = &settings.retry;
    let validation = &settings.validation;
    let mut out = String::new();
    out.push_str(&format!("cache.enabled = {}\n", settings.cache_enabled));
    out.push_str(&format!(
        "cache.ttl_seconds = {}\n",
        settings.cache_ttl.as_secs()
    ));
    out.push_str(&format!("cache.max_entries = {}\n", settings.cache_capacity));
    out.push_str(&format!("retry.max_attempts = {}\n", retry.max_attempts()));
    out.push_str(&format!(
        "retry.base_delay_seconds = {}\n",
        retry.base_delay().as_secs_f64()
    ));
    out.push_str(&format!("retry.backoff_factor = {}\n", retry.backoff_factor()));
    out.push_str(&format!("validation.min_rows = {}\n", validation.min_rows));
    out.push_str(&format!(
        "validation.required_columns = {}\n",
        validation.required_columns.join(",")
    ));
    out
}

fn run_settings(config_path: Option<&PathBuf>) -> Result<(), TradingSystemError> {
    let settings = resolve_settings(config_path)?;
    print!("{}", format_settings(&settings));
    Ok(())
}

/// Shape of a checked table.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSummary {
    pub rows: usize,
    pub columns: Vec<String>,
    /// Present when the table carries every OHLCV column.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub mean_typical_price: Option<f64>,
}

fn summarize(frame: &Frame) -> Result<FrameSummary, TradingSystemError> {
    let mut summary = FrameSummary {
        rows: frame.row_count(),
        columns: frame.columns().to_vec(),
        date_range: None,
        mean_typical_price: None,
    };
    if OHLCV_COLUMNS.iter().all(|c| frame.has_column(c)) {
        let bars = bars_from_frame(frame)?;
        if let (Some(first), Some(last)) = (bars.first(), bars.last()) {
            summary.date_range = Some((first.date, last.date));
            let total: f64 = bars.iter().map(|b| b.typical_price()).sum();
            summary.mean_typical_price = Some(total / bars.len() as f64);
        }
    }
    Ok(summary)
}

/// Load `file` with retry and timing around a memoized CSV read, then check
/// the loaded table against `settings.validation`.
pub fn check(
    file: &PathBuf,
    settings: &ResilienceSettings,
    store: Arc<CacheStore>,
    sink: Arc<dyn PerformanceSink>,
) -> Result<FrameSummary, TradingSystemError> {
    let adapter = CsvAdapter::new(PathBuf::from("."));
    // zero ttl stores nothing
    let ttl = if settings.cache_enabled {
        settings.cache_ttl
    } else {
        Duration::ZERO
    };

    let loader = with_retry(
        with_timing(
            with_cache(
                op("load_frame", |source: String| adapter.fetch_frame(&source)),
                store,
                ttl,
            ),
            sink.clone(),
        ),
        settings.retry,
    );
    let checker = with_timing(
        with_validation(
            op("check_frame", |(frame,): (Frame,)| summarize(&frame)),
            settings.validation.clone(),
        ),
        sink,
    );

    let frame = loader.call(file.display().to_string())?;
    checker.call((frame,))
}

fn run_check(
    file: &PathBuf,
    require: Vec<String>,
    min_rows: Option<usize>,
    config_path: Option<&PathBuf>,
) -> Result<(), TradingSystemError> {
    let mut settings = resolve_settings(config_path)?;
    if !require.is_empty() {
        settings.validation.required_columns = require;
    }
    if let Some(n) = min_rows {
        settings.validation.min_rows = n;
    }

    let store = Arc::new(CacheStore::new(settings.cache_capacity));
    let summary = check(file, &settings, store, Arc::new(TracingSink))?;
    println!(
        "{}: {} rows, {} columns ({})",
        file.display(),
        summary.rows,
        summary.columns.len(),
        summary.columns.join(", ")
    );
    if let Some((first, last)) = summary.date_range {
        println!("  dates: {first} to {last}");
    }
    if let Some(mean) = summary.mean_typical_price {
        println!("  mean typical price: {mean:.4}");
    }
    Ok(())
}
