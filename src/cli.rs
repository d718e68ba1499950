//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::aggregate::Selection;
use crate::domain::batch::{self, BatchReport};
use crate::domain::config_validation::{
    DataSource, ScanSettings, scan_settings_from_config, validate_scan_config,
};
use crate::domain::error::ScanError;
use crate::domain::fundamentals::{FundamentalsResult, merge_fundamentals};
use crate::domain::indicator::params::IndicatorParams;
use crate::domain::pipeline::PipelineMode;
use crate::domain::registry::REGISTRY;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "stocksignals", about = "Technical indicator scanner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score every instrument in the configured price data
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated indicators counted in the overall score
        #[arg(long)]
        indicators: Option<String>,
        /// full or lenient
        #[arg(long)]
        mode: Option<PipelineMode>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Merge fundamentals rows with per-company technicals
    Fundamentals {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        indicators: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the indicators, their weights and data requirements
    Indicators,
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Scan {
            config,
            indicators,
            mode,
            output,
        } => run_scan(&config, indicators.as_deref(), mode, output.as_ref()),
        Command::Fundamentals {
            config,
            indicators,
            output,
        } => run_fundamentals(&config, indicators.as_deref(), output.as_ref()),
        Command::Indicators => run_indicators(),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn report_failure(err: ScanError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

/// Loads, validates and resolves the run settings, applying command-line
/// overrides on top of the file.
pub fn load_settings(
    adapter: &dyn ConfigPort,
    default_mode: PipelineMode,
    indicators: Option<&str>,
    mode: Option<PipelineMode>,
    output: Option<&PathBuf>,
) -> Result<ScanSettings, ScanError> {
    validate_scan_config(adapter)?;
    let mut settings = scan_settings_from_config(adapter, default_mode)?;
    if let Some(list) = indicators {
        settings.pipeline.selection = Selection::parse_list(list);
    }
    if let Some(mode) = mode {
        settings.pipeline.mode = mode;
    }
    if let Some(path) = output {
        settings.output_path = Some(path.display().to_string());
    }
    Ok(settings)
}

/// Opens the data port the settings name.
pub fn open_data_port(
    source: &DataSource,
    adapter: &dyn ConfigPort,
) -> Result<Box<dyn DataPort>, ScanError> {
    match source {
        DataSource::Csv {
            prices_path,
            fundamentals_path,
        } => Ok(Box::new(CsvAdapter::new(
            prices_path.clone(),
            fundamentals_path.clone(),
        ))),
        #[cfg(feature = "sqlite")]
        DataSource::Sqlite => Ok(Box::new(
            crate::adapters::sqlite_adapter::SqliteAdapter::from_config(adapter)?,
        )),
        #[cfg(not(feature = "sqlite"))]
        DataSource::Sqlite => {
            let _ = adapter;
            Err(ScanError::invalid(
                "data",
                "source",
                "built without sqlite support",
            ))
        }
    }
}

fn run_scan(
    config_path: &PathBuf,
    indicators: Option<&str>,
    mode: Option<PipelineMode>,
    output_path: Option<&PathBuf>,
) -> ExitCode {
    // Stage 1: Load config
    info!(path = %config_path.display(), "loading config");
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Validate and resolve settings
    let settings = match load_settings(&adapter, PipelineMode::Full, indicators, mode, output_path)
    {
        Ok(s) => s,
        Err(e) => return report_failure(e),
    };

    // Stage 3: Open data source
    let data_port = match open_data_port(&settings.source, &adapter) {
        Ok(p) => p,
        Err(e) => return report_failure(e),
    };

    let report_port = JsonReportAdapter::new(settings.pretty);
    match run_scan_pipeline(data_port.as_ref(), &report_port, &settings) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => report_failure(e),
    }
}

/// Fetch, evaluate and write; returns the report that was written.
pub fn run_scan_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    settings: &ScanSettings,
) -> Result<BatchReport, ScanError> {
    let rows = data_port.fetch_price_rows()?;
    info!(rows = rows.len(), mode = %settings.pipeline.mode, "price rows loaded");

    let report = batch::run_batch_with_threads(rows, &settings.pipeline, settings.threads)
        .map_err(|e| ScanError::invalid("scan", "threads", e.to_string()))?;

    report_port.write_scan(&report, settings.output_path.as_deref())?;
    Ok(report)
}

fn run_fundamentals(
    config_path: &PathBuf,
    indicators: Option<&str>,
    output_path: Option<&PathBuf>,
) -> ExitCode {
    info!(path = %config_path.display(), "loading config");
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let settings = match load_settings(
        &adapter,
        PipelineMode::Lenient,
        indicators,
        None,
        output_path,
    ) {
        Ok(s) => s,
        Err(e) => return report_failure(e),
    };

    let data_port = match open_data_port(&settings.source, &adapter) {
        Ok(p) => p,
        Err(e) => return report_failure(e),
    };

    let report_port = JsonReportAdapter::new(settings.pretty);
    match run_fundamentals_pipeline(data_port.as_ref(), &report_port, &settings) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => report_failure(e),
    }
}

/// Fetch fundamentals and the price history of their groups, merge, write.
pub fn run_fundamentals_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    settings: &ScanSettings,
) -> Result<Vec<FundamentalsResult>, ScanError> {
    let fundamentals = data_port.fetch_fundamentals()?;
    let mut groups: Vec<i64> = fundamentals.iter().map(|f| f.group_id).collect();
    groups.sort_unstable();
    groups.dedup();

    let prices = data_port.fetch_price_rows_for_groups(&groups)?;
    info!(
        fundamentals = fundamentals.len(),
        price_rows = prices.len(),
        "fundamentals and price rows loaded"
    );

    let merged = batch::with_thread_pool(settings.threads, || {
        merge_fundamentals(fundamentals, prices, &settings.pipeline)
    })
    .map_err(|e| ScanError::invalid("scan", "threads", e.to_string()))?;

    report_port.write_fundamentals(&merged, settings.output_path.as_deref())?;
    Ok(merged)
}

/// One line per registry entry, in registry order.
pub fn indicator_table(params: &IndicatorParams) -> Vec<String> {
    REGISTRY
        .iter()
        .map(|spec| {
            format!(
                "{:<16} weight {:>4.2}  min bars {:>3}{}",
                spec.kind.name(),
                spec.weight,
                params.minimum_bars(spec.kind),
                if spec.critical { "  critical" } else { "" }
            )
        })
        .collect()
}

fn run_indicators() -> ExitCode {
    let params = IndicatorParams::default();
    for line in indicator_table(&params) {
        println!("{line}");
    }
    println!("full coverage needs {} bars", params.full_coverage_bars());
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let settings = match load_settings(&adapter, PipelineMode::Full, None, None, None) {
        Ok(s) => s,
        Err(e) => return report_failure(e),
    };

    match &settings.source {
        DataSource::Csv {
            prices_path,
            fundamentals_path,
        } => {
            eprintln!("  Source:       csv ({})", prices_path.display());
            if let Some(path) = fundamentals_path {
                eprintln!("  Fundamentals: {}", path.display());
            }
        }
        DataSource::Sqlite => eprintln!("  Source:       sqlite"),
    }
    eprintln!("  Mode:         {}", settings.pipeline.mode);
    let names: Vec<&str> = settings.pipeline.selection.iter().map(|k| k.name()).collect();
    eprintln!("  Indicators:   {}", names.join(", "));
    eprintln!(
        "  Full coverage: {} bars",
        settings.pipeline.params.full_coverage_bars()
    );
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
