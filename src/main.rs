//! `callfreq` terminal viewer for method call frequency reports.

mod cli_logger;

use anyhow::Result;
use callfreq::{
    Blob, CallfreqResult, Config, DEFAULT_CONFIG_FILE, Reporter, ReportSnapshot, SummaryRender,
    TickLabeler, ViewModel, ViewState, all_methods, extract_series_with, filter_methods, ingest,
    schema_doc,
};
use clap::{Parser, Subcommand};
use serde::Serialize;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use cli_logger::CliLogger;

#[derive(Debug, Parser)]
#[command(name = "callfreq", version, about = "Explore per-tick method call frequency reports")]
struct Cli {
    /// Config file (defaults to ./callfreq.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format; overrides the config file.
    #[arg(long, global = true)]
    reporter: Option<Reporter>,

    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load a report and render summary, catalog and chart.
    View {
        file: PathBuf,
        /// Method to chart.
        #[arg(long)]
        method: Option<String>,
        /// Case-insensitive substring filter for the catalog.
        #[arg(long)]
        filter: Option<String>,
        /// Chart the method at this rank of the report's top list.
        #[arg(long, conflicts_with = "method")]
        top: Option<usize>,
    },
    /// List the methods observed in a report.
    Catalog {
        file: PathBuf,
        #[arg(long)]
        filter: Option<String>,
    },
    /// Print one method's per-tick call counts.
    Series {
        file: PathBuf,
        #[arg(long)]
        method: String,
    },
    /// Print report provenance, sampling metadata and summary statistics.
    Summary { file: PathBuf },
    /// Print the accepted report shape.
    Schema,
}

#[derive(Debug, Serialize)]
struct CatalogOutput<'a> {
    filter: &'a str,
    total: usize,
    methods: Vec<&'a str>,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            let json = cli.reporter == Some(Reporter::Json);
            CliLogger::new(json, cli.no_color, 1).print_error(&err.to_string());
            return ExitCode::from(2);
        }
    };
    let reporter = cli.reporter.unwrap_or(config.reporter);
    let mut logger = CliLogger::new(
        reporter == Reporter::Json,
        cli.no_color,
        config.sparkline_width,
    );

    match run(&cli.command, &config, &mut logger) {
        Ok(code) => code,
        Err(err) => {
            logger.print_error(&format!("{err:#}"));
            ExitCode::from(1)
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("CALLFREQ_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(explicit: Option<&Path>) -> CallfreqResult<Config> {
    match explicit {
        Some(path) => Config::load(path),
        None => Ok(Config::load_optional(Path::new(DEFAULT_CONFIG_FILE))),
    }
}

fn run(command: &Command, config: &Config, logger: &mut CliLogger) -> Result<ExitCode> {
    match command {
        Command::View {
            file,
            method,
            filter,
            top,
        } => {
            let mut model = ViewModel::new(config);
            model.submit_blob(&Blob::from_path(file)?)?;
            if model.loaded().is_some() {
                if let Some(query) = filter {
                    model.set_filter(query.as_str())?;
                }
                if let Some(method) = method {
                    model.select_method(method.as_str())?;
                }
                if let Some(rank) = top {
                    model.select_top_method(*rank)?;
                }
            }
            model.render(logger)?;
            if matches!(model.state(), ViewState::Error(_)) {
                return Ok(ExitCode::from(1));
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Catalog { file, filter } => {
            let snapshot = load_snapshot(file)?;
            let catalog = all_methods(&snapshot.report);
            let query = filter.as_deref().unwrap_or_default();
            logger.print_serialized(&CatalogOutput {
                filter: query,
                total: catalog.len(),
                methods: filter_methods(&catalog, query),
            })?;
            Ok(ExitCode::SUCCESS)
        }

        Command::Series { file, method } => {
            let snapshot = load_snapshot(file)?;
            let labeler = TickLabeler::new(&config.tick_label_prefix);
            let series = extract_series_with(&snapshot.report, method, &labeler);
            logger.print_serialized(&serde_json::json!({
                "method": series.method,
                "stats": series.stats(),
                "points": series.points,
            }))?;
            Ok(ExitCode::SUCCESS)
        }

        Command::Summary { file } => {
            let snapshot = load_snapshot(file)?;
            logger.print_serialized(&SummaryRender::from_snapshot(&snapshot))?;
            Ok(ExitCode::SUCCESS)
        }

        Command::Schema => {
            logger.print_serialized(&schema_doc())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_snapshot(path: &Path) -> CallfreqResult<ReportSnapshot> {
    let blob = Blob::from_path(path)?;
    Ok(ingest(&blob)?)
}
