//! mdb-stats: log database server status metrics to a CSV time series.

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use ms_common::{Error, Result, Schema};
use ms_config::fields::load_schema;
use ms_config::{
    SamplerConfig, DEFAULT_CSV_FILENAME, DEFAULT_MONGODB_URL, DEFAULT_PERIOD_SECS, ENV_CSV,
    ENV_FIELDS, ENV_PERIOD, ENV_URL,
};
use ms_core::source::MongoStatusSource;
use ms_core::{CancelToken, ExitCode, Sampler, SamplerOptions, StopReason};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "mdb-stats",
    version,
    about = "Logs DB & WiredTiger statistics periodically to a local CSV file"
)]
struct Cli {
    /// Server connection URL
    #[arg(short = 'u', long, env = ENV_URL, default_value = DEFAULT_MONGODB_URL)]
    url: String,

    /// CSV file to log stats to (recreated on every run)
    #[arg(short = 'c', long = "csvfile", env = ENV_CSV, default_value = DEFAULT_CSV_FILENAME)]
    csvfile: PathBuf,

    /// Polling period in seconds
    #[arg(short = 'p', long, env = ENV_PERIOD, default_value_t = DEFAULT_PERIOD_SECS)]
    period: u64,

    /// JSON field-schema file replacing the built-in field list
    #[arg(long, env = ENV_FIELDS)]
    fields: Option<PathBuf>,

    /// Stop after writing this many rows
    #[arg(long)]
    max_samples: Option<u64>,

    /// Log filter (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Print the CSV header for the resolved field schema and exit
    #[arg(long)]
    print_header: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_logging(level: Option<&str>, format: LogFormat) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn resolve(cli: &Cli) -> Result<(SamplerConfig, Schema)> {
    let config = SamplerConfig::new(&cli.url, &cli.csvfile, Duration::from_secs(cli.period))
        .with_max_samples(cli.max_samples);
    config.validate()?;
    let schema = load_schema(cli.fields.as_deref())?;
    Ok((config, schema))
}

fn run(cli: Cli) -> Result<ExitCode> {
    let (config, schema) = resolve(&cli)?;

    if cli.print_header {
        println!("{}", schema.header().join(","));
        return Ok(ExitCode::Clean);
    }

    info!(
        url = %config.redacted_url(),
        csv = %config.csv_path.display(),
        period_secs = config.period.as_secs(),
        max_samples = ?config.max_samples,
        columns = schema.column_count(),
        "resolved configuration"
    );
    println!(
        "Generating stats for: \"{}\" to {}",
        config.redacted_url(),
        config.csv_path.display()
    );

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .map_err(|e| Error::Internal(format!("cannot install interrupt handler: {}", e)))?;

    let source = MongoStatusSource::connect(&config.url)?;
    let mut sampler = Sampler::new(schema, source, SamplerOptions::from(&config));
    let report = sampler.run(&config.csv_path, &cancel)?;

    if matches!(report.stop, StopReason::Cancelled) {
        // Leave the shell prompt on a fresh line after ^C.
        println!();
    }
    report.into_result().map(|_| ExitCode::Clean)
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref(), cli.log_format);

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, code = e.code(), "fatal");
            eprintln!("error: {}", e);
            ExitCode::from_error(&e)
        }
    };
    process::exit(code.as_i32());
}
