mod logging;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use dbtseed_core::{Error as CoreError, Schema, build_fk_graph_report, validate_schema};
use dbtseed_generate::{
    GenerateOptions, GenerationEngine, GenerationError, KIND_DESCRIPTORS, KindSpec, load_options,
    write_output,
};
use logging::{LogTarget, init_logging};
use thiserror::Error;

#[derive(Debug, Error)]
enum CliError {
    #[error("schema error: {0}")]
    Core(#[from] CoreError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("logging setup failed: {0}")]
    Logging(String),
}

#[derive(Parser, Debug)]
#[command(name = "dbtseed", version, about = "Generate test data for dbt schemas")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate one CSV per table plus a run report.
    Generate(GenerateArgs),
    /// Validate a schema and print its foreign key dependency report.
    Check(CheckArgs),
    /// List the value kind descriptors accepted in configuration.
    Kinds,
}

#[derive(Args, Debug)]
struct LogArgs {
    /// Emit JSON log lines.
    #[arg(long, default_value_t = false)]
    log_json: bool,
    /// Append JSON log lines to a file instead of stderr.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// dbt schema file (YAML, or JSON by extension).
    #[arg(long, value_name = "PATH")]
    schema: PathBuf,
    /// Output directory for the CSV files and generation_report.json.
    #[arg(long, value_name = "DIR")]
    out: PathBuf,
    /// TOML file with generation options.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    #[arg(long)]
    min_rows: Option<usize>,
    #[arg(long)]
    max_rows: Option<usize>,
    /// Seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    locale: Option<String>,
    /// Column alias as `column=kind`, e.g. `OriginCityName=city`. Repeatable.
    #[arg(long = "alias", value_name = "COLUMN=KIND")]
    aliases: Vec<String>,
    /// Skip schema validation before generating.
    #[arg(long, default_value_t = false)]
    no_validate: bool,
    #[command(flatten)]
    log: LogArgs,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[arg(long, value_name = "PATH")]
    schema: PathBuf,
    #[command(flatten)]
    log: LogArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Check(args) => run_check(args),
        Command::Kinds => {
            for descriptor in KIND_DESCRIPTORS {
                println!("{descriptor}");
            }
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_generate(args: GenerateArgs) -> Result<(), CliError> {
    init_logging(LogTarget {
        json: args.log.log_json,
        file: args.log.log_file.as_deref(),
    })?;
    let timer = Instant::now();

    let options = resolve_options(&args)?;
    let schema = load_schema(&args.schema, !args.no_validate)?;
    tracing::info!(
        event = "schema_loaded",
        path = %args.schema.display(),
        tables = schema.models.len()
    );

    let mut engine = GenerationEngine::new(schema, options)?;
    let output = engine.run()?;
    let written = write_output(&args.out, &output)?;

    tracing::info!(
        event = "run_finished",
        run_id = %output.report.run_id,
        out = %args.out.display(),
        files = written.table_files.len(),
        bytes_written = written.bytes_written,
        duration_ms = timer.elapsed().as_millis() as u64
    );
    Ok(())
}

fn run_check(args: CheckArgs) -> Result<(), CliError> {
    init_logging(LogTarget {
        json: args.log.log_json,
        file: args.log.log_file.as_deref(),
    })?;
    let schema = load_schema(&args.schema, true)?;
    let report = build_fk_graph_report(&schema);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn load_schema(path: &Path, validate: bool) -> Result<Schema, CliError> {
    let schema = Schema::from_path(path)?;
    if validate {
        validate_schema(&schema)?;
    }
    Ok(schema)
}

/// Config file values, then command line flags on top.
fn resolve_options(args: &GenerateArgs) -> Result<GenerateOptions, CliError> {
    let mut options = match &args.config {
        Some(path) => load_options(path)?,
        None => GenerateOptions::default(),
    };
    if let Some(min_rows) = args.min_rows {
        options.min_rows = min_rows;
    }
    if let Some(max_rows) = args.max_rows {
        options.max_rows = max_rows;
    }
    if let Some(seed) = args.seed {
        options.seed = Some(seed);
    }
    if let Some(locale) = &args.locale {
        options.locale = locale.clone();
    }
    for alias in &args.aliases {
        let (column, kind) = parse_alias(alias)?;
        options.field_aliases.insert(column, kind);
    }
    Ok(options)
}

fn parse_alias(alias: &str) -> Result<(String, KindSpec), CliError> {
    let (column, kind) = alias.split_once('=').ok_or_else(|| {
        CliError::InvalidConfig(format!("alias '{alias}' must look like column=kind"))
    })?;
    let (column, kind) = (column.trim(), kind.trim());
    if column.is_empty() || kind.is_empty() {
        return Err(CliError::InvalidConfig(format!(
            "alias '{alias}' must look like column=kind"
        )));
    }
    Ok((column.to_string(), KindSpec::from(kind)))
}
