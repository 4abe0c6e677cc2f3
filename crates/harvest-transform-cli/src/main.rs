// crates/harvest-transform-cli/src/main.rs
// ============================================================================
// Module: Harvest Transform CLI Entry Point
// Description: Command dispatcher for batch runs and config utilities.
// Purpose: Wire config, providers, and the batch runner into one binary.
// Dependencies: clap, harvest-transform-broker, harvest-transform-config,
//               harvest-transform-providers, tracing-subscriber
// ============================================================================

//! ## Overview
//! The CLI runs one harvest batch from a message file against a local bucket
//! directory, and ships config validation and template generation utilities.
//! Inputs are untrusted: message and config files are size-capped and
//! strictly decoded before anything runs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use harvest_transform_broker::BatchReport;
use harvest_transform_broker::BatchRunner;
use harvest_transform_broker::DirObjectStore;
use harvest_transform_broker::HarvestMessage;
use harvest_transform_config::HarvestTransformConfig;
use harvest_transform_config::config_toml_example;
use harvest_transform_core::AssetFetcher;
use harvest_transform_core::LicenseIndex;
use harvest_transform_core::PatchStore;
use harvest_transform_core::RenderProfiles;
use harvest_transform_core::TransformEngine;
use harvest_transform_providers::DirPatchStore;
use harvest_transform_providers::HttpFetcher;
use harvest_transform_providers::MemoryPatchStore;
use harvest_transform_providers::StaticLicenseIndex;
use serde_json::json;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a harvest message JSON input.
const MAX_MESSAGE_BYTES: u64 = 1_048_576;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "harvest-transform", version, about = "Harvest document transformation pipeline")]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one harvest batch against a local bucket directory.
    Run(RunCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for running one harvest batch.
#[derive(Args, Debug)]
struct RunCommand {
    /// Path to harvest-transform.toml.
    #[arg(long, value_name = "PATH")]
    config: PathBuf,
    /// Path to the harvest message JSON file.
    #[arg(long, value_name = "PATH")]
    message: PathBuf,
    /// Bucket root directory holding the harvested documents.
    #[arg(long, value_name = "DIR")]
    bucket_dir: PathBuf,
}

/// Supported config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate a config file.
    Validate(ConfigValidateCommand),
    /// Print an annotated starter config.
    Template,
}

/// Arguments for config validation.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Path to harvest-transform.toml.
    #[arg(long, value_name = "PATH")]
    config: PathBuf,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying a rendered message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a rendered message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    init_tracing();
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Installs the stderr tracing subscriber honoring `RUST_LOG`.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(command) => command_run(&command),
        Commands::Config {
            command,
        } => command_config(&command),
    }
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Runs one harvest batch end to end.
fn command_run(command: &RunCommand) -> CliResult<ExitCode> {
    let config = HarvestTransformConfig::load(&command.config)
        .map_err(|err| CliError::new(err.to_string()))?;
    let message = load_message(&command.message, &config)?;
    let runner = build_runner(&config, &command.bucket_dir)?;
    info!(
        batch = message.id.as_deref().unwrap_or("-"),
        source = message.source.as_str(),
        "running batch"
    );
    let report = runner.run(&message).map_err(|err| CliError::new(err.to_string()))?;
    print_report(&report)?;
    if report.is_clean() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Reads and validates the harvest message, applying config overrides.
fn load_message(path: &Path, config: &HarvestTransformConfig) -> CliResult<HarvestMessage> {
    let read_err =
        |detail: String| CliError::new(format!("failed to read message {}: {detail}", path.display()));
    let size = fs::metadata(path).map_err(|err| read_err(err.to_string()))?.len();
    if size > MAX_MESSAGE_BYTES {
        return Err(read_err("message file exceeds size limit".to_string()));
    }
    let bytes = fs::read(path).map_err(|err| read_err(err.to_string()))?;
    let mut message: HarvestMessage = serde_json::from_slice(&bytes)
        .map_err(|err| CliError::new(format!("failed to decode message: {err}")))?;
    if let Some(source_root) = &config.transform.source_root {
        message.source.clone_from(source_root);
    }
    if let Some(bucket) = &config.transform.bucket {
        message.bucket_name.clone_from(bucket);
    }
    if let Some(workspace) = &config.transform.workspace {
        message.workspace = Some(workspace.clone());
    }
    message.validate().map_err(|err| CliError::new(err.to_string()))?;
    Ok(message)
}

/// Batch runner type assembled from config-selected backends.
type ConfiguredRunner = BatchRunner<
    Box<dyn LicenseIndex + Sync>,
    Box<dyn PatchStore + Sync>,
    Box<dyn AssetFetcher + Sync>,
    DirObjectStore,
>;

/// Builds the batch runner from the config and the bucket directory.
fn build_runner(config: &HarvestTransformConfig, bucket_dir: &Path) -> CliResult<ConfiguredRunner> {
    let license: Box<dyn LicenseIndex + Sync> = match &config.license.index_path {
        Some(path) => Box::new(
            StaticLicenseIndex::load(path).map_err(|err| CliError::new(err.to_string()))?,
        ),
        None => Box::new(StaticLicenseIndex::from_entries([])),
    };
    let patches: Box<dyn PatchStore + Sync> = match &config.patch.dir {
        Some(dir) => {
            Box::new(DirPatchStore::open(dir).map_err(|err| CliError::new(err.to_string()))?)
        }
        None => Box::new(MemoryPatchStore::from_entries([])),
    };
    let fetcher: Box<dyn AssetFetcher + Sync> = Box::new(
        HttpFetcher::new(config.fetch.clone()).map_err(|err| CliError::new(err.to_string()))?,
    );
    let renders = RenderProfiles::from_entries(
        config
            .render
            .iter()
            .map(|entry| (entry.collection.clone(), entry.profile.clone())),
    );
    let engine = TransformEngine::new(license, patches, fetcher, renders);
    let store =
        DirObjectStore::open(bucket_dir).map_err(|err| CliError::new(err.to_string()))?;
    let output_root = Url::parse(&config.transform.output_root)
        .map_err(|err| CliError::new(format!("invalid output root: {err}")))?;
    Ok(BatchRunner::new(engine, store, output_root, config.runner.workers))
}

/// Prints the batch report as JSON on stdout.
fn print_report(report: &BatchReport) -> CliResult<()> {
    let failed: Vec<_> = report
        .keys
        .iter()
        .filter(|key| !key.succeeded())
        .map(|key| {
            json!({
                "key": key.original_key,
                "error": key.error,
            })
        })
        .collect();
    let warnings: Vec<_> = report
        .keys
        .iter()
        .flat_map(|key| {
            key.warnings.iter().map(|warning| {
                json!({
                    "key": key.original_key,
                    "warning": warning,
                })
            })
        })
        .collect();
    let body = json!({
        "message": report.message,
        "failed": failed,
        "warnings": warnings,
    });
    let rendered = serde_json::to_string_pretty(&body)
        .map_err(|err| CliError::new(format!("failed to render report: {err}")))?;
    write_stdout_line(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: &ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(command),
        ConfigCommand::Template => command_config_template(),
    }
}

/// Loads and validates a config file.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    HarvestTransformConfig::load(&command.config)
        .map_err(|err| CliError::new(err.to_string()))?;
    write_stdout_line("config ok").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Prints the annotated starter config.
fn command_config_template() -> CliResult<ExitCode> {
    write_stdout_line(config_toml_example().trim_end())
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes one line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes one line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output failure message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}

// ============================================================================
// SECTION: Tests
// ============================================================================
