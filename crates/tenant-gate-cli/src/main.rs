// crates/tenant-gate-cli/src/main.rs
// ============================================================================
// Module: Tenant Gate CLI Entry Point
// Description: Command dispatcher for offline admission evaluation.
// Purpose: Run one admission review through the gate and validate configs.
// Dependencies: clap, tenant-gate-{config,core,webhook}, serde_json, thiserror, tokio.
// ============================================================================

//! ## Overview
//! `tenant-gate evaluate` feeds one `AdmissionReview` file (or stdin) through
//! the same gate the webhook uses and prints the rendered response review.
//! `tenant-gate config validate` loads and validates a configuration file.
//! Inputs are untrusted: review files are size-capped before parsing.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use tenant_gate_config::TenantGateConfig;
use tenant_gate_core::CancellationToken;
use tenant_gate_webhook::TenantGate;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of an admission review input.
const MAX_REVIEW_BYTES: usize = 4 * 1024 * 1024;
/// Exit code for reviews that evaluated to an error verdict.
const ERRORED_EXIT_CODE: u8 = 2;
/// Path value selecting stdin.
const STDIN_PATH: &str = "-";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "tenant-gate", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate one admission review and print the response review.
    Evaluate(EvaluateCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a Tenant Gate configuration file.
    Validate(ConfigValidateCommand),
}

/// Arguments for `evaluate`.
#[derive(Args, Debug)]
struct EvaluateCommand {
    /// Admission review JSON file (`-` reads stdin).
    #[arg(long, value_name = "PATH")]
    review: PathBuf,
    /// Optional config file path (defaults to tenant-gate.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Abort the evaluation after this many milliseconds.
    #[arg(long, value_name = "MS")]
    deadline_ms: Option<u64>,
    /// Pretty-print the response review.
    #[arg(long)]
    pretty: bool,
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to tenant-gate.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

/// Errors raised while reading bounded inputs.
#[derive(Debug)]
enum ReadLimitError {
    /// I/O failure while reading.
    Io(std::io::Error),
    /// Input exceeds the configured limit.
    TooLarge {
        /// Allowed limit in bytes.
        limit: usize,
    },
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };
    match command {
        Commands::Evaluate(command) => command_evaluate(&command).await,
        Commands::Config {
            command,
        } => command_config(command),
    }
}

/// Prints top-level help.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Evaluate Command
// ============================================================================

/// Executes the `evaluate` command.
async fn command_evaluate(command: &EvaluateCommand) -> CliResult<ExitCode> {
    let config = TenantGateConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let gate = TenantGate::from_config(&config)
        .map_err(|err| CliError::new(format!("failed to build gate: {err}")))?;
    let body = read_review(&command.review)?;

    let cancel = CancellationToken::new();
    if let Some(deadline_ms) = command.deadline_ms {
        let deadline = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(deadline_ms)).await;
            deadline.cancel();
        });
    }
    let outcome = gate.review(&body, &cancel).await;
    cancel.cancel();

    let rendered = if command.pretty {
        serde_json::to_string_pretty(&outcome.response)
    } else {
        serde_json::to_string(&outcome.response)
    }
    .map_err(|err| CliError::new(format!("failed to render response review: {err}")))?;
    write_stdout_line(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))?;

    Ok(exit_code_for(outcome.verdict.error_kind().is_some()))
}

/// Maps an evaluation outcome onto the process exit code.
fn exit_code_for(errored: bool) -> ExitCode {
    if errored { ExitCode::from(ERRORED_EXIT_CODE) } else { ExitCode::SUCCESS }
}

/// Reads the review body from a file or stdin.
fn read_review(path: &Path) -> CliResult<Vec<u8>> {
    let result = if path.as_os_str() == STDIN_PATH {
        read_with_limit(std::io::stdin().lock(), MAX_REVIEW_BYTES)
    } else {
        File::open(path)
            .map_err(ReadLimitError::Io)
            .and_then(|file| read_with_limit(file, MAX_REVIEW_BYTES))
    };
    result.map_err(|err| match err {
        ReadLimitError::Io(err) => {
            CliError::new(format!("failed to read review {}: {err}", path.display()))
        }
        ReadLimitError::TooLarge {
            limit,
        } => CliError::new(format!("review {} exceeds {limit} bytes", path.display())),
    })
}

/// Reads at most `max_bytes` from `reader`, failing when more is available.
fn read_with_limit(reader: impl Read, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let read_limit = u64::try_from(max_bytes).unwrap_or(u64::MAX).saturating_add(1);
    let mut bytes = Vec::new();
    reader.take(read_limit).read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        return Err(ReadLimitError::TooLarge {
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let _config = TenantGateConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    write_stdout_line("config ok").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
