//! Binary entry point for the tyannot CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Resolve the annotations of a module description (JSON report)
//! tyannot check module.json
//!
//! # Human-readable report, with debug tracing on stderr
//! tyannot --log-level debug check module.json --format text
//!
//! # Treat `this` as the implicit receiver of methods
//! tyannot check module.json --receiver this
//! ```

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use tyannot::cli::{check_module, receiver_policy, render_text};
use tyannot_core::error::{OutputErrorCode, TyannotError};
use tyannot_core::output::{emit_response, ErrorResponse};
use tyannot_python::config::AnnotationConfig;

// ============================================================================
// CLI Structure
// ============================================================================

/// Resolve Python type annotations.
///
/// Reads a JSON description of a module, resolves its annotations, type
/// comments and generic specializations, and reports the result as JSON.
#[derive(Parser, Debug)]
#[command(name = "tyannot", version, about = "Resolve Python type annotations")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Output format for reports.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    /// JSON report.
    Json,
    /// Human-readable summary.
    Text,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve the annotations of a module description.
    Check {
        /// Path to the module description (JSON).
        path: PathBuf,
        /// Output format.
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
        /// Name of an implicit method receiver (repeatable; default: self, cls).
        #[arg(long = "receiver", value_name = "NAME")]
        receivers: Vec<String>,
        /// Never skip a leading receiver when matching function type comments.
        #[arg(long)]
        no_receivers: bool,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON, like every other response
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<(), TyannotError> {
    match cli.command {
        Command::Check {
            path,
            format,
            receivers,
            no_receivers,
        } => execute_check(&path, format, &receivers, no_receivers),
    }
}

fn execute_check(
    path: &Path,
    format: OutputFormat,
    receivers: &[String],
    no_receivers: bool,
) -> Result<(), TyannotError> {
    let config = AnnotationConfig::with_receiver_policy(receiver_policy(receivers, no_receivers)?);
    let report = check_module(path, &config)?;

    let mut stdout = io::stdout();
    match format {
        OutputFormat::Json => emit_response(&report, &mut stdout),
        OutputFormat::Text => write!(stdout, "{}", render_text(&report)),
    }
    .map_err(|err| TyannotError::internal(format!("failed to write report: {}", err)))?;
    let _ = stdout.flush();
    Ok(())
}
