//! # fastep CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fastep_cli::schema::{run_schema, SchemaArgs};
use fastep_cli::validate::{run_validate, ValidateArgs};
use fastep_cli::EXIT_FATAL;

/// Schema-driven request validation and response shaping for JSON APIs.
#[derive(Parser, Debug)]
#[command(name = "fastep", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a document as request data or shape it as response data.
    Validate(ValidateArgs),

    /// Print a resolved schema, optionally after the response rewrite.
    Schema(SchemaArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = cli.config.as_deref();
    if let Some(path) = config {
        tracing::debug!(config = %path.display(), "using configuration file");
    }

    let result = match cli.command {
        Commands::Validate(args) => run_validate(&args, config),
        Commands::Schema(args) => run_schema(&args, config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}
