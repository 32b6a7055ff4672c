//! # Validate Subcommand
//!
//! Runs a document through the request or response pipeline and prints the
//! accepted (possibly shaped) data or the structured error as pretty JSON.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use fastep_core::{Outcome, Request};
use fastep_schema::{Response, Schema};

use crate::settings::{self, SchemaOptions};
use crate::{load_document, parse_reference, EXIT_FATAL, EXIT_OK, EXIT_REJECTED};

/// Arguments for `fastep validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// JSON or YAML document to validate.
    #[arg(value_name = "DATA")]
    pub data: PathBuf,

    /// Schema file reference (e.g. `Users/Get`) or an inline JSON schema.
    #[arg(long, value_name = "REF")]
    pub schema: String,

    /// Shape and validate as a response instead of a request.
    #[arg(long)]
    pub response: bool,

    /// Route reported to response hooks.
    #[arg(long, default_value = "/")]
    pub route: String,

    /// HTTP method reported to response hooks.
    #[arg(long, default_value = "GET")]
    pub method: String,

    #[command(flatten)]
    pub options: SchemaOptions,
}

/// Execute the validate subcommand and return the exit code.
pub fn run_validate(args: &ValidateArgs, config: Option<&Path>) -> Result<u8> {
    let (code, rendered) = validate_document(args, config)?;
    println!("{rendered}");
    Ok(code)
}

/// Validate and render without printing.
pub fn validate_document(args: &ValidateArgs, config: Option<&Path>) -> Result<(u8, String)> {
    let settings = settings::resolve(config, &args.options)?;
    let reference = parse_reference(&args.schema)?;
    let data = load_document(&args.data)?;

    let outcome = if args.response {
        let request = Request::new(args.method.as_str(), args.route.as_str());
        Response::from_config(reference, &settings)?
            .returns(&request, data)
            .with_context(|| format!("cannot validate against schema {}", args.schema))?
    } else {
        Schema::from_config(reference, &settings)?
            .validate(data)
            .with_context(|| format!("cannot validate against schema {}", args.schema))?
    };
    render(&outcome)
}

/// Exit code and pretty JSON for an outcome. A server-class error (the
/// route schema does not compile) is fatal rather than a rejection.
pub fn render(outcome: &Outcome) -> Result<(u8, String)> {
    match outcome {
        Ok(data) => Ok((EXIT_OK, serde_json::to_string_pretty(data)?)),
        Err(error) if error.is_server_error() => {
            tracing::warn!(status = error.status(), "route schema is malformed");
            Ok((EXIT_FATAL, serde_json::to_string_pretty(error)?))
        }
        Err(error) => {
            tracing::info!(status = error.status(), "data rejected");
            Ok((EXIT_REJECTED, serde_json::to_string_pretty(error)?))
        }
    }
}
