//! # Schema Subcommand
//!
//! Prints a schema as the pipeline sees it: resolved through the search
//! directories and, with `--response`, rewritten by the
//! additional-properties policy.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use fastep_schema::SchemaSource;

use crate::settings::{self, SchemaOptions};
use crate::{parse_reference, EXIT_OK};

/// Arguments for `fastep schema`.
#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Schema file reference or inline JSON schema.
    #[arg(value_name = "REF")]
    pub schema: String,

    /// Show the schema after the response rewrite.
    #[arg(long)]
    pub response: bool,

    #[command(flatten)]
    pub options: SchemaOptions,
}

/// Execute the schema subcommand and return the exit code.
pub fn run_schema(args: &SchemaArgs, config: Option<&Path>) -> Result<u8> {
    println!("{}", render_schema(args, config)?);
    Ok(EXIT_OK)
}

/// Resolve and render without printing.
pub fn render_schema(args: &SchemaArgs, config: Option<&Path>) -> Result<String> {
    let settings = settings::resolve(config, &args.options)?;
    let mut source = SchemaSource::new(parse_reference(&args.schema)?);
    if !settings.schema_dirs.is_empty() {
        source.append_schema_dirs(settings.schema_dirs.iter().cloned())?;
    }

    let contents = if args.response {
        source.apply_additional_properties(&settings.additional_properties)
    } else {
        source.get_contents()
    }
    .with_context(|| format!("cannot load schema {}", args.schema))?;
    Ok(serde_json::to_string_pretty(contents)?)
}
