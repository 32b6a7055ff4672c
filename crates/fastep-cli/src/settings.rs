//! # Settings
//!
//! Merges the optional configuration file with command-line flags. Flags
//! win: `--schema-dir` entries are searched before configured directories
//! and `--additional-properties` replaces the configured policy. With no
//! directories from either source, `./schemas` is used when it exists.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use fastep_schema::{AdditionalPropertiesPolicy, SchemaConfig};

/// Flags shared by every subcommand that resolves schemas.
#[derive(Args, Debug, Clone, Default)]
pub struct SchemaOptions {
    /// Directory searched for schema files. Repeatable; searched in order.
    #[arg(long = "schema-dir", value_name = "DIR")]
    pub schema_dirs: Vec<PathBuf>,

    /// Response policy: true (strip), false (allow), unset, or a type name.
    #[arg(long, value_name = "POLICY")]
    pub additional_properties: Option<AdditionalPropertiesPolicy>,
}

/// Build the effective configuration.
pub fn resolve(config: Option<&Path>, options: &SchemaOptions) -> Result<SchemaConfig> {
    let mut settings = match config {
        Some(path) => SchemaConfig::load(path)
            .with_context(|| format!("failed to load configuration {}", path.display()))?,
        None => SchemaConfig::default(),
    };

    if !options.schema_dirs.is_empty() {
        let mut dirs = options.schema_dirs.clone();
        dirs.extend(settings.schema_dirs);
        settings.schema_dirs = dirs;
    }
    if let Some(policy) = options.additional_properties {
        settings.additional_properties = policy;
    }
    if settings.schema_dirs.is_empty() {
        let fallback = PathBuf::from("schemas");
        if fallback.is_dir() {
            tracing::debug!("using ./schemas as schema directory");
            settings.schema_dirs.push(fallback);
        }
    }
    Ok(settings)
}
