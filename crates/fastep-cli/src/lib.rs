//! # fastep-cli — Command-Line Interface
//!
//! Runs the schema pipeline outside a web server, which is handy for
//! checking fixtures and schema changes in CI:
//!
//! ```bash
//! fastep validate user.json --schema Users/Get --response --schema-dir schemas
//! fastep validate 257.89.json --schema '{"type": "number", "maximum": 1}'
//! fastep schema Users/Get --response --additional-properties string
//! ```
//!
//! ## Exit Codes
//!
//! - `0`: data accepted (or schema printed).
//! - `1`: data rejected; the structured error is printed.
//! - `2`: fatal error: missing or malformed schema, bad directory,
//!   unreadable input. A malformed schema still prints its `500` record.
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in `main.rs`; handlers live here and return an
//!   exit code so they can be tested without spawning the binary.

pub mod schema;
pub mod settings;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use fastep_schema::SchemaReference;
use serde_json::Value;

/// Exit code for accepted data.
pub const EXIT_OK: u8 = 0;
/// Exit code for rejected data.
pub const EXIT_REJECTED: u8 = 1;
/// Exit code for fatal errors.
pub const EXIT_FATAL: u8 = 2;

/// Interpret a `--schema` argument: a JSON object literal is an inline
/// schema, anything else a file reference.
pub fn parse_reference(raw: &str) -> Result<SchemaReference> {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('{') {
        let schema: Value =
            serde_json::from_str(trimmed).context("inline schema is not valid JSON")?;
        Ok(SchemaReference::Inline(schema))
    } else {
        Ok(SchemaReference::from(raw))
    }
}

/// Read a JSON or YAML document.
pub fn load_document(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let is_json = path.extension().is_some_and(|ext| ext == "json");
    if is_json {
        serde_json::from_str(&content).with_context(|| format!("invalid JSON in {}", path.display()))
    } else {
        serde_yaml::from_str(&content).with_context(|| format!("invalid YAML in {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_reference() {
        assert_eq!(
            parse_reference(r#" {"type": "integer"}"#).unwrap(),
            SchemaReference::Inline(json!({"type": "integer"}))
        );
        assert_eq!(
            parse_reference("Users/Get").unwrap(),
            SchemaReference::from("Users/Get")
        );
        assert!(parse_reference("{not json").is_err());
    }

    #[test]
    fn test_load_document_json_and_yaml() {
        let tmp = tempfile::tempdir().unwrap();
        let json_path = tmp.path().join("data.json");
        std::fs::write(&json_path, r#"{"a": 1}"#).unwrap();
        assert_eq!(load_document(&json_path).unwrap(), json!({"a": 1}));

        let yaml_path = tmp.path().join("data.yaml");
        std::fs::write(&yaml_path, "a: 1\nb:\n  - x\n").unwrap();
        assert_eq!(load_document(&yaml_path).unwrap(), json!({"a": 1, "b": ["x"]}));

        let err = load_document(&tmp.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }
}
