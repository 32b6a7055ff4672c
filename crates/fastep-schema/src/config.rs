//! # Schema Configuration
//!
//! Deployment settings shared by every orchestrator built from them:
//!
//! ```yaml
//! schema_dirs:
//!   - schemas
//!   - /srv/api/schemas
//! additional_properties: true   # true | false | unset | <type name>
//! draft: "2020-12"              # "4" | "6" | "7" | "2019-09" | "2020-12"
//! ```
//!
//! Relative `schema_dirs` are resolved against the directory holding the
//! configuration file. JSON files load too, since YAML is a superset.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::SchemaError;
use crate::policy::AdditionalPropertiesPolicy;

/// JSON Schema draft the engine compiles against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum SchemaDraft {
    /// Draft 4.
    #[serde(rename = "4")]
    Draft4,
    /// Draft 6.
    #[serde(rename = "6")]
    Draft6,
    /// Draft 7.
    #[serde(rename = "7")]
    Draft7,
    /// Draft 2019-09.
    #[serde(rename = "2019-09")]
    Draft201909,
    /// Draft 2020-12.
    #[default]
    #[serde(rename = "2020-12")]
    Draft202012,
}

impl SchemaDraft {
    pub(crate) fn engine(self) -> jsonschema::Draft {
        match self {
            Self::Draft4 => jsonschema::Draft::Draft4,
            Self::Draft6 => jsonschema::Draft::Draft6,
            Self::Draft7 => jsonschema::Draft::Draft7,
            Self::Draft201909 => jsonschema::Draft::Draft201909,
            Self::Draft202012 => jsonschema::Draft::Draft202012,
        }
    }
}

/// Settings applied to [`Schema`](crate::Schema) and
/// [`Response`](crate::Response) instances.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SchemaConfig {
    /// Directories searched for file references, in order.
    pub schema_dirs: Vec<PathBuf>,
    /// Response policy. Defaults to stripping undeclared members.
    pub additional_properties: AdditionalPropertiesPolicy,
    /// Draft used to compile schemas.
    pub draft: SchemaDraft,
}

impl SchemaConfig {
    /// Load a YAML or JSON configuration file.
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::Config {
            path: path.to_path_buf(),
            reason: format!("cannot read file: {e}"),
        })?;
        let mut config: Self = serde_yaml::from_str(&content).map_err(|e| SchemaError::Config {
            path: path.to_path_buf(),
            reason: format!("invalid configuration: {e}"),
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.schema_dirs = config
            .schema_dirs
            .into_iter()
            .map(|dir| if dir.is_relative() { base.join(dir) } else { dir })
            .collect();
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PrimitiveType;

    #[test]
    fn test_defaults() {
        let config = SchemaConfig::default();
        assert!(config.schema_dirs.is_empty());
        assert_eq!(config.additional_properties, AdditionalPropertiesPolicy::Remove(true));
        assert_eq!(config.draft, SchemaDraft::Draft202012);
    }

    #[test]
    fn test_load_yaml_resolves_relative_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("fastep.yaml");
        std::fs::write(
            &path,
            "schema_dirs:\n  - schemas\n  - /abs/schemas\nadditional_properties: string\ndraft: \"7\"\n",
        )
        .unwrap();

        let config = SchemaConfig::load(&path).unwrap();
        assert_eq!(
            config.schema_dirs,
            vec![tmp.path().join("schemas"), PathBuf::from("/abs/schemas")]
        );
        assert_eq!(
            config.additional_properties,
            AdditionalPropertiesPolicy::OnlyType(PrimitiveType::String)
        );
        assert_eq!(config.draft, SchemaDraft::Draft7);
    }

    #[test]
    fn test_load_json() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("fastep.json");
        std::fs::write(&path, r#"{"additional_properties": false}"#).unwrap();
        let config = SchemaConfig::load(&path).unwrap();
        assert_eq!(config.additional_properties, AdditionalPropertiesPolicy::Remove(false));
        assert_eq!(config.draft, SchemaDraft::Draft202012);
    }

    #[test]
    fn test_load_rejects_unknown_fields() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("fastep.yaml");
        std::fs::write(&path, "schema_directories: []\n").unwrap();
        let err = SchemaConfig::load(&path).unwrap_err();
        assert!(matches!(err, SchemaError::Config { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = SchemaConfig::load(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(err.to_string().contains("cannot read file"));
    }
}
