//! # Schema Errors
//!
//! Fatal configuration errors. These indicate a developer or deployment
//! mistake (a schema file that does not exist, a search directory that is a
//! file, a schema that is not JSON) and are never turned into a 4xx answer.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal error raised while resolving or loading a schema.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The reference is a file reference with an empty name.
    #[error("No schema filename provided")]
    MissingFilename,

    /// No search directory contains the referenced file.
    #[error("Unable to find schema file: {filename} (searched {searched} directories)")]
    NotFound {
        /// The reference as given.
        filename: String,
        /// Number of search directories consulted.
        searched: usize,
    },

    /// The schema file exists but could not be read.
    #[error("Unable to read file: {}", .path.display())]
    Unreadable {
        /// Resolved file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The schema file is not valid JSON.
    #[error("Invalid json file: {filename}")]
    InvalidJson {
        /// The reference as given.
        filename: String,
        /// Parser error detail.
        reason: String,
    },

    /// An empty directory list or an empty directory name was appended.
    #[error("Invalid schema directory")]
    InvalidDirectory,

    /// An appended directory does not exist.
    #[error("Schema directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// An appended directory is actually a file.
    #[error("Expected a directory with schemas but got a file: {}", .0.display())]
    NotADirectory(PathBuf),

    /// An additional-properties policy could not be parsed.
    #[error("Invalid additional properties policy: {0}")]
    InvalidPolicy(String),

    /// A configuration file could not be loaded.
    #[error("config error for '{}': {reason}", .path.display())]
    Config {
        /// Path to the configuration file.
        path: PathBuf,
        /// Reason the file was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_messages_name_the_offending_value() {
        let err = SchemaError::DirectoryNotFound(PathBuf::from("fakedirectory"));
        assert_eq!(err.to_string(), "Schema directory not found: fakedirectory");

        let err = SchemaError::NotADirectory(PathBuf::from("/tmp/file.json"));
        assert_eq!(
            err.to_string(),
            "Expected a directory with schemas but got a file: /tmp/file.json"
        );

        assert_eq!(SchemaError::InvalidDirectory.to_string(), "Invalid schema directory");
    }

    #[test]
    fn test_invalid_json_message_uses_reference() {
        let err = SchemaError::InvalidJson {
            filename: "Invalid/Text.json".into(),
            reason: "expected value at line 1 column 1".into(),
        };
        assert_eq!(err.to_string(), "Invalid json file: Invalid/Text.json");
    }
}
