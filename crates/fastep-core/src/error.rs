//! # Structured Error
//!
//! [`StructuredError`] is what a caller receives when data is rejected or a
//! route's schema turns out to be broken. It is a fixed record, serialized as:
//!
//! ```json
//! {"code": 422, "message": "...", "data": {"status": 422, "all_messages": {"/a": ["..."]}}}
//! ```
//!
//! ## Status Classes
//!
//! - `422`: the caller's data does not match the route schema.
//! - `500`: the route schema itself is malformed (a developer error).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::messages::FieldMessages;

/// Status used when data fails schema constraints.
pub const UNPROCESSABLE_ENTITY: u16 = 422;

/// Status used when the schema itself cannot be compiled.
pub const INTERNAL_SERVER_ERROR: u16 = 500;

/// Headline used when a rejection carries no per-field messages,
/// e.g. when an is-valid hook forces a failure on clean data.
const FALLBACK_REJECTION_MESSAGE: &str = "Invalid data";

/// Result of a single validation call: the (possibly reshaped) data on
/// success, or the error record to hand back to the caller.
pub type Outcome = Result<Value, StructuredError>;

/// User-facing error record.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{message}")]
pub struct StructuredError {
    /// Numeric error code. Mirrors `data.status`.
    pub code: u16,
    /// Human-readable summary.
    pub message: String,
    /// Status and optional per-field detail.
    pub data: ErrorData,
}

/// The `data` member of a [`StructuredError`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorData {
    /// HTTP status to report.
    pub status: u16,
    /// Every formatted message keyed by failing path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_messages: Option<FieldMessages>,
}

impl StructuredError {
    /// Build an error with the given status and summary and no field detail.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            code: status,
            message: message.into(),
            data: ErrorData {
                status,
                all_messages: None,
            },
        }
    }

    /// A `422` rejection whose headline is the first message of the first
    /// failing path and whose `all_messages` carries the full map.
    pub fn unprocessable(messages: FieldMessages) -> Self {
        let headline = messages
            .first_message()
            .unwrap_or(FALLBACK_REJECTION_MESSAGE)
            .to_string();
        Self::new(UNPROCESSABLE_ENTITY, headline).with_messages(messages)
    }

    /// A `500` error for a route whose contract is broken.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_SERVER_ERROR, message)
    }

    /// Attach per-field messages.
    pub fn with_messages(mut self, messages: FieldMessages) -> Self {
        self.data.all_messages = Some(messages);
        self
    }

    /// The HTTP status carried in `data.status`.
    pub fn status(&self) -> u16 {
        self.data.status
    }

    /// Per-field messages, if any were attached.
    pub fn all_messages(&self) -> Option<&FieldMessages> {
        self.data.all_messages.as_ref()
    }

    /// True for the server-class (5xx) errors.
    pub fn is_server_error(&self) -> bool {
        self.data.status >= 500
    }
}
