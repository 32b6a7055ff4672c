//! # fastep-schema — Schema Validation & Response Shaping
//!
//! Validates REST request bodies and shapes REST response bodies against
//! JSON Schema documents.
//!
//! ## Pipeline
//!
//! 1. [`SchemaSource`] resolves an inline schema or a file reference against
//!    the [`SchemaSearchPath`] and caches the parsed contents.
//! 2. [`rewrite`](rewrite::rewrite) injects `additionalProperties` at every
//!    object node according to an [`AdditionalPropertiesPolicy`] (responses
//!    only).
//! 3. A [`Validator`] (by default [`JsonSchemaValidator`], backed by the
//!    `jsonschema` crate) produces a [`ValidationResult`].
//! 4. [`ErrorFormatter`] turns violations into keyed [`FieldMessages`].
//! 5. [`Schema`] (request role) and [`Response`] (response role) compose the
//!    above and expose a hook at every stage.
//!
//! ## Error Classes
//!
//! - [`SchemaError`]: fatal configuration problems (missing file, bad
//!   directory, malformed JSON). Returned as the outer `Err`.
//! - [`StructuredError`]: rejected data (422) or a schema the engine cannot
//!   compile (500). Returned as the inner [`Outcome`].
//!
//! [`FieldMessages`]: fastep_core::FieldMessages
//! [`StructuredError`]: fastep_core::StructuredError
//! [`Outcome`]: fastep_core::Outcome

pub mod config;
pub mod error;
pub mod format;
pub mod hooks;
mod pipeline;
pub mod policy;
pub mod request;
pub mod response;
pub mod rewrite;
pub mod shape;
pub mod source;
pub mod validator;

pub use config::{SchemaConfig, SchemaDraft};
pub use error::SchemaError;
pub use format::ErrorFormatter;
pub use hooks::{HookContext, SchemaRole};
pub use policy::{AdditionalPropertiesPolicy, PrimitiveType};
pub use request::Schema;
pub use response::Response;
pub use source::{LoadedSchema, SchemaReference, SchemaSearchPath, SchemaSource};
pub use validator::{InvalidSchema, JsonSchemaValidator, ValidationResult, Validator, Violation};
