//! # Request Validation
//!
//! [`Schema`] guards the request side of an endpoint. Data is checked, never
//! reshaped: on success the input value comes back, after the success
//! hook.

use std::path::PathBuf;
use std::sync::Arc;

use fastep_core::{Outcome, StructuredError};
use serde_json::Value;
use tracing::debug;

use crate::config::{SchemaConfig, SchemaDraft};
use crate::error::SchemaError;
use crate::hooks::{HookContext, SchemaRole};
use crate::pipeline::Stages;
use crate::source::{is_empty_schema, SchemaReference, SchemaSource};
use crate::validator::{ValidationResult, Validator};

/// Request-role orchestrator bound to one schema reference.
#[derive(Debug)]
pub struct Schema {
    source: SchemaSource,
    stages: Stages,
}

impl Schema {
    /// Orchestrator for `reference` with no search directories.
    pub fn new(reference: impl Into<SchemaReference>) -> Self {
        let source = SchemaSource::new(reference);
        let stages = Stages::new(SchemaRole::Request, source.reference());
        Self { source, stages }
    }

    /// Orchestrator configured with the directories and draft of `config`.
    pub fn from_config(
        reference: impl Into<SchemaReference>,
        config: &SchemaConfig,
    ) -> Result<Self, SchemaError> {
        let mut schema = Self::new(reference).with_draft(config.draft);
        if !config.schema_dirs.is_empty() {
            schema.append_schema_dirs(config.schema_dirs.iter().cloned())?;
        }
        Ok(schema)
    }

    /// Always [`SchemaRole::Request`].
    pub fn role(&self) -> SchemaRole {
        self.stages.role
    }

    /// The underlying source.
    pub fn source(&self) -> &SchemaSource {
        &self.source
    }

    /// Append one search directory. See [`SchemaSearchPath::append`](crate::SchemaSearchPath::append).
    pub fn append_schema_dir(&mut self, dir: impl Into<PathBuf>) -> Result<(), SchemaError> {
        self.source.append_schema_dirs([dir.into()])
    }

    /// Append several search directories at once; all or nothing.
    pub fn append_schema_dirs<I, P>(&mut self, dirs: I) -> Result<(), SchemaError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.source.append_schema_dirs(dirs)
    }

    /// Compile schemas with `draft`.
    pub fn with_draft(mut self, draft: SchemaDraft) -> Self {
        self.stages.draft = draft;
        self
    }

    /// Replace the default `jsonschema` engine.
    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.stages.validator = Some(validator);
        self
    }

    /// Load (once) and return the schema contents.
    pub fn get_contents(&mut self) -> Result<&Value, SchemaError> {
        self.source.get_contents()
    }

    /// Post-process the loaded contents.
    pub fn on_contents<F>(&mut self, handler: F)
    where
        F: Fn(Value, &SchemaReference) -> Value + Send + Sync + 'static,
    {
        self.source.on_contents(handler);
    }

    /// Replace the value that gets validated.
    pub fn on_validation_data<F>(&mut self, handler: F)
    where
        F: Fn(Value, &HookContext<'_>) -> Value + Send + Sync + 'static,
    {
        self.stages.hooks.validation_data.add(Box::new(handler));
    }

    /// Swap the validator per call.
    pub fn on_validator<F>(&mut self, handler: F)
    where
        F: Fn(Arc<dyn Validator>, &HookContext<'_>) -> Arc<dyn Validator> + Send + Sync + 'static,
    {
        self.stages.hooks.validator.add(Box::new(handler));
    }

    /// Override the validity verdict.
    pub fn on_is_valid<F>(&mut self, handler: F)
    where
        F: Fn(bool, &ValidationResult, &HookContext<'_>) -> bool + Send + Sync + 'static,
    {
        self.stages.hooks.is_valid.add(Box::new(handler));
    }

    /// Post-process accepted data.
    pub fn on_success<F>(&mut self, handler: F)
    where
        F: Fn(Value, &HookContext<'_>) -> Value + Send + Sync + 'static,
    {
        self.stages.hooks.on_success.add(Box::new(handler));
    }

    /// Post-process the `422` rejection.
    pub fn on_error<F>(&mut self, handler: F)
    where
        F: Fn(StructuredError, &ValidationResult, &HookContext<'_>) -> StructuredError
            + Send
            + Sync
            + 'static,
    {
        self.stages.hooks.on_error.add(Box::new(handler));
    }

    /// Validate request data.
    ///
    /// The outer `Err` is a fatal [`SchemaError`] (the schema could not be
    /// loaded). The inner [`Outcome`] is the data on success, a `422` when
    /// the data is rejected, or a `500` when the schema does not compile.
    /// An empty schema accepts anything without running the validator.
    pub fn validate(&mut self, data: Value) -> Result<Outcome, SchemaError> {
        let search_path = self.source.search_path().clone();
        let schema = self.source.get_contents()?;
        if is_empty_schema(schema) {
            debug!(schema = %self.stages.label, "empty request schema, skipping validation");
            return Ok(Ok(data));
        }

        let ctx = HookContext {
            role: SchemaRole::Request,
            request: None,
            data: &data,
        };
        let to_validate = self.stages.hooks.validation_data(data.clone(), &ctx);
        let validator = self.stages.validator(&search_path, &ctx);
        if let Err(error) = self.stages.judge(validator.as_ref(), &to_validate, schema, &ctx) {
            return Ok(Err(error));
        }
        Ok(Ok(self.stages.hooks.on_success(data.clone(), &ctx)))
    }
}
