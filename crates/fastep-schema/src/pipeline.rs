//! Stages shared by the request and response orchestrators: picking the
//! validator, running it, and turning its verdict into an outcome.

use std::fmt;
use std::sync::Arc;

use fastep_core::StructuredError;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::SchemaDraft;
use crate::format::ErrorFormatter;
use crate::hooks::{HookContext, Hooks, SchemaRole};
use crate::source::{SchemaReference, SchemaSearchPath};
use crate::validator::{JsonSchemaValidator, Validator};

pub(crate) struct Stages {
    pub(crate) role: SchemaRole,
    pub(crate) label: String,
    pub(crate) draft: SchemaDraft,
    pub(crate) validator: Option<Arc<dyn Validator>>,
    pub(crate) formatter: ErrorFormatter,
    pub(crate) hooks: Hooks,
}

impl Stages {
    pub(crate) fn new(role: SchemaRole, reference: &SchemaReference) -> Self {
        Self {
            role,
            label: reference.to_string(),
            draft: SchemaDraft::default(),
            validator: None,
            formatter: ErrorFormatter::new(),
            hooks: Hooks::default(),
        }
    }

    /// The configured validator (or a fresh engine bound to `search_path`),
    /// passed through the validator hook.
    pub(crate) fn validator(
        &self,
        search_path: &SchemaSearchPath,
        ctx: &HookContext<'_>,
    ) -> Arc<dyn Validator> {
        let base: Arc<dyn Validator> = match &self.validator {
            Some(validator) => Arc::clone(validator),
            None => Arc::new(
                JsonSchemaValidator::new()
                    .with_draft(self.draft)
                    .with_search_path(search_path.clone()),
            ),
        };
        self.hooks.validator(base, ctx)
    }

    /// Run `validator` and apply the is-valid and error hooks.
    ///
    /// A schema the engine cannot compile yields a `500` without consulting
    /// the hooks; rejected data yields a `422` passed through `on_error`.
    pub(crate) fn judge(
        &self,
        validator: &dyn Validator,
        data: &Value,
        schema: &Value,
        ctx: &HookContext<'_>,
    ) -> Result<(), StructuredError> {
        let result = match validator.validate(data, schema) {
            Ok(result) => result,
            Err(e) => {
                warn!(schema = %self.label, role = %self.role, error = %e, "malformed route schema");
                return Err(StructuredError::internal(format!(
                    "Invalid {} route schema {e}",
                    self.role
                )));
            }
        };

        if self.hooks.is_valid(&result, ctx) {
            return Ok(());
        }

        let messages = self.formatter.format(&result);
        debug!(
            schema = %self.label,
            role = %self.role,
            failing_paths = messages.len(),
            "data rejected"
        );
        let error = StructuredError::unprocessable(messages);
        Err(self.hooks.on_error(error, &result, ctx))
    }
}

impl fmt::Debug for Stages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stages")
            .field("role", &self.role)
            .field("label", &self.label)
            .field("draft", &self.draft)
            .field("custom_validator", &self.validator.is_some())
            .field("hooks", &self.hooks)
            .finish()
    }
}
