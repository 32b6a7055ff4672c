//! # Response Shaping & Validation
//!
//! [`Response`] guards the response side of an endpoint. Each call to
//! [`Response::returns`] runs a linear pipeline; any stage may end it:
//!
//! 1. `is_to_validate` hook: `false` returns the data untouched.
//! 2. Load the schema; an empty schema returns the data untouched.
//! 3. `additional_properties` hook picks the policy, and the schema is
//!    rewritten with it (once per instance).
//! 4. `validation_data` hook picks the value, which is then stripped of the
//!    members the rewritten schema disallows.
//! 5. `validator` hook picks the validator, which runs on the stripped value.
//!    A schema that does not compile ends the call with a `500`.
//! 6. `is_valid` hook decides; a rejection is a `422` passed through
//!    `on_error`.
//! 7. `on_success` hook post-processes the stripped value, which is returned.

use std::path::PathBuf;
use std::sync::Arc;

use fastep_core::{Outcome, Request, StructuredError};
use serde_json::Value;
use tracing::debug;

use crate::config::{SchemaConfig, SchemaDraft};
use crate::error::SchemaError;
use crate::hooks::{HookContext, SchemaRole};
use crate::pipeline::Stages;
use crate::policy::AdditionalPropertiesPolicy;
use crate::shape::strip_additional_properties;
use crate::source::{is_empty_schema, SchemaReference, SchemaSource};
use crate::validator::{ValidationResult, Validator};

/// Response-role orchestrator bound to one schema reference.
#[derive(Debug)]
pub struct Response {
    source: SchemaSource,
    policy: AdditionalPropertiesPolicy,
    stages: Stages,
}

impl Response {
    /// Orchestrator for `reference` that strips undeclared members.
    pub fn new(reference: impl Into<SchemaReference>) -> Self {
        Self::with_policy(reference, AdditionalPropertiesPolicy::default())
    }

    /// Orchestrator for `reference` with an explicit policy.
    ///
    /// Mind the inverted flag: `AdditionalPropertiesPolicy::Remove(true)`
    /// removes undeclared members by writing `additionalProperties: false`.
    pub fn with_policy(
        reference: impl Into<SchemaReference>,
        policy: AdditionalPropertiesPolicy,
    ) -> Self {
        let source = SchemaSource::new(reference);
        let stages = Stages::new(SchemaRole::Response, source.reference());
        Self {
            source,
            policy,
            stages,
        }
    }

    /// Orchestrator configured with the directories, policy and draft of
    /// `config`.
    pub fn from_config(
        reference: impl Into<SchemaReference>,
        config: &SchemaConfig,
    ) -> Result<Self, SchemaError> {
        let mut response =
            Self::with_policy(reference, config.additional_properties).with_draft(config.draft);
        if !config.schema_dirs.is_empty() {
            response.append_schema_dirs(config.schema_dirs.iter().cloned())?;
        }
        Ok(response)
    }

    /// Always [`SchemaRole::Response`].
    pub fn role(&self) -> SchemaRole {
        self.stages.role
    }

    /// The policy passed at construction.
    pub fn policy(&self) -> AdditionalPropertiesPolicy {
        self.policy
    }

    /// The underlying source.
    pub fn source(&self) -> &SchemaSource {
        &self.source
    }

    /// Append one search directory.
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

    /// Load (once) and return the cached schema contents. Once a call to
    /// [`returns`](Self::returns) has reached the rewrite stage, this is the
    /// rewritten tree.
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

    /// Decide whether to validate at all.
    pub fn on_is_to_validate<F>(&mut self, handler: F)
    where
        F: Fn(bool, &HookContext<'_>) -> bool + Send + Sync + 'static,
    {
        self.stages.hooks.is_to_validate.add(Box::new(handler));
    }

    /// Override the additional-properties policy. Only the first call that
    /// reaches the rewrite stage has an effect on the cached schema.
    pub fn on_additional_properties<F>(&mut self, handler: F)
    where
        F: Fn(AdditionalPropertiesPolicy, &HookContext<'_>) -> AdditionalPropertiesPolicy
            + Send
            + Sync
            + 'static,
    {
        self.stages.hooks.additional_properties.add(Box::new(handler));
    }

    /// Replace the value that gets shaped and validated.
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

    /// Post-process the shaped response.
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

    /// Shape and validate response data for `request`.
    ///
    /// Error layering matches [`Schema::validate`](crate::Schema::validate).
    pub fn returns(&mut self, request: &Request, data: Value) -> Result<Outcome, SchemaError> {
        let ctx = HookContext {
            role: SchemaRole::Response,
            request: Some(request),
            data: &data,
        };
        if !self.stages.hooks.is_to_validate(&ctx) {
            debug!(schema = %self.stages.label, route = %request.route, "response validation skipped");
            return Ok(Ok(data));
        }

        let search_path = self.source.search_path().clone();
        if is_empty_schema(self.source.get_contents()?) {
            debug!(schema = %self.stages.label, "empty response schema, skipping validation");
            return Ok(Ok(data));
        }

        let policy = self.stages.hooks.policy(self.policy, &ctx);
        let schema = self.source.apply_additional_properties(&policy)?;

        let to_validate = self.stages.hooks.validation_data(data.clone(), &ctx);
        let shaped = strip_additional_properties(to_validate, schema);

        let validator = self.stages.validator(&search_path, &ctx);
        if let Err(error) = self.stages.judge(validator.as_ref(), &shaped, schema, &ctx) {
            return Ok(Err(error));
        }
        Ok(Ok(self.stages.hooks.on_success(shaped, &ctx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PrimitiveType;
    use fastep_core::{INTERNAL_SERVER_ERROR, UNPROCESSABLE_ENTITY};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn request() -> Request {
        Request::new("GET", "/users/1")
    }

    fn schema_a() -> Value {
        json!({"type": "object", "properties": {"a": {"type": "integer"}}})
    }

    #[test]
    fn test_default_policy_strips() {
        let mut response = Response::new(schema_a());
        let out = response.returns(&request(), json!({"a": 1, "b": 2})).unwrap().unwrap();
        assert_eq!(out, json!({"a": 1}));
    }

    #[test]
    fn test_type_policy_keeps_matching_members() {
        let policy = AdditionalPropertiesPolicy::OnlyType(PrimitiveType::String);
        let mut response = Response::with_policy(schema_a(), policy);
        let out = response
            .returns(&request(), json!({"a": 1, "b": "x", "c": 2}))
            .unwrap()
            .unwrap();
        assert_eq!(out, json!({"a": 1, "b": "x"}));
    }

    #[test]
    fn test_allow_and_unset_keep_everything() {
        for policy in [AdditionalPropertiesPolicy::Remove(false), AdditionalPropertiesPolicy::Unset] {
            let mut response = Response::with_policy(schema_a(), policy);
            let data = json!({"a": 1, "b": 2});
            assert_eq!(response.returns(&request(), data.clone()).unwrap().unwrap(), data);
        }
    }

    #[test]
    fn test_rejection_after_shaping() {
        let mut response = Response::new(schema_a());
        let err = response
            .returns(&request(), json!({"a": "one", "b": 2}))
            .unwrap()
            .unwrap_err();
        assert_eq!(err.status(), UNPROCESSABLE_ENTITY);
        assert_eq!(err.message, "The data (string) must match the type: integer");
        let paths: Vec<&str> = err.all_messages().unwrap().paths().collect();
        assert_eq!(paths, vec!["/a"]);
    }

    #[test]
    fn test_malformed_schema_is_server_error() {
        let mut response = Response::new(json!({"type": "object", "properties": {"a": {"type": 5}}}));
        let err = response.returns(&request(), json!({"a": 1})).unwrap().unwrap_err();
        assert_eq!(err.status(), INTERNAL_SERVER_ERROR);
        assert!(err.message.starts_with("Invalid response route schema "));
    }

    #[test]
    fn test_skip_hook_returns_data_untouched() {
        let mut response = Response::new(schema_a());
        response.on_is_to_validate(|_, ctx| ctx.request.map(|r| r.method != "GET").unwrap_or(true));
        let data = json!({"a": "wrong type", "b": 2});
        assert_eq!(response.returns(&request(), data.clone()).unwrap().unwrap(), data);
    }

    #[test]
    fn test_empty_schema_returns_data_untouched() {
        let mut response = Response::new(json!({}));
        let data = json!({"anything": [1, 2, 3]});
        assert_eq!(response.returns(&request(), data.clone()).unwrap().unwrap(), data);
    }

    #[test]
    fn test_policy_hook_and_single_rewrite() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let mut response = Response::new(schema_a());
        response.on_additional_properties(move |_, _| {
            seen.fetch_add(1, Ordering::SeqCst);
            AdditionalPropertiesPolicy::Remove(false)
        });

        let data = json!({"a": 1, "b": 2});
        assert_eq!(response.returns(&request(), data.clone()).unwrap().unwrap(), data);
        assert_eq!(response.returns(&request(), data.clone()).unwrap().unwrap(), data);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(response.source().loaded().is_some_and(|l| l.rewritten));
    }

    #[test]
    fn test_success_hook_sees_shaped_value() {
        let mut response = Response::new(schema_a());
        response.on_success(|mut shaped, ctx| {
            assert_eq!(ctx.data, &json!({"a": 1, "b": 2}));
            shaped["seen"] = json!(true);
            shaped
        });
        let out = response.returns(&request(), json!({"a": 1, "b": 2})).unwrap().unwrap();
        assert_eq!(out, json!({"a": 1, "seen": true}));
    }

    struct AcceptAll;

    impl Validator for AcceptAll {
        fn validate(
            &self,
            _: &Value,
            _: &Value,
        ) -> Result<ValidationResult, crate::validator::InvalidSchema> {
            Ok(ValidationResult::valid())
        }
    }

    #[test]
    fn test_validator_hook_swaps_engine() {
        let mut response = Response::new(schema_a());
        response.on_validator(|_, ctx| -> Arc<dyn Validator> {
            assert_eq!(ctx.role, SchemaRole::Response);
            Arc::new(AcceptAll)
        });
        let out = response
            .returns(&request(), json!({"a": "s", "b": 1}))
            .unwrap()
            .unwrap();
        assert_eq!(out, json!({"a": "s"}));
    }

    #[test]
    fn test_is_valid_hook_forces_pass() {
        let mut response = Response::new(schema_a());
        response.on_is_valid(|valid, result, _| {
            assert!(!valid);
            assert!(!result.is_valid());
            true
        });
        let out = response
            .returns(&request(), json!({"a": "s", "b": 1}))
            .unwrap()
            .unwrap();
        assert_eq!(out, json!({"a": "s"}));
    }

    #[test]
    fn test_error_hook_rewrites_rejection() {
        let mut response = Response::new(schema_a());
        response.on_error(|mut error, result, ctx| {
            assert_eq!(result.violations().len(), 1);
            assert_eq!(ctx.request.map(|r| r.route.as_str()), Some("/users/1"));
            error.code = 400;
            error
        });
        let err = response
            .returns(&request(), json!({"a": "s"}))
            .unwrap()
            .unwrap_err();
        assert_eq!(err.code, 400);
        assert_eq!(err.status(), UNPROCESSABLE_ENTITY);
        assert_eq!(err.message, "The data (string) must match the type: integer");
    }

    #[test]
    fn test_get_contents_reflects_rewrite() {
        let mut response = Response::new(schema_a());
        assert!(response.get_contents().unwrap().get("additionalProperties").is_none());
        response.returns(&request(), json!({"a": 1})).unwrap().unwrap();
        assert_eq!(
            response.get_contents().unwrap()["additionalProperties"],
            json!(false)
        );
    }

    #[test]
    fn test_validation_data_hook_replaces_input() {
        let mut response = Response::new(schema_a());
        response.on_validation_data(|data, _| data["inner"].clone());
        let out = response
            .returns(&request(), json!({"inner": {"a": 7, "z": 0}}))
            .unwrap()
            .unwrap();
        assert_eq!(out, json!({"a": 7}));
    }
}
