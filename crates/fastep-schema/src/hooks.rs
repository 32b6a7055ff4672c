//! # Pipeline Hooks
//!
//! Every stage of [`Schema::validate`](crate::Schema::validate) and
//! [`Response::returns`](crate::Response::returns) threads its value through
//! an ordered [`Filter`] owned by the orchestrator. Handlers receive the
//! current value plus a [`HookContext`] and return the replacement.

use std::fmt;
use std::sync::Arc;

use fastep_core::{Filter, Request, StructuredError};
use serde_json::Value;

use crate::policy::AdditionalPropertiesPolicy;
use crate::validator::{ValidationResult, Validator};

/// Which side of an endpoint an orchestrator guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaRole {
    /// Validates incoming request data.
    Request,
    /// Shapes and validates outgoing response data.
    Response,
}

impl fmt::Display for SchemaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request => f.write_str("request"),
            Self::Response => f.write_str("response"),
        }
    }
}

/// Arguments available to every hook.
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    /// Role of the orchestrator running the hook.
    pub role: SchemaRole,
    /// The inbound request (response role only).
    pub request: Option<&'a Request>,
    /// The data handed to the orchestrator, before any hook ran.
    pub data: &'a Value,
}

/// Replaces a JSON value.
pub type ValueHook = dyn Fn(Value, &HookContext<'_>) -> Value + Send + Sync;
/// Overrides a yes/no decision.
pub type FlagHook = dyn Fn(bool, &HookContext<'_>) -> bool + Send + Sync;
/// Overrides the additional-properties policy.
pub type PolicyHook =
    dyn Fn(AdditionalPropertiesPolicy, &HookContext<'_>) -> AdditionalPropertiesPolicy + Send + Sync;
/// Swaps the validator.
pub type ValidatorHook =
    dyn Fn(Arc<dyn Validator>, &HookContext<'_>) -> Arc<dyn Validator> + Send + Sync;
/// Overrides the validity verdict.
pub type VerdictHook = dyn Fn(bool, &ValidationResult, &HookContext<'_>) -> bool + Send + Sync;
/// Rewrites the rejection error.
pub type ErrorHook =
    dyn Fn(StructuredError, &ValidationResult, &HookContext<'_>) -> StructuredError + Send + Sync;

/// The hook chains of one orchestrator.
#[derive(Debug, Default)]
pub(crate) struct Hooks {
    pub(crate) is_to_validate: Filter<FlagHook>,
    pub(crate) additional_properties: Filter<PolicyHook>,
    pub(crate) validation_data: Filter<ValueHook>,
    pub(crate) validator: Filter<ValidatorHook>,
    pub(crate) is_valid: Filter<VerdictHook>,
    pub(crate) on_success: Filter<ValueHook>,
    pub(crate) on_error: Filter<ErrorHook>,
}

impl Hooks {
    pub(crate) fn is_to_validate(&self, ctx: &HookContext<'_>) -> bool {
        self.is_to_validate.iter().fold(true, |acc, h| h(acc, ctx))
    }

    pub(crate) fn policy(
        &self,
        policy: AdditionalPropertiesPolicy,
        ctx: &HookContext<'_>,
    ) -> AdditionalPropertiesPolicy {
        self.additional_properties.iter().fold(policy, |acc, h| h(acc, ctx))
    }

    pub(crate) fn validation_data(&self, data: Value, ctx: &HookContext<'_>) -> Value {
        self.validation_data.iter().fold(data, |acc, h| h(acc, ctx))
    }

    pub(crate) fn validator(
        &self,
        validator: Arc<dyn Validator>,
        ctx: &HookContext<'_>,
    ) -> Arc<dyn Validator> {
        self.validator.iter().fold(validator, |acc, h| h(acc, ctx))
    }

    pub(crate) fn is_valid(&self, result: &ValidationResult, ctx: &HookContext<'_>) -> bool {
        self.is_valid
            .iter()
            .fold(result.is_valid(), |acc, h| h(acc, result, ctx))
    }

    pub(crate) fn on_success(&self, data: Value, ctx: &HookContext<'_>) -> Value {
        self.on_success.iter().fold(data, |acc, h| h(acc, ctx))
    }

    pub(crate) fn on_error(
        &self,
        error: StructuredError,
        result: &ValidationResult,
        ctx: &HookContext<'_>,
    ) -> StructuredError {
        self.on_error.iter().fold(error, |acc, h| h(acc, result, ctx))
    }
}
