//! # Endpoint
//!
//! See the crate docs for the stage order.

use std::fmt;
use std::path::PathBuf;

use fastep_core::{Filter, Outcome, Request, StructuredError};
use fastep_schema::{AdditionalPropertiesPolicy, Response, Schema, SchemaError, SchemaReference};
use serde_json::Value;
use tracing::debug;

/// Status returned when a permission gate refuses the request.
pub const FORBIDDEN: u16 = 403;

/// Message returned when a permission gate refuses the request.
pub const NOT_ENOUGH_PERMISSIONS: &str = "Not enough permissions";

/// Produces the response data for a request.
pub type Handler = dyn Fn(&Request) -> Result<Value, StructuredError> + Send + Sync;
/// Decides whether the request may proceed.
pub type Permission = dyn Fn(&Request) -> bool + Send + Sync;
/// Inspects or amends the request before the handler runs.
pub type Middleware = dyn Fn(&mut Request) -> Result<(), StructuredError> + Send + Sync;
/// Transforms the response data after the handler (and response shaping).
pub type PostHandler = dyn Fn(&Request, Value) -> Result<Value, StructuredError> + Send + Sync;

/// A handler plus everything that runs around it.
pub struct Endpoint {
    method: String,
    route: String,
    handler: Box<Handler>,
    permissions: Filter<Permission>,
    schema: Option<Schema>,
    middleware: Filter<Middleware>,
    response: Option<Response>,
    post_handlers: Filter<PostHandler>,
}

impl Endpoint {
    /// Endpoint answering `method` on `route` with `handler`.
    pub fn new<F>(method: impl Into<String>, route: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Request) -> Result<Value, StructuredError> + Send + Sync + 'static,
    {
        Self {
            method: method.into().to_ascii_uppercase(),
            route: route.into(),
            handler: Box::new(handler),
            permissions: Filter::new(),
            schema: None,
            middleware: Filter::new(),
            response: None,
            post_handlers: Filter::new(),
        }
    }

    /// HTTP method, upper-case.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Route pattern as given.
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Validate request parameters against `reference`.
    pub fn schema(mut self, reference: impl Into<SchemaReference>) -> Self {
        self.schema = Some(Schema::new(reference));
        self
    }

    /// Shape and validate response data against `reference`, stripping
    /// undeclared members.
    pub fn returns(self, reference: impl Into<SchemaReference>) -> Self {
        self.returns_with_policy(reference, AdditionalPropertiesPolicy::default())
    }

    /// Shape and validate response data with an explicit policy.
    pub fn returns_with_policy(
        mut self,
        reference: impl Into<SchemaReference>,
        policy: AdditionalPropertiesPolicy,
    ) -> Self {
        self.response = Some(Response::with_policy(reference, policy));
        self
    }

    /// Add a permission gate. Every gate must allow the request.
    pub fn permission<F>(mut self, gate: F) -> Self
    where
        F: Fn(&Request) -> bool + Send + Sync + 'static,
    {
        self.permissions.add(Box::new(gate));
        self
    }

    /// Add middleware, run after request validation.
    pub fn middleware<F>(mut self, middleware: F) -> Self
    where
        F: Fn(&mut Request) -> Result<(), StructuredError> + Send + Sync + 'static,
    {
        self.middleware.add(Box::new(middleware));
        self
    }

    /// Add a post handler, run after response shaping.
    pub fn on_response<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Request, Value) -> Result<Value, StructuredError> + Send + Sync + 'static,
    {
        self.post_handlers.add(Box::new(handler));
        self
    }

    /// The request-role orchestrator, for registering hooks.
    pub fn schema_mut(&mut self) -> Option<&mut Schema> {
        self.schema.as_mut()
    }

    /// The response-role orchestrator, for registering hooks.
    pub fn response_mut(&mut self) -> Option<&mut Response> {
        self.response.as_mut()
    }

    /// Append search directories to both attached orchestrators.
    pub fn append_schema_dirs<I, P>(&mut self, dirs: I) -> Result<(), SchemaError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let dirs: Vec<PathBuf> = dirs.into_iter().map(Into::into).collect();
        if let Some(schema) = self.schema.as_mut() {
            schema.append_schema_dirs(dirs.iter().cloned())?;
        }
        if let Some(response) = self.response.as_mut() {
            response.append_schema_dirs(dirs)?;
        }
        Ok(())
    }

    /// Run the endpoint for `request`.
    ///
    /// Request validation replaces the request parameters with the validated
    /// value when it is an object.
    pub fn call(&mut self, mut request: Request) -> Result<Outcome, SchemaError> {
        if !self.permissions.iter().all(|gate| gate(&request)) {
            debug!(route = %self.route, "permission denied");
            return Ok(Err(StructuredError::new(FORBIDDEN, NOT_ENOUGH_PERMISSIONS)));
        }

        if let Some(schema) = self.schema.as_mut() {
            match schema.validate(request.params_value())? {
                Ok(Value::Object(params)) => request.params = params,
                Ok(_) => {}
                Err(error) => return Ok(Err(error)),
            }
        }

        for middleware in self.middleware.iter() {
            if let Err(error) = middleware(&mut request) {
                return Ok(Err(error));
            }
        }

        let mut data = match (self.handler)(&request) {
            Ok(data) => data,
            Err(error) => return Ok(Err(error)),
        };

        if let Some(response) = self.response.as_mut() {
            data = match response.returns(&request, data)? {
                Ok(shaped) => shaped,
                Err(error) => return Ok(Err(error)),
            };
        }

        for post in self.post_handlers.iter() {
            data = match post(&request, data) {
                Ok(next) => next,
                Err(error) => return Ok(Err(error)),
            };
        }
        Ok(Ok(data))
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("method", &self.method)
            .field("route", &self.route)
            .field("permissions", &self.permissions)
            .field("schema", &self.schema)
            .field("middleware", &self.middleware)
            .field("response", &self.response)
            .field("post_handlers", &self.post_handlers)
            .finish()
    }
}
