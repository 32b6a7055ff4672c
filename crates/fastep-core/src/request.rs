//! # Request Context
//!
//! The slice of an inbound REST request the schema pipeline needs: method,
//! route, and the merged parameter bag (URL, query and JSON body params).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Inbound request as seen by validation and response shaping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// HTTP method, upper-case.
    pub method: String,
    /// Matched route, e.g. `/my-posts/v1/42`.
    pub route: String,
    /// Merged request parameters.
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl Request {
    /// Create a request without parameters.
    pub fn new(method: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            route: route.into(),
            params: Map::new(),
        }
    }

    /// Set a single parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    /// Merge every member of a JSON object into the parameters. Non-object
    /// values are ignored.
    pub fn with_params(mut self, params: Value) -> Self {
        if let Value::Object(map) = params {
            self.params.extend(map);
        }
        self
    }

    /// Look up a parameter.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// True when the parameter is present.
    pub fn has_param(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// The parameters as a JSON object value.
    pub fn params_value(&self) -> Value {
        Value::Object(self.params.clone())
    }
}
