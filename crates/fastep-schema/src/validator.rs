//! # Validation Engine
//!
//! [`Validator`] is the seam between the orchestrators and a JSON Schema
//! engine. The default implementation, [`JsonSchemaValidator`], compiles the
//! schema with the `jsonschema` crate on every call and reports each failure
//! as a [`Violation`] carrying enough context (keyword, offending value,
//! constraint) for [`ErrorFormatter`](crate::ErrorFormatter) to word it.
//!
//! ## Two Failure Classes
//!
//! - The data breaks the schema: `Ok(ValidationResult)` with violations.
//! - The schema itself does not compile: `Err(InvalidSchema)`.
//!
//! ## Schema References
//!
//! Relative `$ref`s (for example `"Shared/Id.json"`) are resolved through the
//! same [`SchemaSearchPath`] used for the root schema. Nothing is fetched over
//! the network.

use std::borrow::Cow;
use std::fmt;
use std::path::Path;

use jsonschema::{Retrieve, Uri};
use serde_json::Value;
use thiserror::Error;

use crate::config::SchemaDraft;
use crate::shape::is_declared;
use crate::source::SchemaSearchPath;

/// URI prefixes stripped from `$ref` targets before resolving them on disk.
const LOCAL_URI_PREFIXES: [&str; 2] = ["json-schema:///", "file://"];

/// The schema could not be compiled.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{reason}")]
pub struct InvalidSchema {
    /// Engine error text.
    pub reason: String,
}

/// A single failed constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// JSON Pointer to the failing value in the data (`""` for the root).
    pub instance_path: String,
    /// JSON Pointer to the failing keyword in the schema.
    pub schema_path: String,
    /// The failing keyword, e.g. `maximum`.
    pub keyword: String,
    /// The failing value.
    pub instance: Value,
    /// The keyword's value in the schema, when it could be located.
    pub constraint: Option<Value>,
    /// Property names involved: missing for `required`, unexpected for
    /// `additionalProperties`.
    pub properties: Vec<String>,
    /// Engine error text.
    pub message: String,
    /// Per-branch failures for `anyOf` / `oneOf`.
    pub causes: Vec<Violation>,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.instance_path, self.message)
        }
    }
}

/// Outcome of running a validator: empty when the data is valid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    violations: Vec<Violation>,
}

impl ValidationResult {
    /// A passing result.
    pub fn valid() -> Self {
        Self::default()
    }

    /// A result holding the given violations.
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// True when nothing failed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Top-level violations in engine order.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

/// Validates data against a schema document.
pub trait Validator: Send + Sync {
    /// Check `data` against `schema`.
    fn validate(&self, data: &Value, schema: &Value) -> Result<ValidationResult, InvalidSchema>;
}

/// [`Validator`] backed by the `jsonschema` crate.
#[derive(Debug, Clone, Default)]
pub struct JsonSchemaValidator {
    draft: SchemaDraft,
    search_path: SchemaSearchPath,
}

impl JsonSchemaValidator {
    /// Validator for the default draft with no `$ref` search directories.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific draft.
    pub fn with_draft(mut self, draft: SchemaDraft) -> Self {
        self.draft = draft;
        self
    }

    /// Resolve relative `$ref`s against these directories.
    pub fn with_search_path(mut self, search_path: SchemaSearchPath) -> Self {
        self.search_path = search_path;
        self
    }

    fn compile(&self, schema: &Value) -> Result<jsonschema::Validator, InvalidSchema> {
        let mut opts = jsonschema::options();
        opts.with_draft(self.draft.engine());
        opts.with_retriever(SearchPathRetriever {
            search_path: self.search_path.clone(),
        });
        opts.build(schema).map_err(|e| InvalidSchema {
            reason: e.to_string(),
        })
    }

    fn collect(
        &self,
        compiled: &jsonschema::Validator,
        data: &Value,
        schema: &Value,
        instance_base: &str,
        schema_base: &str,
    ) -> Vec<Violation> {
        compiled
            .iter_errors(data)
            .map(|e| {
                let local_schema_path = e.schema_path.to_string();
                let local_instance_path = e.instance_path.to_string();
                let instance = e.instance.clone().into_owned();
                let keyword = last_segment(&local_schema_path);
                let constraint = self.locate(schema, &local_schema_path);
                let parent = local_schema_path
                    .rsplit_once('/')
                    .and_then(|(parent, _)| self.locate(schema, parent));
                let properties =
                    involved_properties(&keyword, &instance, constraint.as_ref(), parent.as_ref());
                let mut violation = Violation {
                    instance_path: format!("{instance_base}{local_instance_path}"),
                    schema_path: format!("{schema_base}{local_schema_path}"),
                    keyword,
                    instance,
                    constraint,
                    properties,
                    message: e.to_string(),
                    causes: Vec::new(),
                };
                violation.causes = self.branch_causes(&violation);
                violation
            })
            .collect()
    }

    /// The schema node at `pointer`, following `$ref` segments into local
    /// definitions and search-path files.
    fn locate(&self, root: &Value, pointer: &str) -> Option<Value> {
        let mut current: Cow<'_, Value> = Cow::Borrowed(root);
        for raw in pointer.split('/').skip(1) {
            let segment = unescape(raw);
            let next = if segment == "$ref" {
                let target = current.get("$ref")?.as_str()?;
                Cow::Owned(self.dereference(root, target)?)
            } else {
                match current {
                    Cow::Borrowed(node) => Cow::Borrowed(child(node, &segment)?),
                    Cow::Owned(node) => Cow::Owned(child(&node, &segment)?.clone()),
                }
            };
            current = next;
        }
        Some(current.into_owned())
    }

    fn dereference(&self, root: &Value, target: &str) -> Option<Value> {
        let (file, fragment) = target.split_once('#').unwrap_or((target, ""));
        let document = if file.is_empty() {
            root.clone()
        } else {
            let path = self.search_path.resolve(Path::new(file)).ok()?;
            serde_json::from_str(&std::fs::read_to_string(path).ok()?).ok()?
        };
        document.pointer(fragment).cloned()
    }

    /// Validate the instance against each `anyOf`/`oneOf` branch on its own
    /// so the formatter can report per-branch failures. Branches that do not
    /// compile standalone (local `$ref`s, for instance) leave the combinator
    /// reported as a single failure.
    fn branch_causes(&self, violation: &Violation) -> Vec<Violation> {
        if violation.keyword != "anyOf" && violation.keyword != "oneOf" {
            return Vec::new();
        }
        let Some(Value::Array(branches)) = &violation.constraint else {
            return Vec::new();
        };

        let mut causes = Vec::new();
        for (i, branch) in branches.iter().enumerate() {
            let Ok(compiled) = self.compile(branch) else {
                return Vec::new();
            };
            let schema_base = format!("{}/{i}", violation.schema_path);
            causes.extend(self.collect(
                &compiled,
                &violation.instance,
                branch,
                &violation.instance_path,
                &schema_base,
            ));
        }
        causes
    }
}

impl Validator for JsonSchemaValidator {
    fn validate(&self, data: &Value, schema: &Value) -> Result<ValidationResult, InvalidSchema> {
        let compiled = self.compile(schema)?;
        Ok(ValidationResult::from_violations(
            self.collect(&compiled, data, schema, "", ""),
        ))
    }
}

/// Resolves `$ref` URIs to files in the search path.
struct SearchPathRetriever {
    search_path: SchemaSearchPath,
}

impl Retrieve for SearchPathRetriever {
    fn retrieve(&self, uri: &Uri<&str>) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        let name = LOCAL_URI_PREFIXES
            .iter()
            .find_map(|prefix| uri_str.strip_prefix(prefix))
            .ok_or_else(|| format!("refusing to retrieve remote schema: {uri_str}"))?;

        let path = self.search_path.resolve(Path::new(name))?;
        let text = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

fn last_segment(pointer: &str) -> String {
    unescape(pointer.rsplit('/').next().unwrap_or_default())
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

fn child<'v>(node: &'v Value, segment: &str) -> Option<&'v Value> {
    match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => items.get(segment.parse::<usize>().ok()?),
        _ => None,
    }
}

fn involved_properties(
    keyword: &str,
    instance: &Value,
    constraint: Option<&Value>,
    parent: Option<&Value>,
) -> Vec<String> {
    let Value::Object(members) = instance else {
        return Vec::new();
    };
    match keyword {
        "required" => constraint
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .filter(|name| !members.contains_key(*name))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        "additionalProperties" => match parent.and_then(Value::as_object) {
            Some(node) => members
                .keys()
                .filter(|key| !is_declared(key, node))
                .cloned()
                .collect(),
            None => Vec::new(),
        },
        _ => Vec::new(),
    }
}
