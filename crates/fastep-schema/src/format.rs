//! # Error Formatting
//!
//! Flattens a [`ValidationResult`] into [`FieldMessages`] keyed by the JSON
//! Pointer of the failing value (`/` for the root). Combinator failures
//! (`anyOf`, `oneOf`) are replaced by the failures of their branches, so a
//! single violation can surface under several keys. Keys appear in the
//! order the engine reported them.

use fastep_core::FieldMessages;
use serde_json::Value;

use crate::policy::PrimitiveType;
use crate::validator::{ValidationResult, Violation};

/// Key used for violations at the root of the data.
pub const ROOT_KEY: &str = "/";

/// Turns violations into user-facing messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorFormatter;

impl ErrorFormatter {
    /// Create a formatter.
    pub fn new() -> Self {
        Self
    }

    /// Keyed messages for every leaf violation.
    pub fn format(&self, result: &ValidationResult) -> FieldMessages {
        let mut messages = FieldMessages::new();
        for violation in result.violations() {
            self.push_leaves(violation, &mut messages);
        }
        messages
    }

    fn push_leaves(&self, violation: &Violation, messages: &mut FieldMessages) {
        if violation.causes.is_empty() {
            messages.push(key_for(&violation.instance_path), self.message(violation));
            return;
        }
        for cause in &violation.causes {
            self.push_leaves(cause, messages);
        }
    }

    /// The message for one violation, falling back to the engine's text for
    /// keywords without a dedicated wording.
    pub fn message(&self, violation: &Violation) -> String {
        let constraint = violation.constraint.as_ref();
        let instance = &violation.instance;
        let worded = match (violation.keyword.as_str(), constraint) {
            ("type", Some(expected)) => Some(format!(
                "The data ({}) must match the type: {}",
                PrimitiveType::of(instance),
                type_list(expected)
            )),
            ("maximum", Some(max)) if max.is_number() => {
                Some(format!("Number must be lower than or equal to {max}"))
            }
            ("minimum", Some(min)) if min.is_number() => {
                Some(format!("Number must be greater than or equal to {min}"))
            }
            ("exclusiveMaximum", Some(max)) if max.is_number() => {
                Some(format!("Number must be lower than {max}"))
            }
            ("exclusiveMinimum", Some(min)) if min.is_number() => {
                Some(format!("Number must be greater than {min}"))
            }
            ("multipleOf", Some(n)) => Some(format!("Number must be a multiple of {n}")),
            ("minLength", Some(min)) => instance.as_str().map(|s| {
                format!("Minimum string length is {min}, found {}", s.chars().count())
            }),
            ("maxLength", Some(max)) => instance.as_str().map(|s| {
                format!("Maximum string length is {max}, found {}", s.chars().count())
            }),
            ("pattern", Some(Value::String(pattern))) => {
                Some(format!("The string should match pattern: {pattern}"))
            }
            ("format", Some(Value::String(format))) => {
                Some(format!("The data must match the '{format}' format"))
            }
            ("enum", _) => Some("The data should match one item from enum".to_string()),
            ("const", _) => Some("The data must match the const value".to_string()),
            ("required", _) if !violation.properties.is_empty() => Some(format!(
                "The required properties ({}) are missing",
                violation.properties.join(", ")
            )),
            ("additionalProperties", _) if !violation.properties.is_empty() => Some(format!(
                "Additional object properties are not allowed: {}",
                violation.properties.join(", ")
            )),
            ("minItems", Some(min)) => instance.as_array().map(|items| {
                format!("Array should have at least {min} items, {} found", items.len())
            }),
            ("maxItems", Some(max)) => instance.as_array().map(|items| {
                format!("Array should have at most {max} items, {} found", items.len())
            }),
            ("uniqueItems", _) => Some("Array must have unique items".to_string()),
            ("minProperties", Some(min)) => instance.as_object().map(|members| {
                format!("Object must have at least {min} properties, {} found", members.len())
            }),
            ("maxProperties", Some(max)) => instance.as_object().map(|members| {
                format!("Object must have at most {max} properties, {} found", members.len())
            }),
            ("anyOf", _) => Some("The data should match at least one schema".to_string()),
            ("oneOf", _) => Some("The data should match exactly one schema".to_string()),
            ("not", _) => Some("The data must not match the schema".to_string()),
            ("contains", _) => Some("At least one array item must match schema".to_string()),
            _ => None,
        };
        worded.unwrap_or_else(|| violation.message.clone())
    }
}

fn key_for(instance_path: &str) -> String {
    if instance_path.is_empty() {
        ROOT_KEY.to_string()
    } else {
        instance_path.to_string()
    }
}

fn type_list(expected: &Value) -> String {
    match expected {
        Value::String(name) => name.clone(),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::{JsonSchemaValidator, Validator};
    use serde_json::json;

    fn messages(data: Value, schema: Value) -> FieldMessages {
        let result = JsonSchemaValidator::new().validate(&data, &schema).unwrap();
        ErrorFormatter::new().format(&result)
    }

    #[test]
    fn test_root_key_and_maximum_wording() {
        let out = messages(json!(257.89), json!({"type": "number", "maximum": 1}));
        assert_eq!(out.paths().collect::<Vec<_>>(), vec!["/"]);
        assert_eq!(out.first_message(), Some("Number must be lower than or equal to 1"));
    }

    #[test]
    fn test_type_wording() {
        let out = messages(json!("10"), json!({"type": "integer"}));
        assert_eq!(
            out.get("/").unwrap(),
            &["The data (string) must match the type: integer".to_string()]
        );
        let out = messages(json!(true), json!({"type": ["string", "null"]}));
        assert_eq!(
            out.first_message(),
            Some("The data (boolean) must match the type: string, null")
        );
    }

    #[test]
    fn test_nested_keys_in_engine_order() {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "minLength": 3},
                "tags": {"type": "array", "maxItems": 1}
            },
            "required": ["id"]
        });
        let out = messages(json!({"name": "ab", "tags": [1, 2]}), schema);
        assert_eq!(out.len(), 3);
        assert_eq!(
            out.get("/name").unwrap(),
            &["Minimum string length is 3, found 2".to_string()]
        );
        assert_eq!(
            out.get("/tags").unwrap(),
            &["Array should have at most 1 items, 2 found".to_string()]
        );
        assert_eq!(
            out.get("/").unwrap(),
            &["The required properties (id) are missing".to_string()]
        );
    }

    #[test]
    fn test_additional_properties_wording() {
        let schema = json!({"type": "object", "properties": {}, "additionalProperties": false});
        let out = messages(json!({"x": 1}), schema);
        assert_eq!(
            out.first_message(),
            Some("Additional object properties are not allowed: x")
        );
    }

    #[test]
    fn test_any_of_reports_branch_failures() {
        let schema = json!({"anyOf": [{"type": "string"}, {"type": "integer", "minimum": 10}]});
        let out = messages(json!(3), schema);
        let root = out.get("/").unwrap();
        assert_eq!(root.len(), 2);
        assert_eq!(root[0], "The data (integer) must match the type: string");
        assert_eq!(root[1], "Number must be greater than or equal to 10");
    }

    #[test]
    fn test_unknown_keyword_falls_back_to_engine_message() {
        let violation = Violation {
            instance_path: "/a".into(),
            schema_path: "/properties/a/dependentRequired".into(),
            keyword: "dependentRequired".into(),
            instance: json!({}),
            constraint: None,
            properties: Vec::new(),
            message: "engine says no".into(),
            causes: Vec::new(),
        };
        assert_eq!(ErrorFormatter::new().message(&violation), "engine says no");
    }
}
