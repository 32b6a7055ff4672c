//! # Response Shaping
//!
//! Walks response data alongside its (rewritten) schema and drops the object
//! members the schema does not allow, so that validation of a stripped
//! response cannot fail on `additionalProperties` and the caller never sees
//! fields outside the contract.
//!
//! A member is declared when it is listed under `properties` or matches one
//! of the `patternProperties` regexes. Undeclared members follow the node's
//! `additionalProperties`:
//!
//! | constraint | member |
//! |---|---|
//! | absent or `true` | kept |
//! | `false` | dropped |
//! | `{"type": T}` | kept only when its value is of type `T` |
//!
//! Declared members that are missing but carry a `default` are filled in.
//! `patternProperties` regexes that use ECMA-only syntax such as lookahead
//! cannot be compiled here; they declare nothing and a warning is logged.
//! Array data descends through `items`.

use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

use crate::policy::PrimitiveType;

/// Return `data` with every member disallowed by `schema` removed.
pub fn strip_additional_properties(data: Value, schema: &Value) -> Value {
    let Value::Object(node) = schema else {
        return data;
    };
    match data {
        Value::Object(members) => Value::Object(shape_object(members, node)),
        Value::Array(items) => Value::Array(shape_items(items, node)),
        other => other,
    }
}

fn shape_object(members: Map<String, Value>, schema: &Map<String, Value>) -> Map<String, Value> {
    let properties = schema.get("properties").and_then(Value::as_object);
    let additional = schema.get("additionalProperties");
    let mut out = Map::with_capacity(members.len());

    for (key, value) in members {
        if let Some(sub) = properties.and_then(|p| p.get(&key)) {
            out.insert(key, strip_additional_properties(value, sub));
        } else if let Some(sub) = matching_pattern(&key, schema) {
            out.insert(key, strip_additional_properties(value, sub));
        } else {
            match additional {
                None | Some(Value::Bool(true)) => {
                    out.insert(key, value);
                }
                Some(Value::Bool(false)) => {}
                Some(constraint) => {
                    if allowed_type(constraint, &value) {
                        let shaped = strip_additional_properties(value, constraint);
                        out.insert(key, shaped);
                    }
                }
            }
        }
    }

    if let Some(properties) = properties {
        for (key, sub) in properties {
            if out.contains_key(key) {
                continue;
            }
            if let Some(default) = sub.get("default") {
                out.insert(key.clone(), default.clone());
            }
        }
    }
    out
}

fn shape_items(items: Vec<Value>, schema: &Map<String, Value>) -> Vec<Value> {
    match schema.get("items") {
        Some(Value::Array(tuple)) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match tuple.get(i) {
                Some(sub) => strip_additional_properties(item, sub),
                None => item,
            })
            .collect(),
        Some(sub) => items
            .into_iter()
            .map(|item| strip_additional_properties(item, sub))
            .collect(),
        None => items,
    }
}

fn matching_pattern<'s>(key: &str, schema: &'s Map<String, Value>) -> Option<&'s Value> {
    schema
        .get("patternProperties")?
        .as_object()?
        .iter()
        .find(|(pattern, _)| pattern_matches(pattern, key))
        .map(|(_, sub)| sub)
}

/// A pattern the `regex` crate cannot compile (lookaround, backreferences)
/// declares nothing.
fn pattern_matches(pattern: &str, key: &str) -> bool {
    match Regex::new(pattern) {
        Ok(re) => re.is_match(key),
        Err(e) => {
            warn!(
                %pattern,
                %key,
                error = %e,
                "unsupported patternProperties regex, member treated as undeclared"
            );
            false
        }
    }
}

/// True when `key` is listed under `properties` or matches a
/// `patternProperties` regex of `schema`.
pub(crate) fn is_declared(key: &str, schema: &Map<String, Value>) -> bool {
    schema
        .get("properties")
        .and_then(Value::as_object)
        .is_some_and(|p| p.contains_key(key))
        || matching_pattern(key, schema).is_some()
}

fn allowed_type(constraint: &Value, value: &Value) -> bool {
    match constraint.get("type") {
        Some(Value::String(name)) => name
            .parse::<PrimitiveType>()
            .is_ok_and(|kind| kind.matches(value)),
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(Value::as_str)
            .filter_map(|name| name.parse::<PrimitiveType>().ok())
            .any(|kind| kind.matches(value)),
        _ => true,
    }
}
