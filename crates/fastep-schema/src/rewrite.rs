//! # Additional-Properties Rewriting
//!
//! Pure transform over a schema tree: every explicit object schema (a node
//! whose `type` is `"object"`) reachable from the root through `properties`
//! gets its `additionalProperties` replaced by the policy's constraint.
//!
//! Nodes without `"type": "object"` are returned as they are, and so is
//! everything below them. The input tree is never mutated, so an inline
//! schema shared between orchestrators cannot pick up another instance's
//! policy.

use serde_json::{Map, Value};

use crate::policy::AdditionalPropertiesPolicy;

/// Return a copy of `schema` with `additionalProperties` set according to
/// `policy` at every object node.
pub fn rewrite(schema: &Value, policy: &AdditionalPropertiesPolicy) -> Value {
    match policy.constraint() {
        Some(constraint) => rewrite_node(schema, &constraint),
        None => schema.clone(),
    }
}

fn rewrite_node(node: &Value, constraint: &Value) -> Value {
    let Value::Object(map) = node else {
        return node.clone();
    };
    if !is_object_schema(map) {
        return node.clone();
    }

    let mut out = map.clone();
    if let Some(Value::Object(properties)) = map.get("properties") {
        let rewritten: Map<String, Value> = properties
            .iter()
            .map(|(name, sub)| (name.clone(), rewrite_node(sub, constraint)))
            .collect();
        out.insert("properties".to_string(), Value::Object(rewritten));
    }
    out.insert("additionalProperties".to_string(), constraint.clone());
    Value::Object(out)
}

/// True when the schema explicitly declares `"type": "object"`.
pub(crate) fn is_object_schema(schema: &Map<String, Value>) -> bool {
    schema.get("type").and_then(Value::as_str) == Some("object")
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::policy::PrimitiveType;
    use proptest::prelude::*;
    use serde_json::json;

    fn arb_schema() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(json!({"type": "string"})),
            Just(json!({"type": "integer"})),
            Just(json!({})),
            Just(json!({"type": "object"})),
        ];
        leaf.prop_recursive(4, 32, 4, |inner| {
            proptest::collection::btree_map("[a-d]", inner, 0..4).prop_map(|props| {
                let properties: Map<String, Value> = props.into_iter().collect();
                json!({"type": "object", "properties": properties})
            })
        })
    }

    fn arb_policy() -> impl Strategy<Value = AdditionalPropertiesPolicy> {
        prop_oneof![
            Just(AdditionalPropertiesPolicy::Unset),
            any::<bool>().prop_map(AdditionalPropertiesPolicy::Remove),
            Just(AdditionalPropertiesPolicy::OnlyType(PrimitiveType::String)),
            Just(AdditionalPropertiesPolicy::OnlyType(PrimitiveType::Number)),
        ]
    }

    proptest! {
        #[test]
        fn rewrite_is_idempotent(schema in arb_schema(), policy in arb_policy()) {
            let once = rewrite(&schema, &policy);
            let twice = rewrite(&once, &policy);
            prop_assert_eq!(once, twice);
        }
    }
}
