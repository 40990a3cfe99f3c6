use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Trait for types that can be requested as Gemini structured output.
///
/// Automatically implemented for any type that implements `JsonSchema + DeserializeOwned`.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// Generate a `responseSchema` Gemini accepts.
    ///
    /// Gemini requires:
    /// 1. No `$schema`, `definitions` or `additionalProperties` keys
    /// 2. Fully inlined schemas (no `$ref` references)
    /// 3. Nullable fields as `nullable: true`, not `type: [T, "null"]`
    fn gemini_schema() -> Value {
        let schema = schema_for!(Self);
        let mut value = serde_json::to_value(schema).unwrap_or_default();

        inline_refs(&mut value);

        if let Value::Object(map) = &mut value {
            map.remove("definitions");
        }

        strip_unsupported_fields(&mut value);
        collapse_nullable(&mut value);

        value
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

fn strip_unsupported_fields(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.remove("$schema");
            map.remove("additionalProperties");
            for v in map.values_mut() {
                strip_unsupported_fields(v);
            }
        }
        Value::Array(arr) => {
            for v in arr.iter_mut() {
                strip_unsupported_fields(v);
            }
        }
        _ => {}
    }
}

/// Rewrite `type: ["string", "null"]` and `anyOf: [X, {type: null}]` into
/// `X` plus `nullable: true`.
fn collapse_nullable(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Array(types)) = map.get("type").cloned() {
                let non_null: Vec<Value> = types
                    .into_iter()
                    .filter(|t| t.as_str() != Some("null"))
                    .collect();
                if non_null.len() == 1 {
                    map.insert("type".to_string(), non_null[0].clone());
                    map.insert("nullable".to_string(), Value::Bool(true));
                }
            }

            if let Some(Value::Array(any_of)) = map.get("anyOf").cloned() {
                let (nulls, rest): (Vec<Value>, Vec<Value>) = any_of
                    .into_iter()
                    .partition(|v| v.get("type").and_then(Value::as_str) == Some("null"));
                if !nulls.is_empty() && rest.len() == 1 {
                    map.remove("anyOf");
                    if let Value::Object(inner) = &rest[0] {
                        for (k, v) in inner {
                            map.entry(k.clone()).or_insert_with(|| v.clone());
                        }
                    }
                    map.insert("nullable".to_string(), Value::Bool(true));
                }
            }

            for v in map.values_mut() {
                collapse_nullable(v);
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                collapse_nullable(item);
            }
        }
        _ => {}
    }
}

fn inline_refs(value: &mut Value) {
    let definitions = if let Value::Object(map) = value {
        map.get("definitions").cloned()
    } else {
        None
    };

    if let Some(defs) = definitions {
        inline_refs_recursive(value, &defs);
    }
}

fn inline_refs_recursive(value: &mut Value, definitions: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(ref_path)) = map.get("$ref").cloned() {
                if let Some(type_name) = ref_path.strip_prefix("#/definitions/") {
                    if let Some(def) = definitions.get(type_name) {
                        *value = def.clone();
                        inline_refs_recursive(value, definitions);
                        return;
                    }
                }
            }

            if let Some(Value::Array(all_of)) = map.get("allOf").cloned() {
                if let [single] = all_of.as_slice() {
                    *value = single.clone();
                    inline_refs_recursive(value, definitions);
                    return;
                }
            }

            for (_, v) in map.iter_mut() {
                inline_refs_recursive(v, definitions);
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                inline_refs_recursive(item, definitions);
            }
        }
        _ => {}
    }
}
