//! Reusable payload filters
//!
//! Filters normalise a JSON payload before it is deserialised into a
//! write representation.

use serde_json::Value;

/// Filter: trim surrounding whitespace from every top-level string field
pub fn trim_strings(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, field)| match field {
                    Value::String(s) => (key, Value::String(s.trim().to_string())),
                    other => (key, other),
                })
                .collect(),
        ),
        other => other,
    }
}
