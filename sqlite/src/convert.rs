//! Conversions from SQLite values to text and JSON.

use rusqlite::types::{Value, ValueRef};

/// Renders a value the way the literal copy mode stores it.
///
/// NULL becomes the empty string; text and blobs are decoded as lossy UTF-8.
pub(crate) fn value_to_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Converts a value to JSON. Non-finite reals become `null`, blobs become
/// arrays of byte values.
pub(crate) fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => serde_json::Value::from(*i),
        Value::Real(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Text(s) => serde_json::Value::String(s.clone()),
        Value::Blob(bytes) => serde_json::Value::from(bytes.clone()),
    }
}
