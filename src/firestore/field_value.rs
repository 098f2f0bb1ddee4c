//! Conversion between plain JSON and Firestore's typed value encoding
//!
//! Firestore's REST API wraps every value in a single-key object naming its
//! type (`{"stringValue": "x"}`, `{"integerValue": "42"}`, ...). Callers of
//! this crate work with plain `serde_json` values; this module translates at
//! the wire boundary.

use crate::error::FirestoreError;
use serde_json::{Map, Number, Value};

/// Field map of a document
pub type DocumentData = Map<String, Value>;

/// Encode a plain JSON value as a Firestore value
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => serde_json::json!({ "nullValue": null }),
        Value::Bool(b) => serde_json::json!({ "booleanValue": b }),
        Value::Number(n) => encode_number(n),
        Value::String(s) => serde_json::json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            serde_json::json!({ "arrayValue": { "values": values } })
        }
        Value::Object(fields) => serde_json::json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

fn encode_number(n: &Number) -> Value {
    if let Some(i) = n.as_i64() {
        // int64 travels as a decimal string
        return serde_json::json!({ "integerValue": i.to_string() });
    }
    serde_json::json!({ "doubleValue": n.as_f64() })
}

/// Encode every field of a document
pub fn encode_fields(data: &DocumentData) -> Value {
    let fields: Map<String, Value> = data
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect();
    Value::Object(fields)
}

/// Decode a Firestore value into plain JSON
///
/// Timestamps, references and bytes decode to their string form; geo points
/// decode to `{"latitude": .., "longitude": ..}`.
pub fn decode_value(value: &Value) -> Result<Value, FirestoreError> {
    let Some(object) = value.as_object() else {
        return Err(FirestoreError::InvalidData(format!("expected typed value, got {}", value)));
    };

    let Some((kind, inner)) = object.iter().next() else {
        return Err(FirestoreError::InvalidData("empty typed value".to_string()));
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => Ok(Value::Bool(inner.as_bool().unwrap_or(false))),
        "integerValue" => decode_integer(inner),
        "doubleValue" => Ok(inner.clone()),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => Ok(inner.clone()),
        "geoPointValue" => Ok(inner.clone()),
        "arrayValue" => {
            let values = match inner.get("values").and_then(Value::as_array) {
                None => return Ok(Value::Array(Vec::new())),
                Some(values) => values,
            };
            let decoded = values
                .iter()
                .map(decode_value)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(decoded))
        }
        "mapValue" => {
            let fields = match inner.get("fields").and_then(Value::as_object) {
                None => return Ok(Value::Object(Map::new())),
                Some(fields) => fields,
            };
            Ok(Value::Object(decode_fields(fields)?))
        }
        other => Err(FirestoreError::InvalidData(format!("unsupported value type {}", other))),
    }
}

fn decode_integer(inner: &Value) -> Result<Value, FirestoreError> {
    if inner.is_number() {
        return Ok(inner.clone());
    }
    let Some(text) = inner.as_str() else {
        return Err(FirestoreError::InvalidData(format!("bad integerValue {}", inner)));
    };
    text.parse::<i64>()
        .map(|i| Value::Number(i.into()))
        .map_err(|_| FirestoreError::InvalidData(format!("bad integerValue {}", text)))
}

/// Decode the `fields` object of a Firestore document
pub fn decode_fields(fields: &Map<String, Value>) -> Result<DocumentData, FirestoreError> {
    fields
        .iter()
        .map(|(key, value)| Ok((key.clone(), decode_value(value)?)))
        .collect()
}

/// Field path for an update mask
///
/// Simple identifiers pass through; anything else is backtick-quoted.
pub fn field_path(name: &str) -> String {
    let mut chars = name.chars();
    let simple = match chars.next() {
        None => false,
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
    };

    if simple {
        return name.to_string();
    }

    let escaped = name.replace('\\', "\\\\").replace('`', "\\`");
    format!("`{}`", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encodes_scalars() {
        assert_eq!(encode_value(&json!(null)), json!({ "nullValue": null }));
        assert_eq!(encode_value(&json!(true)), json!({ "booleanValue": true }));
        assert_eq!(encode_value(&json!(7)), json!({ "integerValue": "7" }));
        assert_eq!(encode_value(&json!(1.5)), json!({ "doubleValue": 1.5 }));
        assert_eq!(encode_value(&json!("hi")), json!({ "stringValue": "hi" }));
    }

    #[test]
    fn encodes_nested_values() {
        let encoded = encode_value(&json!({ "tags": ["a"], "n": 1 }));
        assert_eq!(
            encoded,
            json!({
                "mapValue": { "fields": {
                    "tags": { "arrayValue": { "values": [ { "stringValue": "a" } ] } },
                    "n": { "integerValue": "1" }
                } }
            })
        );
    }

    #[test]
    fn decodes_what_it_encodes() {
        let original = json!({ "name": "car", "year": 2019, "price": 12.5, "sold": false, "tags": [1, "x"], "owner": null });
        let decoded = decode_value(&encode_value(&original)).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn decodes_server_only_types() {
        assert_eq!(
            decode_value(&json!({ "timestampValue": "2024-01-01T00:00:00Z" })).unwrap(),
            json!("2024-01-01T00:00:00Z")
        );
        assert_eq!(
            decode_value(&json!({ "geoPointValue": { "latitude": 1.0, "longitude": 2.0 } })).unwrap(),
            json!({ "latitude": 1.0, "longitude": 2.0 })
        );
    }

    #[test]
    fn decodes_empty_containers() {
        assert_eq!(decode_value(&json!({ "arrayValue": {} })).unwrap(), json!([]));
        assert_eq!(decode_value(&json!({ "mapValue": {} })).unwrap(), json!({}));
    }

    #[test]
    fn rejects_unknown_type() {
        let result = decode_value(&json!({ "vectorValue": {} }));
        assert!(matches!(result, Err(FirestoreError::InvalidData(_))));
    }

    #[test]
    fn rejects_bad_integer() {
        let result = decode_value(&json!({ "integerValue": "abc" }));
        assert!(matches!(result, Err(FirestoreError::InvalidData(_))));
    }

    #[test]
    fn quotes_non_identifier_field_paths() {
        assert_eq!(field_path("email"), "email");
        assert_eq!(field_path("_private2"), "_private2");
        assert_eq!(field_path("first name"), "`first name`");
        assert_eq!(field_path("2fa"), "`2fa`");
        assert_eq!(field_path("a`b"), "`a\\`b`");
    }
}
