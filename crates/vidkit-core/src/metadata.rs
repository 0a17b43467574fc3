//! Custom metadata normalization for vendor uploads.
//!
//! The vendor expects a flat string-to-string JSON object serialized as a
//! string. Nested objects and arrays are not supported and cause upload
//! rejections, so they are dropped; remaining primitives are stringified.

use serde_json::{Map, Value};
use std::collections::HashMap;

/// Normalize custom metadata into the serialized form the vendor accepts.
///
/// Null, object, and array values are dropped; other primitives are
/// stringified. Returns `None` when nothing survives filtering, in which
/// case the metadata field is omitted from the upload request entirely.
/// Input key order is preserved.
pub fn build_custom_metadata(input: Option<&Map<String, Value>>) -> Option<String> {
    let input = input?;
    let mut out = Map::new();
    for (key, value) in input {
        match value {
            Value::Null | Value::Object(_) | Value::Array(_) => continue,
            Value::String(text) => {
                out.insert(key.clone(), Value::String(text.clone()));
            }
            primitive => {
                out.insert(key.clone(), Value::String(primitive.to_string()));
            }
        }
    }
    if out.is_empty() {
        return None;
    }
    serde_json::to_string(&Value::Object(out)).ok()
}

/// Read back custom metadata from a vendor response, which may arrive as a
/// JSON string or an already-parsed object.
pub fn parse_returned_custom_metadata(meta: &Value) -> Option<HashMap<String, String>> {
    match meta {
        Value::String(raw) => serde_json::from_str(raw).ok(),
        Value::Object(map) => Some(
            map.iter()
                .filter_map(|(key, value)| {
                    value.as_str().map(|text| (key.clone(), text.to_string()))
                })
                .collect(),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_drops_nulls_and_objects_stringifies_primitives() {
        let input = as_map(json!({"a": 1, "b": null, "c": {"x": 1}, "d": "ok"}));
        let serialized = build_custom_metadata(Some(&input)).unwrap();
        let parsed: Map<String, Value> = serde_json::from_str(&serialized).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["a"], "1");
        assert_eq!(parsed["d"], "ok");
    }

    #[test]
    fn test_omitted_when_nothing_remains() {
        let input = as_map(json!({"a": null, "b": [1, 2], "c": {}}));
        assert_eq!(build_custom_metadata(Some(&input)), None);
        assert_eq!(build_custom_metadata(None), None);
    }

    #[test]
    fn test_booleans_stringified() {
        let input = as_map(json!({"flag": true}));
        let serialized = build_custom_metadata(Some(&input)).unwrap();
        assert_eq!(serialized, r#"{"flag":"true"}"#);
    }

    #[test]
    fn test_preserves_input_key_order() {
        let input = as_map(json!({"z": "1", "a": "2", "m": "3"}));
        let serialized = build_custom_metadata(Some(&input)).unwrap();
        assert_eq!(serialized, r#"{"z":"1","a":"2","m":"3"}"#);
    }

    #[test]
    fn test_parse_returned_metadata_string_and_object() {
        let from_string = parse_returned_custom_metadata(&json!(r#"{"a":"1"}"#)).unwrap();
        assert_eq!(from_string["a"], "1");

        let from_object = parse_returned_custom_metadata(&json!({"a": "1"})).unwrap();
        assert_eq!(from_object["a"], "1");

        assert!(parse_returned_custom_metadata(&json!(42)).is_none());
    }
}
