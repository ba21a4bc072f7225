// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Canonical JSON encoding for stored values and key material.
//!
//! Object keys are emitted in sorted order at every nesting level, so two values that
//! are semantically equal always encode to the same string. This is what makes keyword
//! ordering irrelevant to key derivation, and what makes raw store contents stable
//! enough to inspect when debugging.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::CodecError;

/// Encodes `value` as canonical JSON.
///
/// # Errors
///
/// Returns an error if `value` has no JSON representation, for example a map whose
/// keys are not strings or numbers.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
///
/// let value = HashMap::from([("b", 2), ("a", 1)]);
/// assert_eq!(memento::codec::encode(&value)?, r#"{"a":1,"b":2}"#);
/// # Ok::<(), memento::CodecError>(())
/// ```
pub fn encode<T>(value: &T) -> Result<String, CodecError>
where
    T: Serialize + ?Sized,
{
    let value = serde_json::to_value(value).map_err(CodecError::caused_by)?;
    serde_json::to_string(&canonicalize(value)).map_err(CodecError::caused_by)
}

/// Decodes a value previously produced by [`encode`].
///
/// # Errors
///
/// Returns an error if `encoded` is not valid JSON or does not match the shape of `T`.
///
/// # Examples
///
/// ```
/// let value: Vec<u32> = memento::codec::decode("[1,2,3]")?;
/// assert_eq!(value, vec![1, 2, 3]);
/// # Ok::<(), memento::CodecError>(())
/// ```
pub fn decode<T>(encoded: &str) -> Result<T, CodecError>
where
    T: DeserializeOwned,
{
    serde_json::from_str(encoded).map_err(CodecError::caused_by)
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().map(|(key, value)| (key, canonicalize(value))).collect();
            entries.sort_by(|(left, _), (right, _)| left.cmp(right));
            Value::Object(entries.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        scalar => scalar,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use serde::Deserialize;

    use super::*;

    #[test]
    fn encode_scalars() {
        assert_eq!(encode("hello").unwrap(), "\"hello\"");
        assert_eq!(encode(&42).unwrap(), "42");
        assert_eq!(encode(&2.5).unwrap(), "2.5");
        assert_eq!(encode(&true).unwrap(), "true");
        assert_eq!(encode(&Option::<i32>::None).unwrap(), "null");
        assert_eq!(encode(&vec![1, 2, 3]).unwrap(), "[1,2,3]");
    }

    #[test]
    fn encode_sorts_keys_at_every_level() {
        let value = serde_json::json!({
            "b": 2,
            "a": { "z": [ { "y": 1, "x": 2 } ], "m": null },
        });
        assert_eq!(encode(&value).unwrap(), r#"{"a":{"m":null,"z":[{"x":2,"y":1}]},"b":2}"#);
    }

    #[test]
    fn equal_maps_encode_identically_regardless_of_insertion_order() {
        let mut first = HashMap::new();
        first.insert("alpha".to_string(), 1);
        first.insert("beta".to_string(), 2);
        first.insert("gamma".to_string(), 3);

        let mut second = HashMap::new();
        second.insert("gamma".to_string(), 3);
        second.insert("alpha".to_string(), 1);
        second.insert("beta".to_string(), 2);

        assert_eq!(encode(&first).unwrap(), encode(&second).unwrap());
    }

    #[test]
    fn struct_fields_are_sorted() {
        #[derive(Serialize)]
        struct Args {
            zeta: u8,
            alpha: u8,
        }

        assert_eq!(encode(&Args { zeta: 1, alpha: 2 }).unwrap(), r#"{"alpha":2,"zeta":1}"#);
    }

    #[test]
    fn decode_values() {
        assert_eq!(decode::<String>("\"hello\"").unwrap(), "hello");
        assert_eq!(decode::<i64>("42").unwrap(), 42);
        let map: BTreeMap<String, i32> = decode(r#"{"a":1,"b":2}"#).unwrap();
        assert_eq!(map, BTreeMap::from([("a".to_string(), 1), ("b".to_string(), 2)]));
    }

    #[test]
    fn round_trip_preserves_nested_values() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Record {
            name: String,
            values: Vec<i32>,
            nested: BTreeMap<String, bool>,
        }

        let record = Record {
            name: "test".to_string(),
            values: vec![1, 2, 3],
            nested: BTreeMap::from([("a".to_string(), true)]),
        };
        assert_eq!(decode::<Record>(&encode(&record).unwrap()).unwrap(), record);
    }

    #[test]
    fn decode_rejects_corrupt_input() {
        decode::<i32>("{not json").unwrap_err();
        decode::<i32>("\"a string\"").unwrap_err();
    }

    #[test]
    fn encode_rejects_non_string_map_keys() {
        let value = HashMap::from([((1, 2), "tuple key")]);
        encode(&value).unwrap_err();
    }
}
