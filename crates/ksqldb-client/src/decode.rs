//! Two-stage JSON decoding.
//!
//! ksqlDB responses mix fixed fields with open-ended, server-assigned map keys
//! (host addresses, query ids, store names, stringified partition numbers), and
//! several endpoints answer with discriminated unions. Decoding therefore runs in
//! two passes:
//!
//! 1. [`unmarshal_generic`] turns the raw body into an untyped [`JsonMap`]. Only
//!    "is this a JSON object" can fail here, reported as [`ClientError::Parse`].
//! 2. [`decode_into`] walks the untyped tree with the [`Decode`] visitor and
//!    builds the typed record. Shape mismatches are reported as [`DecodeError`]
//!    naming the field path and the expected vs. actual JSON kind.
//!
//! Absent and `null` fields decode to their `Default`. Map keys are kept verbatim
//! as strings, so `"3"` stays `"3"`.

use crate::error::ClientError;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Untyped JSON object, the intermediate form between the two passes.
pub type JsonMap = serde_json::Map<String, Value>;

/// Parse a response body whose root must be a JSON object.
pub fn unmarshal_generic(bytes: &[u8]) -> Result<JsonMap, ClientError> {
    serde_json::from_slice::<JsonMap>(bytes).map_err(|e| ClientError::Parse(e.to_string()))
}

/// Parse a response body whose root may be any JSON value.
pub fn unmarshal_value(bytes: &[u8]) -> Result<Value, ClientError> {
    serde_json::from_slice::<Value>(bytes).map_err(|e| ClientError::Parse(e.to_string()))
}

/// Decode an untyped object into `T`.
pub fn decode_into<T: Decode>(generic: JsonMap) -> Result<T, DecodeError> {
    T::decode(&Value::Object(generic), "")
}

/// JSON value kinds, as named in decode diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonKind {
    Null,
    Bool,
    Integer,
    Number,
    String,
    Array,
    Map,
}

impl JsonKind {
    /// Kind of a concrete value. Numbers are `Integer` when they fit an `i64`.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => JsonKind::Null,
            Value::Bool(_) => JsonKind::Bool,
            Value::Number(n) if n.is_i64() => JsonKind::Integer,
            Value::Number(_) => JsonKind::Number,
            Value::String(_) => JsonKind::String,
            Value::Array(_) => JsonKind::Array,
            Value::Object(_) => JsonKind::Map,
        }
    }

    fn name(self) -> &'static str {
        match self {
            JsonKind::Null => "null",
            JsonKind::Bool => "bool",
            JsonKind::Integer => "integer",
            JsonKind::Number => "number",
            JsonKind::String => "string",
            JsonKind::Array => "array",
            JsonKind::Map => "map",
        }
    }

    fn article(self) -> &'static str {
        match self {
            JsonKind::Integer | JsonKind::Array => "an",
            _ => "a",
        }
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.article(), self.name())
    }
}

/// Why a value could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeReason {
    /// The JSON kind differs from the declared kind.
    Mismatch { expected: JsonKind, actual: JsonKind },
    /// An integer does not fit the declared width.
    OutOfRange(i64),
    /// A required field is absent.
    Missing,
    /// A field belonging to another response variant is populated.
    Unexpected(String),
}

impl fmt::Display for DecodeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeReason::Mismatch { expected, actual } => {
                write!(f, "expected {}, got {}", expected, actual)
            }
            DecodeReason::OutOfRange(n) => write!(f, "integer {} out of range", n),
            DecodeReason::Missing => f.write_str("missing required field"),
            DecodeReason::Unexpected(field) => {
                write!(f, "unexpected field '{}' for this response type", field)
            }
        }
    }
}

/// A structural mismatch between a JSON value and the target record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("error decoding '{}': {reason}", display_path(.path))]
pub struct DecodeError {
    /// Dotted field path with `[key]` segments for map keys and array indices
    pub path: String,
    pub reason: DecodeReason,
}

impl DecodeError {
    pub fn mismatch(path: &str, expected: JsonKind, value: &Value) -> Self {
        Self {
            path: path.to_string(),
            reason: DecodeReason::Mismatch {
                expected,
                actual: JsonKind::of(value),
            },
        }
    }

    pub fn missing(path: &str) -> Self {
        Self {
            path: path.to_string(),
            reason: DecodeReason::Missing,
        }
    }

    pub fn unexpected(path: &str, field: &str) -> Self {
        Self {
            path: path.to_string(),
            reason: DecodeReason::Unexpected(field.to_string()),
        }
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "<root>"
    } else {
        path
    }
}

/// Path of a named field below `parent`.
pub fn field_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

/// Path of a map entry or array element below `parent`.
pub fn key_path(parent: &str, key: impl fmt::Display) -> String {
    format!("{}[{}]", parent, key)
}

/// Maps an untyped JSON value onto a statically shaped type.
pub trait Decode: Sized {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError>;
}

/// Field accessor over a JSON object, used by record `Decode` impls.
pub struct Fields<'a> {
    map: &'a JsonMap,
    path: &'a str,
}

impl<'a> Fields<'a> {
    /// Expect `value` to be an object.
    pub fn new(value: &'a Value, path: &'a str) -> Result<Self, DecodeError> {
        match value {
            Value::Object(map) => Ok(Self { map, path }),
            other => Err(DecodeError::mismatch(path, JsonKind::Map, other)),
        }
    }

    pub fn path(&self) -> &str {
        self.path
    }

    /// True if `name` is present with a non-null value.
    pub fn contains(&self, name: &str) -> bool {
        self.map.get(name).is_some_and(|v| !v.is_null())
    }

    pub fn raw(&self, name: &str) -> Option<&'a Value> {
        self.map.get(name).filter(|v| !v.is_null())
    }

    /// Decode an optional field, falling back to `T::default()` when absent or null.
    pub fn get<T: Decode + Default>(&self, name: &str) -> Result<T, DecodeError> {
        match self.raw(name) {
            Some(value) => T::decode(value, &field_path(self.path, name)),
            None => Ok(T::default()),
        }
    }

    /// Decode a field that must be present.
    pub fn require<T: Decode>(&self, name: &str) -> Result<T, DecodeError> {
        let path = field_path(self.path, name);
        match self.raw(name) {
            Some(value) => T::decode(value, &path),
            None => Err(DecodeError::missing(&path)),
        }
    }

    /// Fail if any of `names` is populated.
    pub fn reject_any(&self, names: &[&str]) -> Result<(), DecodeError> {
        match names.iter().find(|name| self.contains(name)) {
            Some(name) => Err(DecodeError::unexpected(self.path, name)),
            None => Ok(()),
        }
    }

    /// Copy of the underlying object.
    pub fn to_map(&self) -> JsonMap {
        self.map.clone()
    }
}

impl Decode for Value {
    fn decode(value: &Value, _path: &str) -> Result<Self, DecodeError> {
        Ok(value.clone())
    }
}

impl Decode for bool {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        value
            .as_bool()
            .ok_or_else(|| DecodeError::mismatch(path, JsonKind::Bool, value))
    }
}

impl Decode for String {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| DecodeError::mismatch(path, JsonKind::String, value))
    }
}

impl Decode for i64 {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        value
            .as_i64()
            .ok_or_else(|| DecodeError::mismatch(path, JsonKind::Integer, value))
    }
}

impl Decode for i32 {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let n = i64::decode(value, path)?;
        i32::try_from(n).map_err(|_| DecodeError {
            path: path.to_string(),
            reason: DecodeReason::OutOfRange(n),
        })
    }
}

impl Decode for f64 {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        value
            .as_f64()
            .ok_or_else(|| DecodeError::mismatch(path, JsonKind::Number, value))
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        match value {
            Value::Null => Ok(None),
            other => T::decode(other, path).map(Some),
        }
    }
}

impl<T: Decode> Decode for Box<T> {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        T::decode(value, path).map(Box::new)
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let items = value
            .as_array()
            .ok_or_else(|| DecodeError::mismatch(path, JsonKind::Array, value))?;
        items
            .iter()
            .enumerate()
            .map(|(i, item)| T::decode(item, &key_path(path, i)))
            .collect()
    }
}

impl<T: Decode> Decode for HashMap<String, T> {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let map = value
            .as_object()
            .ok_or_else(|| DecodeError::mismatch(path, JsonKind::Map, value))?;
        map.iter()
            .map(|(key, item)| Ok((key.clone(), T::decode(item, &key_path(path, key))?)))
            .collect()
    }
}

impl<T: Decode> Decode for BTreeMap<String, T> {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let map = value
            .as_object()
            .ok_or_else(|| DecodeError::mismatch(path, JsonKind::Map, value))?;
        map.iter()
            .map(|(key, item)| Ok((key.clone(), T::decode(item, &key_path(path, key))?)))
            .collect()
    }
}
