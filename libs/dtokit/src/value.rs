use std::any::Any;
use std::fmt;

use chrono::{DateTime, FixedOffset, SecondsFormat};

use crate::dto::Dto;
use crate::error::DtoError;

/// Untyped data exchanged with the outside world (decoded payloads).
///
/// Object keys keep insertion order. Integer keys of the source data are
/// carried as their decimal string form.
pub type Raw = serde_json::Value;

/// Keyed collection of [`Raw`] values.
pub type RawMap = serde_json::Map<String, Raw>;

/// Typed intermediate representation.
///
/// Produced by converters on the way in, consumed by converters on the way
/// out. Rust field types move in and out of it through `FieldValue`.
///
/// - Scalars: mirror the raw scalars, integers and floats kept apart
/// - DateTime: parsed timestamp with its original offset
/// - Enum: case name of a unit enum
/// - Object: a nested typed object, already constructed
/// - List, Map: recursive, map keeps entry order
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    DateTime(DateTime<FixedOffset>),
    Enum(&'static str),

    List(Vec<Value>),
    Map(Vec<(String, Value)>),

    Object(Box<dyn Object>),
}

impl Value {
    /// Short name of the variant, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::DateTime(_) => "datetime",
            Value::Enum(_) => "enum",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Lift plain data without interpreting it.
    pub fn from_raw(raw: Raw) -> Value {
        match raw {
            Raw::Null => Value::Null,
            Raw::Bool(b) => Value::Bool(b),
            Raw::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Raw::String(s) => Value::String(s),
            Raw::Array(items) => Value::List(items.into_iter().map(Value::from_raw).collect()),
            Raw::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_raw(v)))
                    .collect(),
            ),
        }
    }

    /// Lower to plain data.
    ///
    /// DateTime becomes an RFC 3339 string, Enum its case name, Object the
    /// output of its own `to_array`.
    pub fn into_raw(self) -> Result<Raw, DtoError> {
        Ok(match self {
            Value::Null => Raw::Null,
            Value::Bool(b) => Raw::Bool(b),
            Value::Int(i) => Raw::from(i),
            Value::Float(f) => float_to_raw(f)?,
            Value::String(s) => Raw::String(s),
            Value::DateTime(dt) => Raw::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Enum(case) => Raw::String(case.to_string()),
            Value::List(items) => Raw::Array(
                items
                    .into_iter()
                    .map(Value::into_raw)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Map(entries) => {
                let mut map = RawMap::new();
                for (k, v) in entries {
                    map.insert(k, v.into_raw()?);
                }
                Raw::Object(map)
            }
            Value::Object(obj) => obj.to_raw()?,
        })
    }
}

pub(crate) fn float_to_raw(f: f64) -> Result<Raw, DtoError> {
    serde_json::Number::from_f64(f)
        .map(Raw::Number)
        .ok_or_else(|| DtoError::TypeMismatch(format!("non-finite float {f} has no raw form")))
}

impl Clone for Value {
    fn clone(&self) -> Self {
        match self {
            Value::Null => Value::Null,
            Value::Bool(b) => Value::Bool(*b),
            Value::Int(i) => Value::Int(*i),
            Value::Float(f) => Value::Float(*f),
            Value::String(s) => Value::String(s.clone()),
            Value::DateTime(dt) => Value::DateTime(*dt),
            Value::Enum(case) => Value::Enum(*case),
            Value::List(items) => Value::List(items.clone()),
            Value::Map(entries) => Value::Map(entries.clone()),
            Value::Object(obj) => Value::Object(obj.clone_object()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Value::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::DateTime(dt) => f.debug_tuple("DateTime").field(dt).finish(),
            Value::Enum(case) => f.debug_tuple("Enum").field(case).finish(),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
            Value::Object(obj) => obj.fmt_object(f),
        }
    }
}

/// Objects compare by type name and lowered form.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => {
                a.dto_name() == b.dto_name() && a.to_raw().ok() == b.to_raw().ok()
            }
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Nested objects
// ---------------------------------------------------------------------------

/// Type-erased typed object carried inside a [`Value`].
///
/// Implemented for every [`Dto`]; recovered with `into_any` + downcast.
pub trait Object: Any + Send + Sync {
    fn dto_name(&self) -> &'static str;
    fn to_raw(&self) -> Result<Raw, DtoError>;
    fn clone_object(&self) -> Box<dyn Object>;
    fn fmt_object(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Dto> Object for T {
    fn dto_name(&self) -> &'static str {
        T::NAME
    }

    fn to_raw(&self) -> Result<Raw, DtoError> {
        self.to_array(&[])
    }

    fn clone_object(&self) -> Box<dyn Object> {
        Box::new(self.clone())
    }

    fn fmt_object(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

// ---------------------------------------------------------------------------
// Raw shape helpers
// ---------------------------------------------------------------------------

/// Short name of a raw value's shape, for error messages.
pub(crate) fn raw_kind(raw: &Raw) -> &'static str {
    match raw {
        Raw::Null => "null",
        Raw::Bool(_) => "bool",
        Raw::Number(n) if n.is_f64() => "float",
        Raw::Number(_) => "int",
        Raw::String(_) => "string",
        Raw::Array(_) => "list",
        Raw::Object(_) => "map",
    }
}

/// `true` for arrays and for objects keyed exactly `"0"`..`"n-1"` in order.
pub(crate) fn is_list_shaped(raw: &Raw) -> bool {
    match raw {
        Raw::Array(_) => true,
        Raw::Object(map) => map
            .keys()
            .enumerate()
            .all(|(i, k)| *k == i.to_string()),
        _ => false,
    }
}

/// Take the items of a list-shaped value, or hand the value back.
pub(crate) fn into_list(raw: Raw) -> Result<Vec<Raw>, Raw> {
    if !is_list_shaped(&raw) {
        return Err(raw);
    }
    match raw {
        Raw::Array(items) => Ok(items),
        Raw::Object(map) => Ok(map.into_iter().map(|(_, v)| v).collect()),
        other => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_shape_requires_zero_based_contiguous_keys() {
        assert!(is_list_shaped(&json!([1, 2, 3])));
        assert!(is_list_shaped(&json!({"0": "a", "1": "b"})));
        assert!(is_list_shaped(&json!({})));
        assert!(!is_list_shaped(&json!({"4": 6, "5": 2, "6": 3})));
        assert!(!is_list_shaped(&json!({"1": "a", "0": "b"})));
        assert!(!is_list_shaped(&json!({"00": "a"})));
        assert!(!is_list_shaped(&json!("abc")));
    }

    #[test]
    fn from_raw_keeps_int_and_float_apart() {
        assert_eq!(Value::from_raw(json!(3)), Value::Int(3));
        assert_eq!(Value::from_raw(json!(3.5)), Value::Float(3.5));
        assert_eq!(
            Value::from_raw(json!({"x": [1, null]})),
            Value::Map(vec![(
                "x".to_string(),
                Value::List(vec![Value::Int(1), Value::Null])
            )])
        );
    }

    #[test]
    fn into_raw_lowers_enum_and_rejects_nan() {
        assert_eq!(Value::Enum("B").into_raw().unwrap(), json!("B"));
        assert!(Value::Float(f64::NAN).into_raw().is_err());
    }
}
