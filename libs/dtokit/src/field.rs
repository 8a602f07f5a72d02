use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use indexmap::IndexMap;

use crate::dto::Dto;
use crate::error::DtoError;
use crate::types::{EnumType, TypeSet, TypeToken};
use crate::value::{Raw, Value};

/// Rust type usable as a DTO field.
///
/// - `types()`: declared type set, drives converter selection and
///   nullability
/// - `from_value()`: take the converter output; `field` is only used in
///   error messages
/// - `to_value()`: hand the current value to the converter
pub trait FieldValue: Sized {
    fn types() -> TypeSet;
    fn from_value(value: Value, field: &str) -> Result<Self, DtoError>;
    fn to_value(&self) -> Value;
}

fn unexpected(field: &str, expected: &str, value: &Value) -> DtoError {
    DtoError::type_mismatch(field, format!("expected {expected}, got {}", value.kind_name()))
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

impl FieldValue for bool {
    fn types() -> TypeSet {
        TypeSet::single(TypeToken::Bool)
    }

    fn from_value(value: Value, field: &str) -> Result<Self, DtoError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(unexpected(field, "bool", &other)),
        }
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

macro_rules! int_field {
    ($($t:ty),*) => {$(
        impl FieldValue for $t {
            fn types() -> TypeSet {
                TypeSet::single(TypeToken::Int)
            }

            fn from_value(value: Value, field: &str) -> Result<Self, DtoError> {
                match value {
                    Value::Int(i) => <$t>::try_from(i).map_err(|_| {
                        DtoError::type_mismatch(
                            field,
                            format!("{i} is out of range for {}", stringify!($t)),
                        )
                    }),
                    other => Err(unexpected(field, "int", &other)),
                }
            }

            fn to_value(&self) -> Value {
                Value::Int(i64::from(*self))
            }
        }
    )*};
}

int_field!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! float_field {
    ($($t:ty => $widen:expr),*) => {$(
        impl FieldValue for $t {
            fn types() -> TypeSet {
                TypeSet::single(TypeToken::Float)
            }

            fn from_value(value: Value, field: &str) -> Result<Self, DtoError> {
                match value {
                    Value::Float(f) => Ok(f as $t),
                    Value::Int(i) => Ok(i as $t),
                    other => Err(unexpected(field, "float", &other)),
                }
            }

            fn to_value(&self) -> Value {
                Value::Float($widen(*self))
            }
        }
    )*};
}

float_field!(f32 => widen_f32, f64 => f64::from);

/// Widen through the shortest decimal form, so `1.1f32` stays `1.1`.
fn widen_f32(f: f32) -> f64 {
    f.to_string().parse().unwrap_or(f64::from(f))
}

impl FieldValue for String {
    fn types() -> TypeSet {
        TypeSet::single(TypeToken::String)
    }

    fn from_value(value: Value, field: &str) -> Result<Self, DtoError> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(unexpected(field, "string", &other)),
        }
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

/// Untyped passthrough field.
impl FieldValue for Raw {
    fn types() -> TypeSet {
        TypeSet::mixed()
    }

    fn from_value(value: Value, field: &str) -> Result<Self, DtoError> {
        value.into_raw().map_err(|e| e.with_context(field))
    }

    fn to_value(&self) -> Value {
        Value::from_raw(self.clone())
    }
}

// ---------------------------------------------------------------------------
// Option / collections
// ---------------------------------------------------------------------------

impl<T: FieldValue> FieldValue for Option<T> {
    fn types() -> TypeSet {
        T::types().nullable()
    }

    fn from_value(value: Value, field: &str) -> Result<Self, DtoError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other, field).map(Some),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn types() -> TypeSet {
        TypeSet::single(TypeToken::List(T::types()))
    }

    fn from_value(value: Value, field: &str) -> Result<Self, DtoError> {
        match value {
            Value::List(items) => items
                .into_iter()
                .map(|item| T::from_value(item, field))
                .collect(),
            other => Err(unexpected(field, "list", &other)),
        }
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(FieldValue::to_value).collect())
    }
}

fn map_entries<T: FieldValue>(value: Value, field: &str) -> Result<Vec<(String, T)>, DtoError> {
    match value {
        Value::Map(entries) => entries
            .into_iter()
            .map(|(k, v)| T::from_value(v, field).map(|v| (k, v)))
            .collect(),
        other => Err(unexpected(field, "map", &other)),
    }
}

impl<T: FieldValue> FieldValue for BTreeMap<String, T> {
    fn types() -> TypeSet {
        TypeSet::single(TypeToken::Map(T::types()))
    }

    fn from_value(value: Value, field: &str) -> Result<Self, DtoError> {
        Ok(map_entries(value, field)?.into_iter().collect())
    }

    fn to_value(&self) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.clone(), v.to_value())).collect())
    }
}

impl<T: FieldValue> FieldValue for IndexMap<String, T> {
    fn types() -> TypeSet {
        TypeSet::single(TypeToken::Map(T::types()))
    }

    fn from_value(value: Value, field: &str) -> Result<Self, DtoError> {
        Ok(map_entries(value, field)?.into_iter().collect())
    }

    fn to_value(&self) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.clone(), v.to_value())).collect())
    }
}

// ---------------------------------------------------------------------------
// Date and time
// ---------------------------------------------------------------------------

fn datetime(value: Value, field: &str) -> Result<DateTime<FixedOffset>, DtoError> {
    match value {
        Value::DateTime(dt) => Ok(dt),
        other => Err(unexpected(field, "datetime", &other)),
    }
}

impl FieldValue for DateTime<FixedOffset> {
    fn types() -> TypeSet {
        TypeSet::single(TypeToken::DateTime)
    }

    fn from_value(value: Value, field: &str) -> Result<Self, DtoError> {
        datetime(value, field)
    }

    fn to_value(&self) -> Value {
        Value::DateTime(*self)
    }
}

impl FieldValue for DateTime<Utc> {
    fn types() -> TypeSet {
        TypeSet::single(TypeToken::DateTime)
    }

    fn from_value(value: Value, field: &str) -> Result<Self, DtoError> {
        datetime(value, field).map(|dt| dt.with_timezone(&Utc))
    }

    fn to_value(&self) -> Value {
        Value::DateTime(self.fixed_offset())
    }
}

/// Wall-clock time; the parsed offset is dropped.
impl FieldValue for NaiveDateTime {
    fn types() -> TypeSet {
        TypeSet::single(TypeToken::DateTime)
    }

    fn from_value(value: Value, field: &str) -> Result<Self, DtoError> {
        datetime(value, field).map(|dt| dt.naive_local())
    }

    fn to_value(&self) -> Value {
        Value::DateTime(self.and_utc().fixed_offset())
    }
}

impl FieldValue for NaiveDate {
    fn types() -> TypeSet {
        TypeSet::single(TypeToken::DateTime)
    }

    fn from_value(value: Value, field: &str) -> Result<Self, DtoError> {
        datetime(value, field).map(|dt| dt.date_naive())
    }

    fn to_value(&self) -> Value {
        Value::DateTime(self.and_time(NaiveTime::MIN).and_utc().fixed_offset())
    }
}

// ---------------------------------------------------------------------------
// Helpers for derived impls
// ---------------------------------------------------------------------------

/// Recover a nested object of type `T` from converter output.
pub fn object_from_value<T: Dto>(value: Value, field: &str) -> Result<T, DtoError> {
    match value {
        Value::Object(obj) => {
            let name = obj.dto_name();
            obj.into_any()
                .downcast::<T>()
                .map(|b| *b)
                .map_err(|_| DtoError::type_mismatch(field, format!("expected {}, got {name}", T::NAME)))
        }
        other => Err(unexpected(field, T::NAME, &other)),
    }
}

/// Case name carried by converter output for an enum field.
///
/// Accepts `Value::Enum` and, for converters that work on plain strings,
/// `Value::String`. Unknown cases are a type mismatch.
pub fn enum_case(value: Value, field: &str, ty: &EnumType) -> Result<&'static str, DtoError> {
    let case = match &value {
        Value::Enum(case) => *case,
        Value::String(s) => s.as_str(),
        other => return Err(unexpected(field, ty.name, other)),
    };
    ty.case(case).ok_or_else(|| {
        DtoError::type_mismatch(field, format!("'{case}' is not a case of {}", ty.name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_maps_null_to_none() {
        assert_eq!(Option::<i64>::from_value(Value::Null, "d").unwrap(), None);
        assert_eq!(Option::<i64>::from_value(Value::Int(4), "d").unwrap(), Some(4));
        assert_eq!(None::<i64>.to_value(), Value::Null);
    }

    #[test]
    fn narrow_ints_reject_out_of_range() {
        let err = u8::from_value(Value::Int(300), "x").unwrap_err();
        assert!(err.to_string().contains("out of range for u8"));
    }

    #[test]
    fn floats_accept_ints() {
        assert_eq!(f64::from_value(Value::Int(3), "e").unwrap(), 3.0);
        assert!(i64::from_value(Value::Float(3.0), "e").is_err());
    }

    #[test]
    fn f32_keeps_its_decimal_form() {
        assert_eq!(1.1f32.to_value(), Value::Float(1.1));
        assert_eq!(f32::from_value(1.1f32.to_value(), "e").unwrap(), 1.1f32);
        assert_eq!(f32::NAN.to_value().kind_name(), "float");
    }

    #[test]
    fn index_map_keeps_entry_order() {
        let value = Value::Map(vec![
            ("z".to_string(), Value::Int(1)),
            ("a".to_string(), Value::Int(2)),
        ]);
        let map = IndexMap::<String, i64>::from_value(value, "b").unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["z", "a"]);
    }

    #[test]
    fn naive_datetime_round_trips_wall_clock() {
        let dt = NaiveDate::from_ymd_opt(2022, 4, 1)
            .and_then(|d| d.and_hms_opt(10, 11, 12))
            .unwrap();
        let back = NaiveDateTime::from_value(dt.to_value(), "d").unwrap();
        assert_eq!(back, dt);
    }

    #[test]
    fn enum_case_rejects_unknown_names() {
        let ty = EnumType {
            name: "EnumA",
            cases: &["A", "B", "cc"],
        };
        assert_eq!(enum_case(Value::String("cc".into()), "b", &ty).unwrap(), "cc");
        assert!(enum_case(Value::String("C".into()), "b", &ty).is_err());
        assert!(enum_case(Value::Int(1), "b", &ty).is_err());
    }
}
