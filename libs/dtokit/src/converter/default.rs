use crate::converter::array::ArrayConverter;
use crate::converter::map::MapConverter;
use crate::converter::{bad_argument, BuildConverter, Converter};
use crate::error::DtoError;
use crate::rule::ConverterArg;
use crate::types::{TypeSet, TypeToken};
use crate::value::{is_list_shaped, raw_kind, Raw, Value};

/// Converter used when a field declares none.
///
/// Picks the first declared type that accepts the raw shape:
/// - scalars pass through, an `int` is accepted by `float` but an integral
///   `float` is not accepted by `int`
/// - `enum` takes a known case name
/// - `object` builds the nested type from a keyed value
/// - `list` / `map` delegate to [`ArrayConverter`] / [`MapConverter`] with the
///   element types
/// - `mixed` takes anything unchanged
///
/// `datetime` is never accepted here, it needs a `DateTimeConverter` rule.
pub struct DefaultConverter {
    types: TypeSet,
    list: Option<ArrayConverter>,
    map: Option<MapConverter>,
}

impl DefaultConverter {
    pub fn new(types: TypeSet) -> Self {
        let list = types.list_items().cloned().map(ArrayConverter::for_items);
        let map = types.map_items().cloned().map(MapConverter::for_items);
        Self { types, list, map }
    }

    pub fn types(&self) -> &TypeSet {
        &self.types
    }

    fn lift(&self, token: &TypeToken, raw: Raw, field: &str) -> Result<Value, DtoError> {
        match token {
            TypeToken::Mixed | TypeToken::Bool | TypeToken::Int | TypeToken::String => {
                Ok(Value::from_raw(raw))
            }
            TypeToken::Float => Ok(Value::Float(raw.as_f64().unwrap_or_default())),
            TypeToken::List(_) => match &self.list {
                Some(list) => list.convert_from(raw, field),
                None => Err(self.mismatch_from(&raw, field)),
            },
            TypeToken::Map(_) => match &self.map {
                Some(map) => map.convert_from(raw, field),
                None => Err(self.mismatch_from(&raw, field)),
            },
            TypeToken::Enum(ty) => raw
                .as_str()
                .and_then(|s| ty.case(s))
                .map(Value::Enum)
                .ok_or_else(|| self.mismatch_from(&raw, field)),
            TypeToken::Object(ty) => (ty.from_array)(&raw)
                .map(Value::Object)
                .map_err(|e| e.with_context(field)),
            TypeToken::Null | TypeToken::DateTime => Err(self.mismatch_from(&raw, field)),
        }
    }

    fn mismatch_from(&self, raw: &Raw, field: &str) -> DtoError {
        let got = match raw {
            Raw::String(s) => format!("string '{s}'"),
            other => raw_kind(other).to_string(),
        };
        DtoError::type_mismatch(field, format!("expected {}, got {got}", self.types))
    }

    fn mismatch_to(&self, value: &Value) -> DtoError {
        DtoError::TypeMismatch(format!(
            "expected {}, got {}",
            self.types,
            value.kind_name()
        ))
    }

    fn has(&self, pred: impl Fn(&TypeToken) -> bool) -> bool {
        self.types.iter().any(|t| matches!(t, TypeToken::Mixed) || pred(t))
    }
}

/// Whether `token` accepts a non-null raw value of this shape.
fn accepts(token: &TypeToken, raw: &Raw) -> bool {
    match token {
        TypeToken::Mixed => true,
        TypeToken::Bool => raw.is_boolean(),
        TypeToken::Int => raw.is_i64(),
        TypeToken::Float => raw.is_number(),
        TypeToken::String => raw.is_string(),
        TypeToken::List(_) => is_list_shaped(raw),
        TypeToken::Map(_) | TypeToken::Object(_) => raw.is_object() || raw.is_array(),
        TypeToken::Enum(ty) => raw.as_str().is_some_and(|s| ty.case(s).is_some()),
        TypeToken::Null | TypeToken::DateTime => false,
    }
}

impl Converter for DefaultConverter {
    fn convert_from(&self, raw: Raw, field: &str) -> Result<Value, DtoError> {
        if raw.is_null() {
            return if self.types.accepts_null() {
                Ok(Value::Null)
            } else {
                Err(self.mismatch_from(&raw, field))
            };
        }
        match self.types.iter().find(|t| accepts(t, &raw)) {
            Some(token) => self.lift(token, raw, field),
            None => Err(self.mismatch_from(&raw, field)),
        }
    }

    fn convert_to(&self, value: Value) -> Result<Raw, DtoError> {
        let delegate: Option<&dyn Converter> = match value {
            Value::List(_) => self.list.as_ref().map(|c| c as &dyn Converter),
            Value::Map(_) => self.map.as_ref().map(|c| c as &dyn Converter),
            _ => None,
        };
        if let Some(converter) = delegate {
            return converter.convert_to(value);
        }

        let accepted = match &value {
            Value::Null => self.types.accepts_null(),
            Value::Bool(_) => self.has(|t| matches!(t, TypeToken::Bool)),
            Value::Int(_) => self.has(|t| matches!(t, TypeToken::Int | TypeToken::Float)),
            Value::Float(_) => self.has(|t| matches!(t, TypeToken::Float)),
            Value::String(_) => self.has(|t| matches!(t, TypeToken::String)),
            Value::Enum(case) => {
                self.has(|t| matches!(t, TypeToken::Enum(ty) if ty.case(case).is_some()))
            }
            Value::Object(obj) => {
                let name = obj.dto_name();
                self.has(|t| matches!(t, TypeToken::Object(ty) if ty.name == name))
            }
            Value::List(_) | Value::Map(_) => self.types.is_mixed(),
            Value::DateTime(_) => false,
        };
        if !accepted {
            return Err(self.mismatch_to(&value));
        }
        value.into_raw()
    }
}

impl BuildConverter for DefaultConverter {
    fn build(types: TypeSet, args: &[ConverterArg]) -> Result<Self, DtoError> {
        if let Some(arg) = args.first() {
            return Err(bad_argument("DefaultConverter", arg));
        }
        Ok(Self::new(types))
    }
}
