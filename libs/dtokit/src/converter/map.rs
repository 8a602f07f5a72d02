use crate::converter::array::item_converter;
use crate::converter::default::DefaultConverter;
use crate::converter::{BuildConverter, Converter};
use crate::error::DtoError;
use crate::rule::ConverterArg;
use crate::types::{TypeSet, TypeToken};
use crate::value::{raw_kind, Raw, RawMap, Value};

/// Keyed collection converter.
///
/// Accepts any keyed value, and arrays keyed by position. Keys and their
/// order are kept as given; each value goes through the item converter.
pub struct MapConverter {
    types: TypeSet,
    item: Box<dyn Converter>,
}

impl MapConverter {
    /// Converter for `map<items>` with the Default item converter.
    pub fn for_items(items: TypeSet) -> Self {
        Self {
            types: TypeSet::single(TypeToken::Map(items.clone())),
            item: Box::new(DefaultConverter::new(items)),
        }
    }

    fn entry(&self, key: String, raw: Raw, field: &str) -> Result<(String, Value), DtoError> {
        let value = self.item.convert_from(raw, &format!("{field}.{key}"))?;
        Ok((key, value))
    }
}

impl Converter for MapConverter {
    fn convert_from(&self, raw: Raw, field: &str) -> Result<Value, DtoError> {
        let entries = match raw {
            Raw::Null if self.types.accepts_null() => return Ok(Value::Null),
            Raw::Object(map) => map
                .into_iter()
                .map(|(k, v)| self.entry(k, v, field))
                .collect::<Result<Vec<_>, _>>()?,
            Raw::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, v)| self.entry(i.to_string(), v, field))
                .collect::<Result<Vec<_>, _>>()?,
            other => {
                return Err(DtoError::type_mismatch(
                    field,
                    format!("expected map, got {}", raw_kind(&other)),
                ));
            }
        };
        Ok(Value::Map(entries))
    }

    fn convert_to(&self, value: Value) -> Result<Raw, DtoError> {
        let entries: Vec<(String, Value)> = match value {
            Value::Null if self.types.accepts_null() => return Ok(Raw::Null),
            Value::Map(entries) => entries,
            Value::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
            other => {
                return Err(DtoError::TypeMismatch(format!(
                    "expected map, got {}",
                    other.kind_name()
                )));
            }
        };
        let mut map = RawMap::new();
        for (key, value) in entries {
            let raw = self.item.convert_to(value).map_err(|e| e.with_context(&key))?;
            map.insert(key, raw);
        }
        Ok(Raw::Object(map))
    }
}

impl BuildConverter for MapConverter {
    fn build(types: TypeSet, args: &[ConverterArg]) -> Result<Self, DtoError> {
        let item = item_converter("MapConverter", types.map_items(), args)?;
        Ok(Self { types, item })
    }
}
