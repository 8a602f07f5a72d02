use crate::converter::default::DefaultConverter;
use crate::converter::{bad_argument, BuildConverter, Converter};
use crate::error::DtoError;
use crate::rule::ConverterArg;
use crate::types::{TypeSet, TypeToken};
use crate::value::{into_list, raw_kind, Raw, Value};

/// Item types and item converter taken from converter arguments.
///
/// Layout: `[Types(items)]? [Converter(item)]? item-args...`. Item types
/// default to `declared`, then to `mixed`; the item converter defaults to
/// [`DefaultConverter`] and receives the remaining arguments.
pub(crate) fn item_converter(
    owner: &str,
    declared: Option<&TypeSet>,
    args: &[ConverterArg],
) -> Result<Box<dyn Converter>, DtoError> {
    let (items, rest) = match args.split_first() {
        Some((ConverterArg::Types(items), rest)) => (items.clone(), rest),
        _ => (declared.cloned().unwrap_or_else(TypeSet::mixed), args),
    };
    match rest.split_first() {
        None => Ok(Box::new(DefaultConverter::new(items))),
        Some((ConverterArg::Converter(item), item_args)) => {
            let (_, build) = item.resolve()?;
            build(items, item_args)
        }
        Some((arg, _)) => Err(bad_argument(owner, arg)),
    }
}

/// Ordered sequence converter.
///
/// Input must be list-shaped: an array, or a keyed value whose keys are
/// exactly `0..n-1` in order. Anything else, sparse keys included, is a
/// type mismatch. Each item goes through the item converter.
pub struct ArrayConverter {
    types: TypeSet,
    item: Box<dyn Converter>,
}

impl ArrayConverter {
    /// Converter for `list<items>` with the Default item converter.
    pub fn for_items(items: TypeSet) -> Self {
        Self {
            types: TypeSet::single(TypeToken::List(items.clone())),
            item: Box::new(DefaultConverter::new(items)),
        }
    }
}

impl Converter for ArrayConverter {
    fn convert_from(&self, raw: Raw, field: &str) -> Result<Value, DtoError> {
        if raw.is_null() && self.types.accepts_null() {
            return Ok(Value::Null);
        }
        let items = into_list(raw).map_err(|raw| {
            DtoError::type_mismatch(
                field,
                format!("expected list with keys 0..n-1, got {}", describe(&raw)),
            )
        })?;
        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| self.item.convert_from(item, &format!("{field}[{i}]")))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    }

    fn convert_to(&self, value: Value) -> Result<Raw, DtoError> {
        match value {
            Value::Null if self.types.accepts_null() => Ok(Raw::Null),
            Value::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| {
                    self.item
                        .convert_to(item)
                        .map_err(|e| e.with_context(format!("[{i}]")))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Raw::Array),
            other => Err(DtoError::TypeMismatch(format!(
                "expected list, got {}",
                other.kind_name()
            ))),
        }
    }
}

impl BuildConverter for ArrayConverter {
    fn build(types: TypeSet, args: &[ConverterArg]) -> Result<Self, DtoError> {
        let item = item_converter("ArrayConverter", types.list_items(), args)?;
        Ok(Self { types, item })
    }
}

fn describe(raw: &Raw) -> String {
    match raw {
        Raw::Object(map) => {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            format!("map with keys [{}]", keys.join(", "))
        }
        other => raw_kind(other).to_string(),
    }
}
