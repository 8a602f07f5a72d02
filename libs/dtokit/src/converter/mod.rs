//! Field-level converters.
//!
//! A converter turns one raw value into a typed [`Value`] and back. It is
//! built once per field with the field's declared types and the rule's
//! arguments, then shared read-only.
//!
//! Built-ins:
//! - [`DefaultConverter`]: scalars, enums, nested objects, delegates
//!   collections to the Array / Map converters
//! - [`ArrayConverter`]: list-shaped input, per-item conversion
//! - [`MapConverter`]: keyed input, keys and order preserved
//! - [`DateTimeConverter`]: date-time strings with precision and format

pub mod array;
pub mod datetime;
pub mod default;
pub mod map;
pub mod registry;

pub use array::ArrayConverter;
pub use datetime::DateTimeConverter;
pub use default::DefaultConverter;
pub use map::MapConverter;

use crate::error::DtoError;
use crate::rule::ConverterArg;
use crate::types::TypeSet;
use crate::value::{Raw, Value};

/// Bidirectional value converter.
///
/// `field` names the field being converted and is used in error messages
/// only. Both directions fail with `TypeMismatch` on input they cannot
/// handle.
pub trait Converter: Send + Sync {
    fn convert_from(&self, raw: Raw, field: &str) -> Result<Value, DtoError>;
    fn convert_to(&self, value: Value) -> Result<Raw, DtoError>;
}

/// Converter constructible from a rule.
///
/// `types` is the declared type set of the field; `args` are the rule's
/// arguments in declaration order. Arguments the converter does not
/// understand are rejected with `UnsupportedConverter`.
pub trait BuildConverter: Converter + Sized + 'static {
    fn build(types: TypeSet, args: &[ConverterArg]) -> Result<Self, DtoError>;
}

/// Error for an argument a converter cannot take.
pub(crate) fn bad_argument(converter: &str, arg: &ConverterArg) -> DtoError {
    DtoError::UnsupportedConverter(format!("{converter} does not take argument {arg:?}"))
}
