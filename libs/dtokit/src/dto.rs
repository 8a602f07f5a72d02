use std::fmt;

use crate::engine;
use crate::error::DtoError;
use crate::schema::Schema;
use crate::value::{Raw, Value};

/// Typed value object convertible from and to untyped data.
///
/// Usually derived with `#[derive(Dto)]`. The four required items are the
/// host side of the conversion: what the engine needs to know about the
/// type and how it builds and reads instances:
///
/// - `schema()`: fields, their rules and the constructor parameters
/// - `construct()`: call the constructor with positional arguments; the
///   list may be shorter than the parameter list, missing trailing
///   parameters take the constructor's own defaults
/// - `assign()` / `read()`: set or get a field by name
pub trait Dto: fmt::Debug + Clone + Send + Sync + 'static {
    const NAME: &'static str;

    fn schema() -> Schema;

    fn construct(args: Vec<Value>) -> Result<Self, DtoError>;

    fn assign(&mut self, field: &str, value: Value) -> Result<(), DtoError>;

    fn read(&self, field: &str) -> Result<Value, DtoError>;

    /// Build an instance from untyped data.
    fn from_array(raw: &Raw) -> Result<Self, DtoError> {
        engine::from_array(raw)
    }

    /// Lower to untyped data, leaving out the `except` fields.
    fn to_array(&self, except: &[&str]) -> Result<Raw, DtoError> {
        engine::to_array(self, except)
    }
}
