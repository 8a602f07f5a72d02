//! Conversion between untyped key-value data and typed value objects.
//!
//! A type describes its fields once (usually with `#[derive(Dto)]`); the
//! engine then converts in both directions from that description:
//!
//! - [`Dto::from_array`]: raw data → typed object
//! - [`Dto::to_array`]: typed object → raw data

extern crate self as dtokit;

pub mod config;
pub mod converter;
pub mod dto;
pub mod engine;
pub mod error;
pub mod field;
pub mod json_string;
pub mod metadata;
pub mod rule;
pub mod schema;
pub mod types;
pub mod value;

pub use config::EngineConfig;
pub use converter::{
    ArrayConverter, BuildConverter, Converter, DateTimeConverter, DefaultConverter, MapConverter,
};
pub use dto::Dto;
pub use error::{DtoError, ErrorKind};
pub use field::FieldValue;
pub use json_string::{JsonFlags, JsonString};
pub use rule::{Convert, ConvertRule, ConverterArg, ConverterRef};
pub use schema::{FieldDecl, Schema};
pub use types::{EnumType, ObjectType, TypeSet, TypeToken};
pub use value::{Object, Raw, RawMap, Value};

pub use dtokit_derive::{Dto, DtoEnum};
