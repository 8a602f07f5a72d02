#![allow(dead_code)]

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde_json::json;

use dtokit::{
    ArrayConverter, BuildConverter, Converter, ConverterArg, DateTimeConverter, Dto, DtoEnum,
    DtoError, MapConverter, Raw, TypeSet, Value,
};

#[derive(Debug, Clone, PartialEq, Dto)]
pub struct TypeA {
    pub a: String,
    pub b: String,
    pub c: bool,
    pub d: Option<i64>,
    pub e: f64,
}

#[derive(Debug, Clone, PartialEq, Dto)]
pub struct TypeBA {
    pub ba1: i64,
    pub ba2: i64,
}

#[derive(Debug, Clone, PartialEq, Dto)]
pub struct TypeB {
    pub a: String,
    pub ba: TypeBA,
}

#[derive(Debug, Clone, PartialEq, Dto)]
pub struct TypeC {
    pub a: String,
    #[dto(json_string)]
    pub ba: TypeBA,
}

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, DtoEnum)]
pub enum EnumA {
    A,
    B,
    cc,
}

#[derive(Debug, Clone, PartialEq, Dto)]
pub struct TypeD {
    pub a: Option<String>,
    pub b: EnumA,
}

#[derive(Debug, Clone, PartialEq, Dto)]
pub struct TypeE {
    pub a: Option<String>,
    #[dto(omit_null)]
    pub b: Option<String>,
}

/// Doubles on the way in, halves on the way out.
pub struct Doubling;

impl Converter for Doubling {
    fn convert_from(&self, raw: Raw, field: &str) -> Result<Value, DtoError> {
        raw.as_i64()
            .map(|i| Value::Int(i * 2))
            .ok_or_else(|| DtoError::type_mismatch(field, "expected int"))
    }

    fn convert_to(&self, value: Value) -> Result<Raw, DtoError> {
        match value {
            Value::Int(i) => Ok(json!(i / 2)),
            other => Err(DtoError::TypeMismatch(format!(
                "expected int, got {}",
                other.kind_name()
            ))),
        }
    }
}

impl BuildConverter for Doubling {
    fn build(_types: TypeSet, _args: &[ConverterArg]) -> Result<Self, DtoError> {
        Ok(Doubling)
    }
}

#[derive(Debug, Clone, PartialEq, Dto)]
pub struct TypeF {
    pub a: Option<String>,
    #[dto(convert(Doubling))]
    pub b: i64,
}

#[derive(Debug, Clone, PartialEq, Dto)]
pub struct TypeFNamed {
    #[dto(convert("doubling"))]
    pub b: i64,
}

#[derive(Debug, Clone, PartialEq, Dto)]
pub struct TypeArr {
    pub a: Vec<i64>,
    pub b: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Dto)]
pub struct TypeArrConverter {
    pub a: Vec<i64>,
    #[dto(convert(ArrayConverter, TypeSet::of::<String>()))]
    pub b: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Dto)]
pub struct TypeMap {
    pub a: i64,
    #[dto(convert(MapConverter, TypeSet::of::<Option<String>>()))]
    pub b: IndexMap<String, Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Dto)]
pub struct TypeNestedMap {
    pub a: i64,
    #[dto(convert(MapConverter, TypeSet::of::<Option<TypeBA>>()))]
    pub b: IndexMap<String, Option<TypeBA>>,
}

#[derive(Debug, Clone, PartialEq, Dto)]
pub struct TypeRawName {
    #[dto(rename = "arg_name")]
    pub arg: i64,
    #[dto(rename = "vID")]
    pub v_id: i64,
}

#[derive(Debug, Clone, PartialEq, Dto)]
pub struct TypeDateTime {
    #[dto(convert(DateTimeConverter))]
    pub a: DateTime<FixedOffset>,
    #[dto(convert(DateTimeConverter, 9, DateTimeConverter::YMD_HIS))]
    pub b: DateTime<FixedOffset>,
    #[dto(convert(DateTimeConverter, 8, DateTimeConverter::YMD_HISU))]
    pub c: DateTime<FixedOffset>,
    #[dto(convert(DateTimeConverter))]
    pub d: NaiveDateTime,
}

pub fn april_first() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2022, 4, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Dto)]
pub struct TypeDefaultValue {
    #[dto(lazy, init = true)]
    pub g: bool,
    pub a: Option<String>,
    #[dto(default = false)]
    pub b: bool,
    pub c: i64,
    #[dto(default = vec![1, 2, 3])]
    pub e: Vec<i64>,
    #[dto(default_with = april_first, convert(DateTimeConverter))]
    pub d: NaiveDateTime,
    #[dto(ctor_default = 111)]
    pub f: i64,
}

#[derive(Debug, Clone, PartialEq, Dto)]
pub struct TypeIgnore {
    #[dto(ignore, init = 100)]
    pub c: i64,
    #[dto(ignore)]
    pub d: Option<i64>,
    #[dto(ignore)]
    pub e: HashSet<u8>,
    pub a: i64,
    pub b: i64,
}

/// `secret` is a constructor parameter without a public field, so it never
/// receives a value and construction stops in front of it.
#[derive(Debug, Clone, PartialEq, Dto)]
pub struct TypeGap {
    pub a: i64,
    #[dto(hidden, ctor_default = 7)]
    secret: i64,
    #[dto(ctor_default = 5)]
    pub c: i64,
}

impl TypeGap {
    pub fn secret(&self) -> i64 {
        self.secret
    }
}

#[derive(Debug, Clone, PartialEq, Dto)]
pub struct TypeGapRequired {
    pub a: i64,
    #[dto(hidden)]
    secret: i64,
}

#[derive(Debug, Clone, PartialEq, Dto)]
pub struct TypeLiteralOverNull {
    #[dto(default = Some(false))]
    pub x: Option<bool>,
    #[dto(default = None)]
    pub y: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Dto)]
pub struct TypeUnknownConverter {
    #[dto(convert("no-such-converter"))]
    pub a: i64,
}

#[derive(Debug, Clone, PartialEq, Dto)]
pub struct TypeJsonList {
    #[dto(json_string(empty_item_is_array, max_depth = 3))]
    pub tags: Vec<String>,
    #[dto(json_string, omit_null)]
    pub extra: Option<Raw>,
}

/// Keys of a raw object in order.
pub fn keys(raw: &Raw) -> Vec<&str> {
    raw.as_object()
        .map(|m| m.keys().map(String::as_str).collect())
        .unwrap_or_default()
}
