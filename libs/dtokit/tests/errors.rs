mod common;

use dtokit::{Dto, DtoError, ErrorKind, FieldDecl, Raw, Schema, Value};
use rstest::rstest;
use serde_json::json;

use common::*;

#[rstest]
#[case::missing_required(json!({"b": "aa", "c": false, "d": null, "e": 1.0}), ErrorKind::MissingProperty)]
#[case::wrong_scalar(json!({"a": 1, "b": "aa", "c": false, "d": null, "e": 1.0}), ErrorKind::TypeMismatch)]
#[case::null_for_required(json!({"a": null, "b": "aa", "c": false, "d": null, "e": 1.0}), ErrorKind::TypeMismatch)]
#[case::not_a_map(json!("abc"), ErrorKind::TypeMismatch)]
fn from_array_failures(#[case] raw: Raw, #[case] kind: ErrorKind) {
    assert_eq!(TypeA::from_array(&raw).unwrap_err().kind(), kind);
}

#[test]
fn missing_property_names_type_and_field() {
    let err = TypeA::from_array(&json!({})).unwrap_err();
    assert_eq!(err.to_string(), "missing property: TypeA.a");
}

#[test]
fn nested_errors_carry_the_field_path() {
    let err = TypeB::from_array(&json!({"a": "x", "ba": {"ba1": 3}})).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingProperty);
    assert_eq!(err.to_string(), "missing property: ba: TypeBA.ba2");
}

#[test]
fn malformed_json_string_is_a_mismatch() {
    let err = TypeC::from_array(&json!({"a": "123", "ba": "{ba1"})).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);

    let err = TypeC::from_array(&json!({"a": "123", "ba": {"ba1": 3, "ba2": 4}})).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[test]
fn unknown_enum_case_is_a_mismatch() {
    let err = TypeD::from_array(&json!({"a": null, "b": "C"})).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[rstest]
#[case::wrong_item_type(json!({"a": [1, 2, 3], "b": [4, 5, 6]}))]
#[case::sparse_keys(json!({"a": [1, 2, 3], "b": {"4": 6, "5": 2, "6": 3}}))]
#[case::not_a_list(json!({"a": [1, 2, 3], "b": "4,5,6"}))]
fn array_converter_rejects(#[case] raw: Raw) {
    let err = TypeArrConverter::from_array(&raw).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[test]
fn unregistered_converter_name_is_unsupported() {
    let err = TypeUnknownConverter::from_array(&json!({"a": 1})).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedConverter);
    assert!(err.to_string().contains("TypeUnknownConverter.a"));
}

#[test]
fn datetime_field_needs_a_datetime_string() {
    let raw = json!({
        "a": "not a date",
        "b": "2022-02-01 00:00:00",
        "c": "2022-03-01 00:00:00",
        "d": "2022-04-01"
    });
    let err = TypeDateTime::from_array(&raw).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert!(err.to_string().contains("a: 'not a date'"));
}

/// Hand-written `Dto` whose schema binds an ignored field to the constructor.
#[derive(Debug, Clone)]
struct IgnoredParam {
    c: i64,
}

impl Dto for IgnoredParam {
    const NAME: &'static str = "IgnoredParam";

    fn schema() -> Schema {
        Schema::builder()
            .field(FieldDecl::of::<i64>("c").ignore())
            .param("c", None)
            .build()
    }

    fn construct(args: Vec<Value>) -> Result<Self, DtoError> {
        let c = match args.into_iter().next() {
            Some(Value::Int(c)) => c,
            _ => return Err(DtoError::missing_argument(Self::NAME, "c")),
        };
        Ok(Self { c })
    }

    fn assign(&mut self, field: &str, _value: Value) -> Result<(), DtoError> {
        Err(DtoError::unknown_field(Self::NAME, field))
    }

    fn read(&self, field: &str) -> Result<Value, DtoError> {
        match field {
            "c" => Ok(Value::Int(self.c)),
            _ => Err(DtoError::unknown_field(Self::NAME, field)),
        }
    }
}

#[test]
fn ignored_constructor_parameter_is_invalid_both_ways() {
    let err = IgnoredParam::from_array(&json!({"c": 1})).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidFieldDeclaration);

    let err = IgnoredParam { c: 1 }.to_array(&[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidFieldDeclaration);
}

#[test]
fn to_array_reports_unconvertible_values() {
    let bad = TypeA {
        a: "x".into(),
        b: "y".into(),
        c: true,
        d: None,
        e: f64::NAN,
    };
    let err = bad.to_array(&[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert!(err.to_string().contains("e: "));
}
