mod common;

use chrono::{Datelike, Timelike};
use dtokit::converter::registry;
use dtokit::{ConverterRef, Dto, Raw};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

use common::*;

fn round_trip<T: Dto>(raw: Raw) -> Raw {
    let obj = T::from_array(&raw).unwrap();
    obj.to_array(&[]).unwrap()
}

#[rstest]
#[case::basic(json!({"a": "123", "b": "aa", "c": false, "d": null, "e": 123.123}))]
#[case::nullable_set(json!({"a": "123", "b": "aa", "c": true, "d": 4, "e": 1.5}))]
fn scalars_round_trip(#[case] raw: Raw) {
    assert_eq!(round_trip::<TypeA>(raw.clone()), raw);
}

#[test]
fn output_follows_declaration_order() {
    let raw = json!({"e": 2.5, "d": 1, "c": true, "b": "y", "a": "x"});
    let out = TypeA::from_array(&raw).unwrap().to_array(&[]).unwrap();
    assert_eq!(keys(&out), vec!["a", "b", "c", "d", "e"]);
}

#[test]
fn except_leaves_fields_out() {
    let obj = TypeA::from_array(&json!({"a": "123", "b": "aa", "c": false, "d": null, "e": 1.0}))
        .unwrap();
    assert_eq!(
        obj.to_array(&["b", "e"]).unwrap(),
        json!({"a": "123", "c": false, "d": null})
    );
}

#[test]
fn nested_object() {
    let raw = json!({"a": "123", "ba": {"ba1": 3, "ba2": 4}});
    let obj = TypeB::from_array(&raw).unwrap();
    assert_eq!(obj.ba, TypeBA { ba1: 3, ba2: 4 });
    assert_eq!(obj.to_array(&[]).unwrap(), raw);
}

#[test]
fn nested_json_string() {
    let raw = json!({"a": "123", "ba": r#"{"ba1":3,"ba2":4}"#});
    let obj = TypeC::from_array(&raw).unwrap();
    assert_eq!(obj.ba, TypeBA { ba1: 3, ba2: 4 });
    assert_eq!(obj.to_array(&[]).unwrap(), raw);
}

#[test]
fn json_string_collections() {
    let raw = json!({"tags": r#"["x","y"]"#, "extra": r#"{"k":[1,2]}"#});
    let obj = TypeJsonList::from_array(&raw).unwrap();
    assert_eq!(obj.tags, vec!["x".to_string(), "y".to_string()]);
    assert_eq!(obj.extra, Some(json!({"k": [1, 2]})));
    assert_eq!(obj.to_array(&[]).unwrap(), raw);

    let empty = TypeJsonList {
        tags: Vec::new(),
        extra: None,
    };
    assert_eq!(empty.to_array(&[]).unwrap(), json!({"tags": "{}", "extra": "null"}));
    assert_eq!(
        TypeJsonList::from_array(&json!({"tags": "{}"})).unwrap(),
        empty
    );
}

#[test]
fn json_string_null_is_encoded_not_omitted() {
    let obj = TypeJsonList {
        tags: vec!["x".into()],
        extra: None,
    };
    let raw = obj.to_array(&[]).unwrap();
    assert_eq!(raw, json!({"tags": r#"["x"]"#, "extra": "null"}));
    assert_eq!(TypeJsonList::from_array(&raw).unwrap(), obj);
}

#[rstest]
#[case("A", EnumA::A)]
#[case("B", EnumA::B)]
#[case("cc", EnumA::cc)]
fn enum_by_case_name(#[case] name: &str, #[case] expected: EnumA) {
    let raw = json!({"a": "123", "b": name});
    let obj = TypeD::from_array(&raw).unwrap();
    assert_eq!(obj.b, expected);
    assert_eq!(obj.to_array(&[]).unwrap(), raw);
}

#[test]
fn omitted_null_is_restored_as_null() {
    let raw = json!({"a": null});
    let obj = TypeE::from_array(&raw).unwrap();
    assert_eq!(obj, TypeE { a: None, b: None });
    assert_eq!(obj.to_array(&[]).unwrap(), raw);

    let set = TypeE {
        a: None,
        b: Some("x".into()),
    };
    assert_eq!(set.to_array(&[]).unwrap(), json!({"a": null, "b": "x"}));
}

#[test]
fn typed_custom_converter() {
    let raw = json!({"a": "123", "b": 123});
    let obj = TypeF::from_array(&raw).unwrap();
    assert_eq!(obj.b, 246);
    assert_eq!(obj.to_array(&[]).unwrap(), raw);
}

#[test]
fn named_custom_converter() {
    registry::register("doubling", ConverterRef::of::<Doubling>()).unwrap();
    let obj = TypeFNamed::from_array(&json!({"b": 21})).unwrap();
    assert_eq!(obj.b, 42);
    assert_eq!(obj.to_array(&[]).unwrap(), json!({"b": 21}));
}

#[test]
fn plain_arrays() {
    let raw = json!({"a": [1, 2, 3], "b": [4, 5, 6]});
    assert_eq!(round_trip::<TypeArr>(raw.clone()), raw);
}

#[test]
fn array_converter_with_item_types() {
    let raw = json!({"a": [1, 2, 3], "b": ["1", "2", "3"]});
    assert_eq!(round_trip::<TypeArrConverter>(raw.clone()), raw);
}

#[test]
fn map_keeps_keys_and_order() {
    let raw = json!({"a": 1, "b": {"1": "1", "2": null, "ba": "3"}});
    let obj = TypeMap::from_array(&raw).unwrap();
    assert_eq!(obj.b.keys().collect::<Vec<_>>(), vec!["1", "2", "ba"]);
    let out = obj.to_array(&[]).unwrap();
    assert_eq!(out, raw);
    assert_eq!(keys(&out["b"]), vec!["1", "2", "ba"]);

    let arbitrary = json!({"a": 0, "b": {"x": "1", "y": null}});
    assert_eq!(round_trip::<TypeMap>(arbitrary.clone()), arbitrary);
}

#[test]
fn map_of_nested_objects() {
    let raw = json!({
        "a": 1,
        "b": {
            "aaa": {"ba1": 1, "ba2": 2},
            "xed": null,
            "ccc": {"ba1": 3, "ba2": 4}
        }
    });
    let obj = TypeNestedMap::from_array(&raw).unwrap();
    assert_eq!(obj.b["aaa"], Some(TypeBA { ba1: 1, ba2: 2 }));
    assert_eq!(obj.b["xed"], None);
    assert_eq!(obj.to_array(&[]).unwrap(), raw);
}

#[test]
fn raw_key_alias_is_used_exclusively() {
    let raw = json!({"arg_name": 1, "vID": 2});
    let obj = TypeRawName::from_array(&raw).unwrap();
    assert_eq!(obj, TypeRawName { arg: 1, v_id: 2 });
    assert_eq!(obj.to_array(&[]).unwrap(), raw);

    assert!(TypeRawName::from_array(&json!({"arg": 1, "v_id": 2})).is_err());
}

#[test]
fn datetime_formats() {
    let raw = json!({
        "a": "2022-01-01 10:11:22",
        "b": "2022-02-01T12:34:56.1234+09:00",
        "c": "2022-03-01T00:00:00.1234+09:00",
        "d": "2022-04-01"
    });
    let obj = TypeDateTime::from_array(&raw).unwrap();
    assert_eq!(obj.b.offset().local_minus_utc(), 9 * 3600);
    assert_eq!(obj.b.nanosecond(), 123_400_000);
    assert_eq!(obj.d.day(), 1);
    assert_eq!(
        obj.to_array(&[]).unwrap(),
        json!({
            "a": "2022-01-01 10:11:22",
            "b": "2022-02-01 12:34:56",
            "c": "2022-03-01 00:00:00.123400",
            "d": "2022-04-01 00:00:00"
        })
    );
}
