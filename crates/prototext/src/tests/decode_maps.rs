use super::support::{decode_source, get, message, parse, parse_discarding, syntax_source};
use crate::{DecodeError, MapKey, SyntaxError, Value};

fn string_map(msg: &crate::DynamicMessage) -> Vec<(String, i32)> {
    get(msg, "m")
        .and_then(Value::as_map)
        .map(|m| {
            m.iter()
                .map(|(k, v)| match (k, v) {
                    (MapKey::String(k), Value::I32(v)) => (k.clone(), *v),
                    other => panic!("unexpected entry {other:?}"),
                })
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn canonical_and_bracketed_entries() {
    let msg = parse(
        r#"m { key: "x" value: 1 }  m: [ { key:"y" value:2 } { key:"z" value:3 } ]"#,
    )
    .unwrap();
    assert_eq!(
        string_map(&msg),
        [("x".into(), 1), ("y".into(), 2), ("z".into(), 3)]
    );
}

#[test]
fn absent_value_uses_the_default() {
    let msg = parse(r#"m { key: "x" }"#).unwrap();
    assert_eq!(string_map(&msg), [("x".into(), 0)]);
}

#[test]
fn absent_key_uses_the_default() {
    let msg = parse("m { value: 5 }").unwrap();
    assert_eq!(string_map(&msg), [(String::new(), 5)]);
}

#[test]
fn entry_fields_in_either_order() {
    let msg = parse(r#"m { value: 9 key: "k" }"#).unwrap();
    assert_eq!(string_map(&msg), [("k".into(), 9)]);
}

#[test]
fn message_valued_entries() {
    let msg = parse("mi { key: 1 value { k: 2 } }").unwrap();
    let map = get(&msg, "mi").and_then(Value::as_map).unwrap();
    let value = map.get(&MapKey::I32(1)).and_then(Value::as_message).unwrap();
    assert_eq!(value.get_by_number(1), Some(&Value::I32(2)));

    // The separator is optional before a message value.
    let with_sep = parse("mi { key: 1 value: { k: 2 } }").unwrap();
    assert_eq!(msg, with_sep);
}

#[test]
fn absent_message_value_becomes_an_empty_message() {
    let msg = parse("mi { key: 3 }").unwrap();
    let map = get(&msg, "mi").and_then(Value::as_map).unwrap();
    assert_eq!(
        map.get(&MapKey::I32(3)),
        Some(&Value::Message(message("test.Item")))
    );
}

#[test]
fn later_entries_overwrite_earlier_keys() {
    let msg = parse(r#"m { key: "x" value: 1 }  m { key: "x" value: 9 }"#).unwrap();
    assert_eq!(string_map(&msg), [("x".into(), 9)]);
}

#[test]
fn duplicate_key_within_an_entry() {
    let err = parse(r#"m { key: "x" key: "y" }"#).unwrap_err();
    assert_eq!(*decode_source(&err), DecodeError::DuplicateMapKey);
}

#[test]
fn duplicate_value_within_an_entry() {
    let err = parse(r#"m { key: "x" value: 1 value: 2 }"#).unwrap_err();
    assert_eq!(*decode_source(&err), DecodeError::DuplicateMapValue);
}

#[test]
fn key_requires_a_separator() {
    let err = parse(r#"m { key "x" }"#).unwrap_err();
    assert_eq!(*syntax_source(&err), SyntaxError::MissingSeparator);
}

#[test]
fn scalar_value_requires_a_separator() {
    let err = parse(r#"m { key: "x" value 1 }"#).unwrap_err();
    assert_eq!(*syntax_source(&err), SyntaxError::MissingSeparator);
}

#[test]
fn unknown_entry_field() {
    let err = parse(r#"m { key: "x" foo: 1 }"#).unwrap_err();
    assert_eq!(
        *decode_source(&err),
        DecodeError::UnknownMapEntryField("foo".into())
    );

    let msg = parse_discarding("test.Composite", r#"m { key: "x" foo: 1 value: 2 }"#).unwrap();
    assert_eq!(string_map(&msg), [("x".into(), 2)]);
}

#[test]
fn extension_name_in_an_entry_is_unknown() {
    let err = parse(r#"m { [test.ext_i32]: 1 key: "x" }"#).unwrap_err();
    assert_eq!(
        *decode_source(&err),
        DecodeError::UnknownMapEntryField("[test.ext_i32]".into())
    );

    let msg =
        parse_discarding("test.Composite", r#"m { [test.ext_i32]: 1 key: "x" }"#).unwrap();
    assert_eq!(string_map(&msg), [("x".into(), 0)]);
}

#[test]
fn bad_key_kind_is_an_invalid_value() {
    let err = parse(r#"mi { key: "nope" }"#).unwrap_err();
    assert!(matches!(decode_source(&err), DecodeError::InvalidValue { .. }));
}
