use super::support::{decode_source, get, parse, parse_as, parse_discarding, syntax_source};
use crate::{DecodeError, SyntaxError, Value};

fn url(msg: &crate::DynamicMessage) -> Option<&Value> {
    msg.get_by_number(1)
}

fn payload(msg: &crate::DynamicMessage) -> Option<&Value> {
    msg.get_by_number(2)
}

#[test]
fn canonical_form_writes_through() {
    let msg = parse_as(
        "google.protobuf.Any",
        r#"type_url: "types/test.Payload" value: "\x08\x2a""#,
    )
    .unwrap();
    assert_eq!(url(&msg), Some(&Value::String("types/test.Payload".into())));
    assert_eq!(payload(&msg), Some(&Value::Bytes(vec![0x08, 0x2A])));
}

#[test]
fn expanded_form_reserializes_the_body() {
    let msg = parse_as("google.protobuf.Any", "[types/test.Payload] { n: 42 }").unwrap();
    assert_eq!(url(&msg), Some(&Value::String("types/test.Payload".into())));
    assert_eq!(payload(&msg), Some(&Value::Bytes(vec![0x08, 0x2A])));
}

#[test]
fn expanded_and_canonical_forms_agree() {
    let canonical = parse_as(
        "google.protobuf.Any",
        r#"type_url: "types/test.Payload" value: "\x08\x2a""#,
    )
    .unwrap();
    let expanded = parse_as("google.protobuf.Any", "[types/test.Payload] { n: 42 }").unwrap();
    assert_eq!(canonical, expanded);
}

#[test]
fn any_nested_inside_another_message() {
    let msg = parse("any { [types/test.Payload] { n: 7 } }").unwrap();
    let any = get(&msg, "any").and_then(Value::as_message).unwrap();
    assert_eq!(url(any), Some(&Value::String("types/test.Payload".into())));
    assert_eq!(payload(any), Some(&Value::Bytes(vec![0x08, 0x07])));
}

#[test]
fn empty_any_is_valid() {
    let msg = parse_as("google.protobuf.Any", "").unwrap();
    assert_eq!(url(&msg), None);
    assert_eq!(payload(&msg), None);
}

#[test]
fn type_url_alone_is_valid() {
    let msg = parse_as("google.protobuf.Any", r#"type_url: "types/test.Payload""#).unwrap();
    assert_eq!(url(&msg), Some(&Value::String("types/test.Payload".into())));
    assert_eq!(payload(&msg), None);
}

#[test]
fn empty_value_is_not_written() {
    let msg = parse_as("google.protobuf.Any", r#"value: """#).unwrap();
    assert_eq!(payload(&msg), None);
}

#[test]
fn expanded_after_canonical_conflicts() {
    let err = parse_as(
        "google.protobuf.Any",
        r#"type_url: "t" [types/test.Payload] { n: 1 }"#,
    )
    .unwrap_err();
    assert_eq!(*decode_source(&err), DecodeError::ConflictWithTypeUrl);

    let err = parse_as(
        "google.protobuf.Any",
        r#"value: "\x08\x01" [types/test.Payload] { n: 1 }"#,
    )
    .unwrap_err();
    assert_eq!(*decode_source(&err), DecodeError::ConflictWithValue);
}

#[test]
fn canonical_after_expanded_conflicts() {
    let err = parse_as(
        "google.protobuf.Any",
        r#"[types/test.Payload] { n: 1 } type_url: "t""#,
    )
    .unwrap_err();
    assert_eq!(
        *decode_source(&err),
        DecodeError::ConflictWithExpanded("types/test.Payload".into())
    );

    let err = parse_as(
        "google.protobuf.Any",
        r#"[types/test.Payload] { n: 1 } value: "x""#,
    )
    .unwrap_err();
    assert_eq!(
        *decode_source(&err),
        DecodeError::ConflictWithExpanded("types/test.Payload".into())
    );
}

#[test]
fn two_expanded_forms_conflict() {
    let err = parse_as(
        "google.protobuf.Any",
        "[types/test.Payload] { n: 1 } [types/test.Payload] { n: 2 }",
    )
    .unwrap_err();
    assert_eq!(*decode_source(&err), DecodeError::MultipleAnyTypes);
}

#[test]
fn duplicate_canonical_fields() {
    let err = parse_as("google.protobuf.Any", r#"type_url: "a" type_url: "b""#).unwrap_err();
    assert_eq!(*decode_source(&err), DecodeError::DuplicateAnyTypeUrl);

    let err = parse_as("google.protobuf.Any", r#"value: "a" value: "b""#).unwrap_err();
    assert_eq!(*decode_source(&err), DecodeError::DuplicateAnyValue);
}

#[test]
fn unknown_field_names_are_invalid() {
    let err = parse_as("google.protobuf.Any", "foo: 1").unwrap_err();
    assert_eq!(
        *decode_source(&err),
        DecodeError::InvalidAnyFieldName("foo".into())
    );

    // With a separator, an unknown field (even message-valued) is skippable.
    let msg = parse_discarding("google.protobuf.Any", r#"foo: { x: 1 } type_url: "t""#).unwrap();
    assert_eq!(url(&msg), Some(&Value::String("t".into())));
}

#[test]
fn unknown_fields_in_any_require_separators_even_when_discarded() {
    let err = parse_discarding("google.protobuf.Any", "foo { x: 1 }").unwrap_err();
    assert_eq!(*syntax_source(&err), SyntaxError::MissingSeparator);
}

#[test]
fn numeric_field_names_are_invalid() {
    let err = parse_as("google.protobuf.Any", "1: \"t\"").unwrap_err();
    assert_eq!(
        *decode_source(&err),
        DecodeError::InvalidAnyFieldName("1".into())
    );

    let msg = parse_discarding("google.protobuf.Any", "1: \"t\"").unwrap();
    assert_eq!(url(&msg), None);
}

#[test]
fn canonical_fields_require_separators() {
    let err = parse_as("google.protobuf.Any", r#"type_url "t""#).unwrap_err();
    assert_eq!(*syntax_source(&err), SyntaxError::MissingSeparator);
}

#[test]
fn type_url_must_be_a_string() {
    let err = parse_as("google.protobuf.Any", "type_url: 1").unwrap_err();
    assert_eq!(
        *decode_source(&err),
        DecodeError::InvalidAnyTypeUrl("1".into())
    );
}

#[test]
fn unresolvable_expanded_type() {
    let err = parse_as("google.protobuf.Any", "[types/no.Such] { }").unwrap_err();
    assert!(matches!(
        decode_source(&err),
        DecodeError::UnresolvableAnyType { url, .. } if url == "types/no.Such"
    ));
}

#[test]
fn required_fields_inside_a_payload_are_not_checked() {
    // test.Req has a required field; Any payloads are marshaled
    // allow-partial.
    let msg = parse_as("google.protobuf.Any", "[types/test.Req] { opt: 1 }").unwrap();
    assert_eq!(payload(&msg), Some(&Value::Bytes(vec![0x10, 0x01])));
}
