use super::support::{get, parse_as, parse_with};
use crate::{Error, UnmarshalOptions, Value};

#[test]
fn missing_required_field_fails_after_the_parse() {
    let err = parse_as("test.Req", "opt: 1").unwrap_err();
    assert_eq!(
        err,
        Error::Uninitialized {
            name: "test.Req.id".into(),
        }
    );
    assert_eq!(err.to_string(), "required field test.Req.id not set");
}

#[test]
fn allow_partial_suppresses_the_check() {
    let msg = parse_with(
        "test.Req",
        "opt: 1",
        UnmarshalOptions {
            allow_partial: true,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(get(&msg, "opt"), Some(&Value::I32(1)));
}

#[test]
fn present_required_field_is_fine() {
    let msg = parse_as("test.Req", "id: 5").unwrap();
    assert_eq!(get(&msg, "id"), Some(&Value::I32(5)));
}

#[test]
fn the_check_recurses_into_sub_messages() {
    let err = parse_as("test.HasReq", "r { opt: 1 }").unwrap_err();
    assert_eq!(
        err,
        Error::Uninitialized {
            name: "test.Req.id".into(),
        }
    );

    let msg = parse_as("test.HasReq", "r { id: 2 }").unwrap();
    assert!(get(&msg, "r").is_some());
}

#[test]
fn an_absent_sub_message_is_not_checked() {
    // The required field lives in test.Req; with no r set there is nothing
    // to check.
    let msg = parse_as("test.HasReq", "").unwrap();
    assert_eq!(get(&msg, "r"), None);
}
