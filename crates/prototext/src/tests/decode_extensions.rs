use super::support::{decode_source, parse_as, parse_discarding, parse_with, pool};
use crate::{
    DecodeError, DynamicMessage, Resolver, ResolverError, UnmarshalOptions, Value,
};

#[test]
fn extension_by_full_name() {
    let msg = parse_as("test.Extendable", "[test.ext_i32]: 7").unwrap();
    assert_eq!(msg.get_by_number(100), Some(&Value::I32(7)));
}

#[test]
fn unresolved_extensions_are_unknown_fields() {
    let err = parse_as("test.Extendable", "[test.nope]: 1").unwrap_err();
    assert_eq!(
        *decode_source(&err),
        DecodeError::UnknownField("[test.nope]".into())
    );

    let msg = parse_discarding("test.Extendable", "[test.nope]: 1 x: 2").unwrap();
    assert_eq!(msg.get_by_number(1), Some(&Value::I32(2)));
}

#[test]
fn extension_with_the_wrong_container() {
    let err = parse_as("test.Extendable", "[test.wrong_container]: 1").unwrap_err();
    assert_eq!(
        *decode_source(&err),
        DecodeError::CannotExtend {
            message: "test.Extendable".into(),
            extension: "test.wrong_container".into(),
        }
    );
}

#[test]
fn extension_outside_the_declared_ranges() {
    let err = parse_as("test.Extendable", "[test.out_of_range]: 1").unwrap_err();
    assert!(matches!(decode_source(&err), DecodeError::CannotExtend { .. }));
}

#[test]
fn numeric_labels_are_rejected_even_when_resolvable() {
    // 1 is a member field, 100 a registered extension; both resolve and are
    // still refused.
    let err = parse_as("test.Extendable", "1: 5").unwrap_err();
    assert_eq!(*decode_source(&err), DecodeError::FieldByNumber("1".into()));

    let err = parse_as("test.Extendable", "100: 5").unwrap_err();
    assert_eq!(*decode_source(&err), DecodeError::FieldByNumber("100".into()));
}

#[test]
fn field_numbers_out_of_protobuf_range() {
    let err = parse_as("test.Extendable", "0: 1").unwrap_err();
    assert_eq!(*decode_source(&err), DecodeError::InvalidFieldNumber(0));

    let err = parse_as("test.Extendable", "536870912: 1").unwrap_err();
    assert_eq!(
        *decode_source(&err),
        DecodeError::InvalidFieldNumber(536_870_912)
    );
}

struct FailingResolver;

impl Resolver for FailingResolver {
    fn find_message_by_url(
        &self,
        _url: &str,
    ) -> Result<crate::descriptor::MessageDescriptor, ResolverError> {
        Err(ResolverError::Failed("registry offline".into()))
    }

    fn find_extension_by_name(
        &self,
        _full_name: &str,
    ) -> Result<crate::descriptor::FieldDescriptor, ResolverError> {
        Err(ResolverError::Failed("registry offline".into()))
    }

    fn find_extension_by_number(
        &self,
        _extendee: &str,
        _number: u32,
    ) -> Result<crate::descriptor::FieldDescriptor, ResolverError> {
        Err(ResolverError::Failed("registry offline".into()))
    }
}

#[test]
fn resolver_failures_other_than_not_found_are_fatal() {
    let err = parse_with(
        "test.Extendable",
        "[test.ext_i32]: 1",
        UnmarshalOptions {
            resolver: Some(&FailingResolver),
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(matches!(
        decode_source(&err),
        DecodeError::UnresolvableExtension { name, reason }
            if name == "test.ext_i32" && reason.contains("registry offline")
    ));
}

#[test]
fn the_default_registry_is_empty() {
    let desc = pool().message_by_name("test.Extendable").unwrap();
    let mut msg = DynamicMessage::new(desc);
    let err = crate::unmarshal(b"[test.ext_i32]: 1", &mut msg).unwrap_err();
    assert_eq!(
        *decode_source(&err),
        DecodeError::UnknownField("[test.ext_i32]".into())
    );
}
