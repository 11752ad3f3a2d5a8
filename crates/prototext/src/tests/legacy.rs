//! Behavior behind the `legacy` feature: proto1 MessageSets and unlinked
//! weak fields.

use super::support::decode_source;
use crate::descriptor::{DescriptorPool, FieldDef, FieldType, MessageDef, Schema};
use crate::{DecodeError, DynamicMessage, TypeRegistry, UnmarshalOptions, Value};

fn legacy_pool() -> DescriptorPool {
    DescriptorPool::new(
        Schema::new()
            .message(
                MessageDef::new("test.Set")
                    .message_set()
                    .extension_range(100, 536_870_911),
            )
            .message(
                MessageDef::new("test.ItemMsg").field(FieldDef::new("n", 1, FieldType::Int32)),
            )
            .extension(
                "test.Set",
                FieldDef::new(
                    "test.ItemMsg.message_set_extension",
                    100,
                    FieldType::Message("test.ItemMsg".into()),
                ),
            )
            // Named like item extensions, but not ones: wrong kind, and a
            // message type that is not the named message.
            .extension(
                "test.Set",
                FieldDef::new("test.Wrong.message_set_extension", 101, FieldType::Int32),
            )
            .extension(
                "test.Set",
                FieldDef::new(
                    "test.Mismatch.message_set_extension",
                    102,
                    FieldType::Message("test.ItemMsg".into()),
                ),
            )
            .message(
                MessageDef::new("test.WeakHolder").field(
                    FieldDef::new("w", 1, FieldType::Message("test.NotLinked".into())).weak(),
                ),
            ),
    )
    .expect("legacy schema resolves")
}

fn parse(full_name: &str, input: &str, discard_unknown: bool) -> Result<DynamicMessage, crate::Error> {
    let pool = legacy_pool();
    let registry = TypeRegistry::with_pool(pool.clone());
    let mut msg = DynamicMessage::new(pool.message_by_name(full_name).unwrap());
    UnmarshalOptions {
        discard_unknown,
        resolver: Some(&registry),
        ..Default::default()
    }
    .unmarshal(input.as_bytes(), &mut msg)?;
    Ok(msg)
}

#[test]
fn message_sets_parse() {
    let msg = parse("test.Set", "", false).unwrap();
    assert_eq!(msg.entries().count(), 0);
}

#[test]
fn message_set_items_resolve_through_the_extension_fallback() {
    let msg = parse("test.Set", "[test.ItemMsg] { n: 3 }", false).unwrap();
    let item = msg.get_by_number(100).and_then(Value::as_message).unwrap();
    assert_eq!(item.get_by_number(1), Some(&Value::I32(3)));
}

#[test]
fn message_set_fallback_rejects_non_item_extensions() {
    // An extension merely named `*.message_set_extension` does not resolve
    // unless it is a singular message field of the named type.
    let err = parse("test.Set", "[test.Wrong] { n: 1 }", false).unwrap_err();
    assert_eq!(
        *decode_source(&err),
        DecodeError::UnknownField("[test.Wrong]".into())
    );

    let err = parse("test.Set", "[test.Mismatch] { n: 1 }", false).unwrap_err();
    assert_eq!(
        *decode_source(&err),
        DecodeError::UnknownField("[test.Mismatch]".into())
    );
}

#[test]
fn unlinked_weak_fields_are_unknown() {
    let err = parse("test.WeakHolder", "w { x: 1 }", false).unwrap_err();
    assert_eq!(*decode_source(&err), DecodeError::UnknownField("w".into()));

    let msg = parse("test.WeakHolder", "w { x: 1 }", true).unwrap();
    assert_eq!(msg.entries().count(), 0);
}
