//! Shared schema fixtures for the decoder tests.

use std::sync::OnceLock;

use crate::descriptor::{DescriptorPool, EnumDef, FieldDef, FieldType, MessageDef, Schema};
use crate::{
    DecodeError, DynamicMessage, Error, ErrorSource, SyntaxError, TypeRegistry, UnmarshalOptions,
    Value,
};

/// One pool for the whole test run, so messages parsed in separate calls
/// compare equal.
pub(crate) fn pool() -> &'static DescriptorPool {
    static POOL: OnceLock<DescriptorPool> = OnceLock::new();
    POOL.get_or_init(|| {
        let schema = Schema::new()
            .enumeration(
                EnumDef::new("test.Color")
                    .value("BLACK", 0)
                    .value("RED", 1)
                    .value("GREEN", 2),
            )
            .message(MessageDef::new("test.Item").field(FieldDef::new("k", 1, FieldType::Int32)))
            .message(
                MessageDef::new("test.Composite")
                    .oneof("choice")
                    .field(FieldDef::new("i32", 1, FieldType::Int32))
                    .field(FieldDef::new("name", 2, FieldType::String))
                    .field(FieldDef::new("tags", 3, FieldType::String).repeated())
                    .field(FieldDef::new("color", 4, FieldType::Enum("test.Color".into())))
                    .field(
                        FieldDef::new("items", 5, FieldType::Message("test.Item".into()))
                            .repeated(),
                    )
                    .field(FieldDef::new("inner", 6, FieldType::Message("test.Item".into())))
                    .field(FieldDef::new(
                        "m",
                        7,
                        FieldType::Map(Box::new(FieldType::String), Box::new(FieldType::Int32)),
                    ))
                    .field(FieldDef::new("a", 8, FieldType::Int32).in_oneof("choice"))
                    .field(FieldDef::new("b", 9, FieldType::Int32).in_oneof("choice"))
                    .field(FieldDef::new("data", 10, FieldType::Bytes))
                    .field(FieldDef::new("f32", 11, FieldType::Float))
                    .field(FieldDef::new("f64", 12, FieldType::Double))
                    .field(FieldDef::new("u32", 13, FieldType::Uint32))
                    .field(FieldDef::new("u64", 14, FieldType::Uint64))
                    .field(FieldDef::new("i64", 15, FieldType::Int64))
                    .field(FieldDef::new("flag", 16, FieldType::Bool))
                    .field(FieldDef::new("s32", 17, FieldType::Sint32))
                    .field(FieldDef::new(
                        "mi",
                        19,
                        FieldType::Map(
                            Box::new(FieldType::Int32),
                            Box::new(FieldType::Message("test.Item".into())),
                        ),
                    ))
                    .field(FieldDef::new(
                        "recur",
                        20,
                        FieldType::Message("test.Composite".into()),
                    ))
                    .field(FieldDef::new(
                        "mygroup",
                        21,
                        FieldType::Group("test.Composite.MyGroup".into()),
                    ))
                    .field(FieldDef::new(
                        "any",
                        22,
                        FieldType::Message("google.protobuf.Any".into()),
                    )),
            )
            .message(
                MessageDef::new("test.Composite.MyGroup")
                    .field(FieldDef::new("g", 1, FieldType::Int32)),
            )
            .message(
                MessageDef::new("test.Extendable")
                    .field(FieldDef::new("x", 1, FieldType::Int32))
                    .reserved("old_field")
                    .extension_range(100, 200),
            )
            .message(
                MessageDef::new("google.protobuf.Any")
                    .field(FieldDef::new("type_url", 1, FieldType::String))
                    .field(FieldDef::new("value", 2, FieldType::Bytes)),
            )
            .message(MessageDef::new("test.Payload").field(FieldDef::new("n", 1, FieldType::Int32)))
            .message(
                MessageDef::new("test.Req")
                    .field(FieldDef::new("id", 1, FieldType::Int32).required())
                    .field(FieldDef::new("opt", 2, FieldType::Int32)),
            )
            .message(
                MessageDef::new("test.HasReq")
                    .field(FieldDef::new("r", 1, FieldType::Message("test.Req".into()))),
            )
            .message(MessageDef::new("test.MsgSet").message_set().extension_range(100, 200))
            .extension(
                "test.Extendable",
                FieldDef::new("test.ext_i32", 100, FieldType::Int32),
            )
            .extension(
                "test.Extendable",
                FieldDef::new("test.out_of_range", 300, FieldType::Int32),
            )
            .extension(
                "test.Other",
                FieldDef::new("test.wrong_container", 100, FieldType::Int32),
            );
        DescriptorPool::new(schema).expect("fixture schema resolves")
    })
}

pub(crate) fn registry() -> TypeRegistry {
    TypeRegistry::with_pool(pool().clone())
}

pub(crate) fn message(full_name: &str) -> DynamicMessage {
    DynamicMessage::new(pool().message_by_name(full_name).expect("known fixture type"))
}

/// Parses into a fresh `test.Composite` with the fixture registry.
pub(crate) fn parse(input: &str) -> Result<DynamicMessage, Error> {
    parse_as("test.Composite", input)
}

pub(crate) fn parse_as(full_name: &str, input: &str) -> Result<DynamicMessage, Error> {
    parse_with(full_name, input, UnmarshalOptions::default())
}

pub(crate) fn parse_with(
    full_name: &str,
    input: &str,
    options: UnmarshalOptions<'_>,
) -> Result<DynamicMessage, Error> {
    let mut msg = message(full_name);
    let registry = registry();
    let options = UnmarshalOptions {
        resolver: options.resolver.or(Some(&registry as _)),
        ..options
    };
    options.unmarshal(input.as_bytes(), &mut msg)?;
    Ok(msg)
}

/// Parses with `discard_unknown` set.
pub(crate) fn parse_discarding(full_name: &str, input: &str) -> Result<DynamicMessage, Error> {
    parse_with(
        full_name,
        input,
        UnmarshalOptions {
            discard_unknown: true,
            ..Default::default()
        },
    )
}

pub(crate) fn get<'a>(msg: &'a DynamicMessage, name: &str) -> Option<&'a Value> {
    let fd = msg.descriptor().field_by_name(name)?;
    msg.get(&fd)
}

/// The error's display string, for diagnostics assertions.
pub(crate) fn error_text(input: &str) -> String {
    parse(input).expect_err("input is invalid").to_string()
}

pub(crate) fn syntax_source(err: &Error) -> &SyntaxError {
    match err {
        Error::Parse {
            source: ErrorSource::Syntax(s),
            ..
        } => s,
        other => panic!("expected a syntax error, got {other:?}"),
    }
}

pub(crate) fn decode_source(err: &Error) -> &DecodeError {
    match err {
        Error::Parse {
            source: ErrorSource::Decode(d),
            ..
        } => d,
        other => panic!("expected a decode error, got {other:?}"),
    }
}
