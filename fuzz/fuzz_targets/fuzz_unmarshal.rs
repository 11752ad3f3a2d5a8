#![no_main]

use std::sync::OnceLock;

use libfuzzer_sys::fuzz_target;
use prototext::descriptor::{DescriptorPool, FieldDef, FieldType, MessageDef, Schema};
use prototext::{DynamicMessage, TypeRegistry, UnmarshalOptions};

fn pool() -> &'static DescriptorPool {
    static POOL: OnceLock<DescriptorPool> = OnceLock::new();
    POOL.get_or_init(|| {
        DescriptorPool::new(
            Schema::new()
                .message(
                    MessageDef::new("fuzz.Target")
                        .oneof("pick")
                        .field(FieldDef::new("i32", 1, FieldType::Int32))
                        .field(FieldDef::new("i64", 2, FieldType::Int64))
                        .field(FieldDef::new("u64", 3, FieldType::Uint64))
                        .field(FieldDef::new("f64", 4, FieldType::Double))
                        .field(FieldDef::new("name", 5, FieldType::String))
                        .field(FieldDef::new("data", 6, FieldType::Bytes))
                        .field(FieldDef::new("tags", 7, FieldType::String).repeated())
                        .field(
                            FieldDef::new("child", 8, FieldType::Message("fuzz.Target".into())),
                        )
                        .field(
                            FieldDef::new("kids", 9, FieldType::Message("fuzz.Target".into()))
                                .repeated(),
                        )
                        .field(FieldDef::new(
                            "m",
                            10,
                            FieldType::Map(Box::new(FieldType::String), Box::new(FieldType::Int64)),
                        ))
                        .field(FieldDef::new("a", 11, FieldType::Int32).in_oneof("pick"))
                        .field(FieldDef::new("b", 12, FieldType::Int32).in_oneof("pick"))
                        .field(FieldDef::new(
                            "any",
                            13,
                            FieldType::Message("google.protobuf.Any".into()),
                        )),
                )
                .message(
                    MessageDef::new("google.protobuf.Any")
                        .field(FieldDef::new("type_url", 1, FieldType::String))
                        .field(FieldDef::new("value", 2, FieldType::Bytes)),
                ),
        )
        .expect("fuzz schema resolves")
    })
}

fn registry() -> &'static TypeRegistry {
    static REGISTRY: OnceLock<TypeRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| TypeRegistry::with_pool(pool().clone()))
}

fuzz_target!(|data: &[u8]| {
    let desc = pool().message_by_name("fuzz.Target").expect("fuzz.Target");

    // Strict and discarding decoders must never panic, and every parse
    // error must carry a position.
    for discard_unknown in [false, true] {
        let mut msg = DynamicMessage::new(desc.clone());
        let options = UnmarshalOptions {
            discard_unknown,
            resolver: Some(registry()),
            ..Default::default()
        };
        if let Err(err) = options.unmarshal(data, &mut msg) {
            let _ = err.to_string();
        }
    }
});
