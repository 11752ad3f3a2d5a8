//! Deterministic binary serialization, as used for expanded `Any` payloads.
//!
//! Follows the wire format described at
//! <https://protobuf.dev/programming-guides/encoding>: each field is a
//! varint key carrying `(number << 3) | wire_type`, followed by a payload
//! whose shape the wire type determines. Output is deterministic: fields are
//! emitted in ascending number order and map entries in key order. Required
//! fields are not checked; `Any` payloads never require that.

use bytes::BufMut;

use crate::descriptor::{FieldDescriptor, Kind};
use crate::message::DynamicMessage;
use crate::value::{MapKey, Value};

const VARINT: u32 = 0;
const FIXED64: u32 = 1;
const LEN: u32 = 2;
const START_GROUP: u32 = 3;
const END_GROUP: u32 = 4;
const FIXED32: u32 = 5;

/// Serializes a message into a fresh buffer.
pub fn marshal(message: &DynamicMessage) -> Vec<u8> {
    let mut buf = Vec::new();
    marshal_into(message, &mut buf);
    buf
}

/// Serializes a message into the given buffer.
pub fn marshal_into<B: BufMut>(message: &DynamicMessage, buf: &mut B) {
    for (fd, value) in message.entries() {
        match value {
            Value::List(items) => {
                for item in items {
                    put_single(fd, item, buf);
                }
            }
            Value::Map(map) => {
                for (key, value) in map {
                    let mut entry = Vec::new();
                    put_map_key(&fd.map_key(), key, &mut entry);
                    put_single(&fd.map_value(), value, &mut entry);
                    put_key(fd.number(), LEN, buf);
                    put_uvarint(entry.len() as u64, buf);
                    buf.put_slice(&entry);
                }
            }
            value => put_single(fd, value, buf),
        }
    }
}

fn put_single<B: BufMut>(fd: &FieldDescriptor, value: &Value, buf: &mut B) {
    let number = fd.number();
    match (fd.kind(), value) {
        (Kind::Bool, Value::Bool(v)) => {
            put_key(number, VARINT, buf);
            put_uvarint(u64::from(*v), buf);
        }
        (Kind::Int32, Value::I32(v)) | (Kind::Enum, Value::EnumNumber(v)) => {
            put_key(number, VARINT, buf);
            // Negative int32 goes on the wire sign-extended to 64 bits.
            put_uvarint(i64::from(*v) as u64, buf);
        }
        (Kind::Int64, Value::I64(v)) => {
            put_key(number, VARINT, buf);
            put_uvarint(*v as u64, buf);
        }
        (Kind::Sint32, Value::I32(v)) => {
            put_key(number, VARINT, buf);
            put_uvarint(zigzag32(*v), buf);
        }
        (Kind::Sint64, Value::I64(v)) => {
            put_key(number, VARINT, buf);
            put_uvarint(zigzag64(*v), buf);
        }
        (Kind::Uint32, Value::U32(v)) => {
            put_key(number, VARINT, buf);
            put_uvarint(u64::from(*v), buf);
        }
        (Kind::Uint64, Value::U64(v)) => {
            put_key(number, VARINT, buf);
            put_uvarint(*v, buf);
        }
        (Kind::Sfixed32, Value::I32(v)) => {
            put_key(number, FIXED32, buf);
            buf.put_i32_le(*v);
        }
        (Kind::Fixed32, Value::U32(v)) => {
            put_key(number, FIXED32, buf);
            buf.put_u32_le(*v);
        }
        (Kind::Float, Value::F32(v)) => {
            put_key(number, FIXED32, buf);
            buf.put_f32_le(*v);
        }
        (Kind::Sfixed64, Value::I64(v)) => {
            put_key(number, FIXED64, buf);
            buf.put_i64_le(*v);
        }
        (Kind::Fixed64, Value::U64(v)) => {
            put_key(number, FIXED64, buf);
            buf.put_u64_le(*v);
        }
        (Kind::Double, Value::F64(v)) => {
            put_key(number, FIXED64, buf);
            buf.put_f64_le(*v);
        }
        (Kind::String, Value::String(v)) => {
            put_key(number, LEN, buf);
            put_uvarint(v.len() as u64, buf);
            buf.put_slice(v.as_bytes());
        }
        (Kind::Bytes, Value::Bytes(v)) => {
            put_key(number, LEN, buf);
            put_uvarint(v.len() as u64, buf);
            buf.put_slice(v);
        }
        (Kind::Message, Value::Message(m)) => {
            let body = marshal(m);
            put_key(number, LEN, buf);
            put_uvarint(body.len() as u64, buf);
            buf.put_slice(&body);
        }
        (Kind::Group, Value::Message(m)) => {
            put_key(number, START_GROUP, buf);
            marshal_into(m, buf);
            put_key(number, END_GROUP, buf);
        }
        // A value's variant always matches its field's kind; mutation goes
        // through descriptor handles.
        _ => {}
    }
}

fn put_map_key<B: BufMut>(fd: &FieldDescriptor, key: &MapKey, buf: &mut B) {
    let value = match key.clone() {
        MapKey::Bool(v) => Value::Bool(v),
        MapKey::I32(v) => Value::I32(v),
        MapKey::I64(v) => Value::I64(v),
        MapKey::U32(v) => Value::U32(v),
        MapKey::U64(v) => Value::U64(v),
        MapKey::String(v) => Value::String(v),
    };
    put_single(fd, &value, buf);
}

fn put_key<B: BufMut>(number: u32, wire_type: u32, buf: &mut B) {
    put_uvarint(u64::from(number << 3 | wire_type), buf);
}

fn put_uvarint<B: BufMut>(mut v: u64, buf: &mut B) {
    while v >= 0x80 {
        buf.put_u8(v as u8 | 0x80);
        v >>= 7;
    }
    buf.put_u8(v as u8);
}

fn zigzag32(v: i32) -> u64 {
    u64::from((v << 1 ^ v >> 31) as u32)
}

fn zigzag64(v: i64) -> u64 {
    (v << 1 ^ v >> 63) as u64
}
