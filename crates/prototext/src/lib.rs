//! A descriptor-driven decoder for the Protocol Buffers text format.
//!
//! The text format (`textproto`) is the human-readable serialization of
//! protobuf messages. This crate parses it against a runtime schema: build a
//! [`descriptor::DescriptorPool`] describing your message types, then
//! [`unmarshal`] input into a [`DynamicMessage`].
//!
//! ```
//! use prototext::descriptor::{DescriptorPool, FieldDef, FieldType, MessageDef, Schema};
//! use prototext::{unmarshal, DynamicMessage, Value};
//!
//! let pool = DescriptorPool::new(
//!     Schema::new().message(
//!         MessageDef::new("greeting.Hello")
//!             .field(FieldDef::new("name", 1, FieldType::String))
//!             .field(FieldDef::new("count", 2, FieldType::Int32)),
//!     ),
//! )
//! .unwrap();
//! let desc = pool.message_by_name("greeting.Hello").unwrap();
//!
//! let mut msg = DynamicMessage::new(desc);
//! unmarshal(b"name: \"ada\"  count: 3", &mut msg).unwrap();
//! assert_eq!(msg.get_by_number(1), Some(&Value::String("ada".into())));
//! assert_eq!(msg.get_by_number(2), Some(&Value::I32(3)));
//! ```
//!
//! Unknown fields are errors unless [`UnmarshalOptions::discard_unknown`] is
//! set; extension fields (`[pkg.ext_name]`) and `google.protobuf.Any` types
//! resolve through a [`TypeRegistry`] passed via
//! [`UnmarshalOptions::resolver`]. Every parse error carries the offending
//! token's `(line, column)`.

pub mod descriptor;
pub mod wire;

mod decode;
mod error;
mod message;
mod registry;
mod text;
mod value;

pub use decode::{unmarshal, UnmarshalOptions};
pub use error::{DecodeError, Error, ErrorSource, SyntaxError};
pub use message::DynamicMessage;
pub use registry::{global_registry, Resolver, ResolverError, TypeRegistry};
pub use value::{MapKey, Value};

#[cfg(test)]
mod tests;
