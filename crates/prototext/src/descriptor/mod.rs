//! Message schema descriptors.
//!
//! Descriptors are built once from plain definition structs (see
//! [`Schema`]) into a [`DescriptorPool`] and then inspected through cheap
//! pool-plus-index handles. The indirection is what lets message types refer
//! to each other recursively: a [`FieldDescriptor`] stores the pool index of
//! its message type, not the type itself.

mod build;

pub use build::{
    Cardinality, EnumDef, ExtensionDef, FieldDef, FieldType, MessageDef, Schema, SchemaError,
};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::value::Value;

/// The field kinds of the protobuf type system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Bool,
    Int32,
    Sint32,
    Sfixed32,
    Int64,
    Sint64,
    Sfixed64,
    Uint32,
    Fixed32,
    Uint64,
    Fixed64,
    Float,
    Double,
    String,
    Bytes,
    Enum,
    Message,
    Group,
}

impl Kind {
    /// Whether values of this kind are themselves messages.
    pub fn is_message(self) -> bool {
        matches!(self, Kind::Message | Kind::Group)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Kind::Bool => "bool",
            Kind::Int32 => "int32",
            Kind::Sint32 => "sint32",
            Kind::Sfixed32 => "sfixed32",
            Kind::Int64 => "int64",
            Kind::Sint64 => "sint64",
            Kind::Sfixed64 => "sfixed64",
            Kind::Uint32 => "uint32",
            Kind::Fixed32 => "fixed32",
            Kind::Uint64 => "uint64",
            Kind::Fixed64 => "fixed64",
            Kind::Float => "float",
            Kind::Double => "double",
            Kind::String => "string",
            Kind::Bytes => "bytes",
            Kind::Enum => "enum",
            Kind::Message => "message",
            Kind::Group => "group",
        })
    }
}

pub(crate) struct PoolInner {
    pub(crate) messages: Vec<MessageData>,
    pub(crate) enums: Vec<EnumData>,
    pub(crate) extensions: Vec<FieldData>,
    pub(crate) message_index: BTreeMap<String, usize>,
    pub(crate) extension_index: BTreeMap<String, usize>,
    pub(crate) extension_number_index: BTreeMap<(String, u32), usize>,
}

pub(crate) struct MessageData {
    pub(crate) full_name: String,
    pub(crate) name: String,
    pub(crate) fields: Vec<FieldData>,
    pub(crate) field_names: BTreeMap<String, usize>,
    pub(crate) field_numbers: BTreeMap<u32, usize>,
    pub(crate) oneofs: Vec<OneofData>,
    pub(crate) reserved_names: BTreeSet<String>,
    pub(crate) extension_ranges: Vec<(u32, u32)>,
    pub(crate) is_message_set: bool,
    pub(crate) is_placeholder: bool,
}

pub(crate) struct OneofData {
    pub(crate) full_name: String,
    /// Field indices of the oneof's members.
    pub(crate) fields: Vec<usize>,
}

pub(crate) struct FieldData {
    pub(crate) name: String,
    pub(crate) full_name: String,
    pub(crate) number: u32,
    pub(crate) kind: Kind,
    pub(crate) cardinality: Cardinality,
    pub(crate) oneof: Option<usize>,
    pub(crate) message: Option<usize>,
    pub(crate) enum_: Option<usize>,
    pub(crate) is_map: bool,
    pub(crate) is_weak: bool,
    /// Full name of the extended message, for extension fields.
    pub(crate) extendee: Option<String>,
    pub(crate) default: Option<Value>,
}

pub(crate) struct EnumData {
    pub(crate) full_name: String,
    pub(crate) values: Vec<(String, i32)>,
    pub(crate) value_names: BTreeMap<String, i32>,
}

/// An immutable set of resolved message, enum and extension descriptors.
#[derive(Clone)]
pub struct DescriptorPool {
    pub(crate) inner: Arc<PoolInner>,
}

impl DescriptorPool {
    /// Resolves a schema into a pool. See [`Schema`].
    pub fn new(schema: Schema) -> Result<Self, SchemaError> {
        build::build(schema)
    }

    pub fn message_by_name(&self, full_name: &str) -> Option<MessageDescriptor> {
        let index = *self.inner.message_index.get(full_name)?;
        Some(MessageDescriptor {
            pool: self.clone(),
            index,
        })
    }

    pub fn extension_by_name(&self, full_name: &str) -> Option<FieldDescriptor> {
        let index = *self.inner.extension_index.get(full_name)?;
        Some(FieldDescriptor {
            pool: self.clone(),
            loc: FieldLoc::Extension(index),
        })
    }

    pub fn extension_by_number(&self, extendee: &str, number: u32) -> Option<FieldDescriptor> {
        let key = (extendee.to_owned(), number);
        let index = *self.inner.extension_number_index.get(&key)?;
        Some(FieldDescriptor {
            pool: self.clone(),
            loc: FieldLoc::Extension(index),
        })
    }

    fn ptr_eq(&self, other: &DescriptorPool) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for DescriptorPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorPool")
            .field("messages", &self.inner.messages.len())
            .finish()
    }
}

/// A handle to a message type in a [`DescriptorPool`].
#[derive(Clone)]
pub struct MessageDescriptor {
    pool: DescriptorPool,
    index: usize,
}

impl MessageDescriptor {
    fn data(&self) -> &MessageData {
        &self.pool.inner.messages[self.index]
    }

    pub fn full_name(&self) -> &str {
        &self.data().full_name
    }

    /// The declared name: the last segment of the full name.
    pub fn name(&self) -> &str {
        &self.data().name
    }

    pub fn is_message_set(&self) -> bool {
        self.data().is_message_set
    }

    /// A placeholder stands in for a weak-referenced type that was not
    /// linked into the pool.
    pub fn is_placeholder(&self) -> bool {
        self.data().is_placeholder
    }

    pub fn is_reserved_name(&self, name: &str) -> bool {
        self.data().reserved_names.contains(name)
    }

    pub fn has_extension_range(&self, number: u32) -> bool {
        self.data()
            .extension_ranges
            .iter()
            .any(|&(lo, hi)| (lo..=hi).contains(&number))
    }

    pub fn field_by_name(&self, name: &str) -> Option<FieldDescriptor> {
        let field = *self.data().field_names.get(name)?;
        Some(self.field_handle(field))
    }

    pub fn field_by_number(&self, number: u32) -> Option<FieldDescriptor> {
        let field = *self.data().field_numbers.get(&number)?;
        Some(self.field_handle(field))
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = FieldDescriptor> + '_ {
        (0..self.data().fields.len()).map(|i| self.field_handle(i))
    }

    fn field_handle(&self, field: usize) -> FieldDescriptor {
        FieldDescriptor {
            pool: self.pool.clone(),
            loc: FieldLoc::Member {
                message: self.index,
                field,
            },
        }
    }
}

impl PartialEq for MessageDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.pool.ptr_eq(&other.pool) && self.index == other.index
    }
}

impl Eq for MessageDescriptor {}

impl fmt::Debug for MessageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageDescriptor({})", self.full_name())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum FieldLoc {
    Member { message: usize, field: usize },
    Extension(usize),
}

/// A handle to a field: either a member of a message or an extension.
#[derive(Clone)]
pub struct FieldDescriptor {
    pool: DescriptorPool,
    loc: FieldLoc,
}

impl FieldDescriptor {
    fn data(&self) -> &FieldData {
        match self.loc {
            FieldLoc::Member { message, field } => {
                &self.pool.inner.messages[message].fields[field]
            }
            FieldLoc::Extension(index) => &self.pool.inner.extensions[index],
        }
    }

    pub fn name(&self) -> &str {
        &self.data().name
    }

    pub fn full_name(&self) -> &str {
        &self.data().full_name
    }

    pub fn number(&self) -> u32 {
        self.data().number
    }

    pub fn kind(&self) -> Kind {
        self.data().kind
    }

    pub fn cardinality(&self) -> Cardinality {
        self.data().cardinality
    }

    pub fn is_list(&self) -> bool {
        self.data().cardinality == Cardinality::Repeated && !self.data().is_map
    }

    pub fn is_map(&self) -> bool {
        self.data().is_map
    }

    pub fn is_weak(&self) -> bool {
        self.data().is_weak
    }

    pub fn is_extension(&self) -> bool {
        self.data().extendee.is_some()
    }

    /// Full name of the message this field belongs to (the extendee, for
    /// extensions).
    pub fn containing_message_name(&self) -> &str {
        match (&self.data().extendee, self.loc) {
            (Some(extendee), _) => extendee,
            (None, FieldLoc::Member { message, .. }) => {
                &self.pool.inner.messages[message].full_name
            }
            (None, FieldLoc::Extension(_)) => "",
        }
    }

    pub fn containing_oneof(&self) -> Option<OneofDescriptor> {
        let index = self.data().oneof?;
        match self.loc {
            FieldLoc::Member { message, .. } => Some(OneofDescriptor {
                pool: self.pool.clone(),
                message,
                index,
            }),
            FieldLoc::Extension(_) => None,
        }
    }

    /// The message type of a message, group or map field.
    pub fn message(&self) -> Option<MessageDescriptor> {
        let index = self.data().message?;
        Some(MessageDescriptor {
            pool: self.pool.clone(),
            index,
        })
    }

    pub fn enum_type(&self) -> Option<EnumDescriptor> {
        let index = self.data().enum_?;
        Some(EnumDescriptor {
            pool: self.pool.clone(),
            index,
        })
    }

    /// The synthetic `key` field of a map field's entry message.
    pub fn map_key(&self) -> FieldDescriptor {
        self.entry_field(0)
    }

    /// The synthetic `value` field of a map field's entry message.
    pub fn map_value(&self) -> FieldDescriptor {
        self.entry_field(1)
    }

    fn entry_field(&self, field: usize) -> FieldDescriptor {
        debug_assert!(self.is_map());
        let entry = self.data().message.expect("map field has an entry message");
        FieldDescriptor {
            pool: self.pool.clone(),
            loc: FieldLoc::Member {
                message: entry,
                field,
            },
        }
    }

    /// The field's default: the explicit proto2 default if declared,
    /// otherwise the zero value of its kind. For message kinds this is an
    /// empty message.
    pub fn default_value(&self) -> Value {
        if let Some(default) = &self.data().default {
            return default.clone();
        }
        match self.kind() {
            Kind::Bool => Value::Bool(false),
            Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => Value::I32(0),
            Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => Value::I64(0),
            Kind::Uint32 | Kind::Fixed32 => Value::U32(0),
            Kind::Uint64 | Kind::Fixed64 => Value::U64(0),
            Kind::Float => Value::F32(0.0),
            Kind::Double => Value::F64(0.0),
            Kind::String => Value::String(String::new()),
            Kind::Bytes => Value::Bytes(Vec::new()),
            Kind::Enum => Value::EnumNumber(
                self.enum_type().map_or(0, |e| e.first_value_number()),
            ),
            Kind::Message | Kind::Group => Value::Message(crate::DynamicMessage::new(
                self.message().expect("message field has a message type"),
            )),
        }
    }
}

impl PartialEq for FieldDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.pool.ptr_eq(&other.pool) && self.loc == other.loc
    }
}

impl Eq for FieldDescriptor {}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldDescriptor({})", self.full_name())
    }
}

/// A handle to a oneof declared in a message.
#[derive(Clone)]
pub struct OneofDescriptor {
    pool: DescriptorPool,
    message: usize,
    index: usize,
}

impl OneofDescriptor {
    fn data(&self) -> &OneofData {
        &self.pool.inner.messages[self.message].oneofs[self.index]
    }

    pub fn full_name(&self) -> &str {
        &self.data().full_name
    }

    /// Position of this oneof within its message's oneof list.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Field numbers of the oneof's members.
    pub fn member_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        let message = &self.pool.inner.messages[self.message];
        self.data().fields.iter().map(|&i| message.fields[i].number)
    }
}

impl fmt::Debug for OneofDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OneofDescriptor({})", self.full_name())
    }
}

/// A handle to an enum type.
#[derive(Clone)]
pub struct EnumDescriptor {
    pool: DescriptorPool,
    index: usize,
}

impl EnumDescriptor {
    fn data(&self) -> &EnumData {
        &self.pool.inner.enums[self.index]
    }

    pub fn full_name(&self) -> &str {
        &self.data().full_name
    }

    pub fn value_by_name(&self, name: &str) -> Option<i32> {
        self.data().value_names.get(name).copied()
    }

    /// The number of the first declared value, the enum's default.
    pub fn first_value_number(&self) -> i32 {
        self.data().values.first().map_or(0, |&(_, n)| n)
    }
}

impl PartialEq for EnumDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.pool.ptr_eq(&other.pool) && self.index == other.index
    }
}

impl Eq for EnumDescriptor {}

impl fmt::Debug for EnumDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnumDescriptor({})", self.full_name())
    }
}
