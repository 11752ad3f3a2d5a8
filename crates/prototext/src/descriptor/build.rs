//! Schema definition structs and pool construction.
//!
//! A [`Schema`] is the plain-data description of a set of types; building it
//! resolves every type reference by full name, synthesizes map-entry
//! messages, and produces the immutable [`DescriptorPool`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use thiserror::Error;

use super::{DescriptorPool, EnumData, FieldData, Kind, MessageData, OneofData, PoolInner};
use crate::value::Value;

/// Field presence and repetition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Cardinality {
    #[default]
    Optional,
    /// proto2 `required`; feeds the post-parse completeness check.
    Required,
    Repeated,
}

/// The declared type of a field. Message, group and enum types are referred
/// to by full name and resolved when the pool is built.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldType {
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
    Enum(String),
    Message(String),
    Group(String),
    Map(Box<FieldType>, Box<FieldType>),
}

#[derive(Clone, Debug)]
pub struct FieldDef {
    pub name: String,
    pub number: u32,
    pub field_type: FieldType,
    pub cardinality: Cardinality,
    /// Name of a oneof declared on the containing message.
    pub oneof: Option<String>,
    /// Explicit proto2 default.
    pub default: Option<Value>,
    pub is_weak: bool,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, number: u32, field_type: FieldType) -> Self {
        FieldDef {
            name: name.into(),
            number,
            field_type,
            cardinality: Cardinality::Optional,
            oneof: None,
            default: None,
            is_weak: false,
        }
    }

    pub fn repeated(mut self) -> Self {
        self.cardinality = Cardinality::Repeated;
        self
    }

    pub fn required(mut self) -> Self {
        self.cardinality = Cardinality::Required;
        self
    }

    pub fn in_oneof(mut self, name: impl Into<String>) -> Self {
        self.oneof = Some(name.into());
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn weak(mut self) -> Self {
        self.is_weak = true;
        self
    }
}

#[derive(Clone, Debug)]
pub struct MessageDef {
    pub full_name: String,
    pub fields: Vec<FieldDef>,
    pub oneofs: Vec<String>,
    pub reserved_names: Vec<String>,
    pub extension_ranges: Vec<(u32, u32)>,
    pub is_message_set: bool,
}

impl MessageDef {
    pub fn new(full_name: impl Into<String>) -> Self {
        MessageDef {
            full_name: full_name.into(),
            fields: Vec::new(),
            oneofs: Vec::new(),
            reserved_names: Vec::new(),
            extension_ranges: Vec::new(),
            is_message_set: false,
        }
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn oneof(mut self, name: impl Into<String>) -> Self {
        self.oneofs.push(name.into());
        self
    }

    pub fn reserved(mut self, name: impl Into<String>) -> Self {
        self.reserved_names.push(name.into());
        self
    }

    pub fn extension_range(mut self, lo: u32, hi: u32) -> Self {
        self.extension_ranges.push((lo, hi));
        self
    }

    pub fn message_set(mut self) -> Self {
        self.is_message_set = true;
        self
    }
}

#[derive(Clone, Debug)]
pub struct EnumDef {
    pub full_name: String,
    pub values: Vec<(String, i32)>,
}

impl EnumDef {
    pub fn new(full_name: impl Into<String>) -> Self {
        EnumDef {
            full_name: full_name.into(),
            values: Vec::new(),
        }
    }

    pub fn value(mut self, name: impl Into<String>, number: i32) -> Self {
        self.values.push((name.into(), number));
        self
    }
}

/// An extension field. `field.name` is the extension's *full* name.
#[derive(Clone, Debug)]
pub struct ExtensionDef {
    pub extendee: String,
    pub field: FieldDef,
}

/// A set of type definitions to resolve into a [`DescriptorPool`].
#[derive(Clone, Debug, Default)]
pub struct Schema {
    pub messages: Vec<MessageDef>,
    pub enums: Vec<EnumDef>,
    pub extensions: Vec<ExtensionDef>,
}

impl Schema {
    pub fn new() -> Self {
        Schema::default()
    }

    pub fn message(mut self, def: MessageDef) -> Self {
        self.messages.push(def);
        self
    }

    pub fn enumeration(mut self, def: EnumDef) -> Self {
        self.enums.push(def);
        self
    }

    pub fn extension(mut self, extendee: impl Into<String>, field: FieldDef) -> Self {
        self.extensions.push(ExtensionDef {
            extendee: extendee.into(),
            field,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("duplicate type name {0}")]
    DuplicateTypeName(String),
    #[error("{message}: duplicate field number {number}")]
    DuplicateFieldNumber { message: String, number: u32 },
    #[error("{message}: duplicate field name {name}")]
    DuplicateFieldName { message: String, name: String },
    #[error("{field}: unresolved type {type_name}")]
    UnresolvedType { field: String, type_name: String },
    #[error("{field}: {kind} is not a valid map key kind")]
    InvalidMapKey { field: String, kind: Kind },
    #[error("{field}: nested maps are not a valid type")]
    NestedMap { field: String },
    #[error("{field}: unknown oneof {oneof}")]
    UnknownOneof { field: String, oneof: String },
    #[error("{message}: invalid extension range {lo}..={hi}")]
    InvalidExtensionRange { message: String, lo: u32, hi: u32 },
    #[error("{0}: extensions cannot be map fields")]
    MapExtension(String),
}

struct Builder {
    messages: Vec<MessageData>,
    enums: Vec<EnumData>,
    message_index: BTreeMap<String, usize>,
    enum_index: BTreeMap<String, usize>,
}

pub(super) fn build(schema: Schema) -> Result<DescriptorPool, SchemaError> {
    let mut b = Builder {
        messages: Vec::with_capacity(schema.messages.len()),
        enums: Vec::with_capacity(schema.enums.len()),
        message_index: BTreeMap::new(),
        enum_index: BTreeMap::new(),
    };

    for def in &schema.messages {
        for &(lo, hi) in &def.extension_ranges {
            if lo == 0 || hi < lo {
                return Err(SchemaError::InvalidExtensionRange {
                    message: def.full_name.clone(),
                    lo,
                    hi,
                });
            }
        }
        let index = b.messages.len();
        if b.message_index.insert(def.full_name.clone(), index).is_some() {
            return Err(SchemaError::DuplicateTypeName(def.full_name.clone()));
        }
        b.messages.push(MessageData {
            full_name: def.full_name.clone(),
            name: last_segment(&def.full_name).to_owned(),
            fields: Vec::new(),
            field_names: BTreeMap::new(),
            field_numbers: BTreeMap::new(),
            oneofs: def
                .oneofs
                .iter()
                .map(|o| OneofData {
                    full_name: format!("{}.{}", def.full_name, o),
                    fields: Vec::new(),
                })
                .collect(),
            reserved_names: def.reserved_names.iter().cloned().collect::<BTreeSet<_>>(),
            extension_ranges: def.extension_ranges.clone(),
            is_message_set: def.is_message_set,
            is_placeholder: false,
        });
    }

    for def in &schema.enums {
        let index = b.enums.len();
        if b.enum_index.insert(def.full_name.clone(), index).is_some() {
            return Err(SchemaError::DuplicateTypeName(def.full_name.clone()));
        }
        b.enums.push(EnumData {
            full_name: def.full_name.clone(),
            values: def.values.clone(),
            value_names: def.values.iter().cloned().collect(),
        });
    }

    for (index, def) in schema.messages.iter().enumerate() {
        for fdef in &def.fields {
            let full_name = format!("{}.{}", def.full_name, fdef.name);
            let oneof = match &fdef.oneof {
                Some(name) => Some(def.oneofs.iter().position(|o| o == name).ok_or_else(|| {
                    SchemaError::UnknownOneof {
                        field: full_name.clone(),
                        oneof: name.clone(),
                    }
                })?),
                None => None,
            };
            let data = b.resolve_field(fdef, full_name, oneof, None)?;
            b.insert_field(index, data)?;
        }
    }

    let mut extensions = Vec::with_capacity(schema.extensions.len());
    let mut extension_index = BTreeMap::new();
    let mut extension_number_index = BTreeMap::new();
    for ext in &schema.extensions {
        if matches!(ext.field.field_type, FieldType::Map(..)) {
            return Err(SchemaError::MapExtension(ext.field.name.clone()));
        }
        let full_name = ext.field.name.clone();
        let mut data = b.resolve_field(&ext.field, full_name.clone(), None, Some(&ext.extendee))?;
        data.name = last_segment(&full_name).to_owned();
        extension_index.insert(full_name, extensions.len());
        extension_number_index.insert((ext.extendee.clone(), ext.field.number), extensions.len());
        extensions.push(data);
    }

    Ok(DescriptorPool {
        inner: Arc::new(PoolInner {
            messages: b.messages,
            enums: b.enums,
            extensions,
            message_index: b.message_index,
            extension_index,
            extension_number_index,
        }),
    })
}

impl Builder {
    fn resolve_field(
        &mut self,
        def: &FieldDef,
        full_name: String,
        oneof: Option<usize>,
        extendee: Option<&str>,
    ) -> Result<FieldData, SchemaError> {
        let (kind, message, enum_, is_map, cardinality) = match &def.field_type {
            FieldType::Map(key, value) => {
                let entry = self.build_map_entry(&full_name, def, key, value)?;
                (Kind::Message, Some(entry), None, true, Cardinality::Repeated)
            }
            other => {
                let (kind, message, enum_) = self.resolve_type(&full_name, other, def.is_weak)?;
                (kind, message, enum_, false, def.cardinality)
            }
        };
        Ok(FieldData {
            name: def.name.clone(),
            full_name,
            number: def.number,
            kind,
            cardinality,
            oneof,
            message,
            enum_,
            is_map,
            is_weak: def.is_weak,
            extendee: extendee.map(str::to_owned),
            default: def.default.clone(),
        })
    }

    fn resolve_type(
        &mut self,
        field: &str,
        ft: &FieldType,
        is_weak: bool,
    ) -> Result<(Kind, Option<usize>, Option<usize>), SchemaError> {
        let kind = match ft {
            FieldType::Bool => Kind::Bool,
            FieldType::Int32 => Kind::Int32,
            FieldType::Sint32 => Kind::Sint32,
            FieldType::Sfixed32 => Kind::Sfixed32,
            FieldType::Int64 => Kind::Int64,
            FieldType::Sint64 => Kind::Sint64,
            FieldType::Sfixed64 => Kind::Sfixed64,
            FieldType::Uint32 => Kind::Uint32,
            FieldType::Fixed32 => Kind::Fixed32,
            FieldType::Uint64 => Kind::Uint64,
            FieldType::Fixed64 => Kind::Fixed64,
            FieldType::Float => Kind::Float,
            FieldType::Double => Kind::Double,
            FieldType::String => Kind::String,
            FieldType::Bytes => Kind::Bytes,
            FieldType::Enum(name) => {
                let index =
                    self.enum_index
                        .get(name)
                        .copied()
                        .ok_or_else(|| SchemaError::UnresolvedType {
                            field: field.to_owned(),
                            type_name: name.clone(),
                        })?;
                return Ok((Kind::Enum, None, Some(index)));
            }
            FieldType::Message(name) | FieldType::Group(name) => {
                let kind = if matches!(ft, FieldType::Group(_)) {
                    Kind::Group
                } else {
                    Kind::Message
                };
                let index = match self.message_index.get(name).copied() {
                    Some(index) => index,
                    // A weak reference to an unlinked type gets a placeholder.
                    None if is_weak => self.placeholder(name),
                    None => {
                        return Err(SchemaError::UnresolvedType {
                            field: field.to_owned(),
                            type_name: name.clone(),
                        })
                    }
                };
                return Ok((kind, Some(index), None));
            }
            FieldType::Map(..) => {
                return Err(SchemaError::NestedMap {
                    field: field.to_owned(),
                })
            }
        };
        Ok((kind, None, None))
    }

    fn build_map_entry(
        &mut self,
        field_full_name: &str,
        def: &FieldDef,
        key: &FieldType,
        value: &FieldType,
    ) -> Result<usize, SchemaError> {
        let (key_kind, _, _) = self.resolve_type(field_full_name, key, false)?;
        if !matches!(
            key_kind,
            Kind::Bool
                | Kind::Int32
                | Kind::Sint32
                | Kind::Sfixed32
                | Kind::Int64
                | Kind::Sint64
                | Kind::Sfixed64
                | Kind::Uint32
                | Kind::Fixed32
                | Kind::Uint64
                | Kind::Fixed64
                | Kind::String
        ) {
            return Err(SchemaError::InvalidMapKey {
                field: field_full_name.to_owned(),
                kind: key_kind,
            });
        }
        let (value_kind, value_message, value_enum) =
            self.resolve_type(field_full_name, value, false)?;

        let parent = field_full_name
            .rsplit_once('.')
            .map_or("", |(parent, _)| parent);
        let entry_name = format!("{}Entry", upper_camel(&def.name));
        let full_name = format!("{parent}.{entry_name}");
        let index = self.messages.len();
        let make = |name: &str, number: u32, kind, message, enum_| FieldData {
            name: name.to_owned(),
            full_name: format!("{full_name}.{name}"),
            number,
            kind,
            cardinality: Cardinality::Optional,
            oneof: None,
            message,
            enum_,
            is_map: false,
            is_weak: false,
            extendee: None,
            default: None,
        };
        self.messages.push(MessageData {
            full_name: full_name.clone(),
            name: entry_name,
            fields: vec![
                make("key", 1, key_kind, None, None),
                make("value", 2, value_kind, value_message, value_enum),
            ],
            field_names: [("key".to_owned(), 0), ("value".to_owned(), 1)].into(),
            field_numbers: [(1, 0), (2, 1)].into(),
            oneofs: Vec::new(),
            reserved_names: BTreeSet::new(),
            extension_ranges: Vec::new(),
            is_message_set: false,
            is_placeholder: false,
        });
        self.message_index.insert(full_name, index);
        Ok(index)
    }

    fn placeholder(&mut self, full_name: &str) -> usize {
        if let Some(&index) = self.message_index.get(full_name) {
            return index;
        }
        let index = self.messages.len();
        self.messages.push(MessageData {
            full_name: full_name.to_owned(),
            name: last_segment(full_name).to_owned(),
            fields: Vec::new(),
            field_names: BTreeMap::new(),
            field_numbers: BTreeMap::new(),
            oneofs: Vec::new(),
            reserved_names: BTreeSet::new(),
            extension_ranges: Vec::new(),
            is_message_set: false,
            is_placeholder: true,
        });
        self.message_index.insert(full_name.to_owned(), index);
        index
    }

    fn insert_field(&mut self, message: usize, data: FieldData) -> Result<(), SchemaError> {
        let msg = &mut self.messages[message];
        let index = msg.fields.len();
        if msg.field_names.insert(data.name.clone(), index).is_some() {
            return Err(SchemaError::DuplicateFieldName {
                message: msg.full_name.clone(),
                name: data.name.clone(),
            });
        }
        if msg.field_numbers.insert(data.number, index).is_some() {
            return Err(SchemaError::DuplicateFieldNumber {
                message: msg.full_name.clone(),
                number: data.number,
            });
        }
        if let Some(oneof) = data.oneof {
            msg.oneofs[oneof].fields.push(index);
        }
        msg.fields.push(data);
        Ok(())
    }
}

fn last_segment(full_name: &str) -> &str {
    full_name.rsplit('.').next().unwrap_or(full_name)
}

fn upper_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for part in name.split('_') {
        let mut chars = part.chars();
        if let Some(c) = chars.next() {
            out.extend(c.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}
