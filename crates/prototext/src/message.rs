//! Dynamic messages: schema-described values assembled at runtime.

use std::collections::BTreeMap;
use std::fmt;

use crate::descriptor::{Cardinality, FieldDescriptor, MessageDescriptor};
use crate::value::{MapKey, Value};

/// A message instance described by a [`MessageDescriptor`].
///
/// Field values are keyed by field number; presence is explicit (a field is
/// either set or absent). Mutation goes through descriptor handles, so a
/// value's variant always matches its field's kind.
#[derive(Clone)]
pub struct DynamicMessage {
    desc: MessageDescriptor,
    fields: BTreeMap<u32, FieldEntry>,
}

#[derive(Clone, Debug)]
struct FieldEntry {
    fd: FieldDescriptor,
    value: Value,
}

impl DynamicMessage {
    pub fn new(desc: MessageDescriptor) -> Self {
        DynamicMessage {
            desc,
            fields: BTreeMap::new(),
        }
    }

    pub fn descriptor(&self) -> &MessageDescriptor {
        &self.desc
    }

    /// Resets the message to its zero state.
    pub fn clear(&mut self) {
        self.fields.clear();
    }

    pub fn has(&self, fd: &FieldDescriptor) -> bool {
        self.fields.contains_key(&fd.number())
    }

    pub fn get(&self, fd: &FieldDescriptor) -> Option<&Value> {
        self.get_by_number(fd.number())
    }

    pub fn get_by_number(&self, number: u32) -> Option<&Value> {
        self.fields.get(&number).map(|e| &e.value)
    }

    /// Sets a field value. Setting a oneof member clears its siblings.
    pub fn set(&mut self, fd: &FieldDescriptor, value: Value) {
        if let Some(oneof) = fd.containing_oneof() {
            for number in oneof.member_numbers() {
                if number != fd.number() {
                    self.fields.remove(&number);
                }
            }
        }
        self.fields.insert(
            fd.number(),
            FieldEntry {
                fd: fd.clone(),
                value,
            },
        );
    }

    /// A fresh, unattached value for the field: an empty list, map or
    /// sub-message, or the scalar default.
    pub fn new_field(&self, fd: &FieldDescriptor) -> Value {
        if fd.is_map() {
            Value::Map(BTreeMap::new())
        } else if fd.is_list() {
            Value::List(Vec::new())
        } else {
            fd.default_value()
        }
    }

    /// The mutable element list of a repeated field, created empty on first
    /// use.
    pub fn mutable_list(&mut self, fd: &FieldDescriptor) -> &mut Vec<Value> {
        let entry = self.fields.entry(fd.number()).or_insert_with(|| FieldEntry {
            fd: fd.clone(),
            value: Value::List(Vec::new()),
        });
        if !matches!(entry.value, Value::List(_)) {
            entry.value = Value::List(Vec::new());
        }
        match &mut entry.value {
            Value::List(list) => list,
            _ => unreachable!(),
        }
    }

    /// The mutable entry map of a map field, created empty on first use.
    pub fn mutable_map(&mut self, fd: &FieldDescriptor) -> &mut BTreeMap<MapKey, Value> {
        let entry = self.fields.entry(fd.number()).or_insert_with(|| FieldEntry {
            fd: fd.clone(),
            value: Value::Map(BTreeMap::new()),
        });
        if !matches!(entry.value, Value::Map(_)) {
            entry.value = Value::Map(BTreeMap::new());
        }
        match &mut entry.value {
            Value::Map(map) => map,
            _ => unreachable!(),
        }
    }

    /// Set fields in ascending field-number order.
    pub fn entries(&self) -> impl Iterator<Item = (&FieldDescriptor, &Value)> {
        self.fields.values().map(|e| (&e.fd, &e.value))
    }

    /// Finds the full name of the first unset `required` field, searching
    /// recursively through set sub-messages, list elements and map values.
    pub fn find_uninitialized(&self) -> Option<String> {
        for fd in self.desc.fields() {
            if fd.cardinality() == Cardinality::Required && !self.fields.contains_key(&fd.number())
            {
                return Some(fd.full_name().to_owned());
            }
        }
        for entry in self.fields.values() {
            // Map values of message kind also need checking; their entry
            // descriptors mark them as ordinary message fields.
            let missing = match &entry.value {
                Value::Message(m) => m.find_uninitialized(),
                Value::List(items) if entry.fd.kind().is_message() => items
                    .iter()
                    .filter_map(Value::as_message)
                    .find_map(DynamicMessage::find_uninitialized),
                Value::Map(map) if entry.fd.map_value_is_message() => map
                    .values()
                    .filter_map(Value::as_message)
                    .find_map(DynamicMessage::find_uninitialized),
                _ => None,
            };
            if missing.is_some() {
                return missing;
            }
        }
        None
    }
}

impl PartialEq for DynamicMessage {
    fn eq(&self, other: &Self) -> bool {
        self.desc == other.desc
            && self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(other.fields.iter())
                .all(|((na, ea), (nb, eb))| na == nb && ea.value == eb.value)
    }
}

impl fmt::Debug for DynamicMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.desc.full_name());
        for entry in self.fields.values() {
            s.field(entry.fd.name(), &entry.value);
        }
        s.finish()
    }
}

impl FieldDescriptor {
    fn map_value_is_message(&self) -> bool {
        self.is_map() && self.map_value().kind().is_message()
    }
}
