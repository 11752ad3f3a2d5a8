//! The descriptor-driven unmarshal state machine.
//!
//! [`unmarshal`] resets the target message and walks the token stream with a
//! recursive-descent loop: each field-name token is resolved against the
//! message descriptor (ordinary name, group name, bracketed extension name,
//! or numeric label), the value grammar is enforced per cardinality, and
//! scalar literals are coerced to the field's declared kind.
//! `google.protobuf.Any` gets its own loop handling both the canonical
//! `type_url`/`value` form and the expanded `[url] { ... }` form.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::descriptor::{FieldDescriptor, Kind, MessageDescriptor};
use crate::error::{DecodeError, Error, ErrorSource, SyntaxError};
use crate::message::DynamicMessage;
use crate::registry::{global_registry, Resolver, ResolverError};
use crate::text::{NameKind, Token, TokenKind, Tokenizer};
use crate::value::{MapKey, Value};
use crate::wire;

/// Nesting ceiling for both parsing and skipping, guarding against stack
/// exhaustion on adversarial input.
const MAX_RECURSION_DEPTH: usize = 500;

/// Largest valid protobuf field number, `2^29 - 1`.
const MAX_FIELD_NUMBER: u64 = (1 << 29) - 1;

const ANY_TYPE_URL_NUMBER: u32 = 1;
const ANY_VALUE_NUMBER: u32 = 2;

/// Reads text-format `b` into `message` with default options.
pub fn unmarshal(b: &[u8], message: &mut DynamicMessage) -> Result<(), Error> {
    UnmarshalOptions::default().unmarshal(b, message)
}

/// Configurable text-format unmarshaling.
#[derive(Clone, Copy, Default)]
pub struct UnmarshalOptions<'r> {
    /// Accept input that leaves `required` fields unset. When off (the
    /// default), unmarshal fails if any required field is missing after the
    /// parse.
    pub allow_partial: bool,

    /// Silently skip unknown fields instead of failing on them.
    pub discard_unknown: bool,

    /// Type lookup for extension fields and `google.protobuf.Any`. Defaults
    /// to the process-wide [`global_registry`].
    pub resolver: Option<&'r dyn Resolver>,
}

impl UnmarshalOptions<'_> {
    /// Reads text-format `b` into `message`, which is reset first.
    pub fn unmarshal(&self, b: &[u8], message: &mut DynamicMessage) -> Result<(), Error> {
        message.clear();
        let mut decoder = Decoder {
            tok: Tokenizer::new(b),
            discard_unknown: self.discard_unknown,
            resolver: match self.resolver {
                Some(r) => r,
                None => global_registry(),
            },
            depth: 0,
        };
        decoder.unmarshal_message(message, false)?;
        if self.allow_partial {
            return Ok(());
        }
        match message.find_uninitialized() {
            Some(name) => Err(Error::Uninitialized { name }),
            None => Ok(()),
        }
    }
}

struct Decoder<'a, 'r> {
    tok: Tokenizer<'a>,
    discard_unknown: bool,
    resolver: &'r dyn Resolver,
    depth: usize,
}

impl Decoder<'_, '_> {
    fn new_error(&self, pos: usize, source: impl Into<ErrorSource>) -> Error {
        let (line, column) = self.tok.position(pos);
        Error::parse(source, line, column)
    }

    fn unexpected_token(&self, tok: &Token<'_>) -> Error {
        self.new_error(tok.pos(), SyntaxError::UnexpectedToken(tok.raw_string()))
    }

    fn unmarshal_message(
        &mut self,
        message: &mut DynamicMessage,
        check_delims: bool,
    ) -> Result<(), Error> {
        self.depth += 1;
        let res = self.unmarshal_message_inner(message, check_delims);
        self.depth -= 1;
        res
    }

    fn unmarshal_message_inner(
        &mut self,
        message: &mut DynamicMessage,
        check_delims: bool,
    ) -> Result<(), Error> {
        if self.depth > MAX_RECURSION_DEPTH {
            let pos = self.tok.peek().map_or(0, |t| t.pos());
            return Err(self.new_error(pos, SyntaxError::DepthLimit));
        }
        let desc = message.descriptor().clone();
        if !cfg!(feature = "legacy") && desc.is_message_set() {
            return Err(Error::LegacyMessageSet);
        }
        if desc.full_name() == "google.protobuf.Any" {
            return self.unmarshal_any(message, check_delims);
        }

        if check_delims {
            let tok = self.tok.read()?;
            if !matches!(tok.kind(), TokenKind::MessageOpen) {
                return Err(self.unexpected_token(&tok));
            }
        }

        let mut seen_numbers = IntSet::new();
        let mut seen_oneofs = IntSet::new();
        loop {
            // Read the field name.
            let tok = self.tok.read()?;
            let (name, has_separator) = match tok.kind() {
                TokenKind::Name {
                    name,
                    has_separator,
                } => (name.clone(), *has_separator),
                TokenKind::Eof => {
                    if check_delims {
                        return Err(self.new_error(tok.pos(), SyntaxError::UnexpectedEof));
                    }
                    return Ok(());
                }
                TokenKind::MessageClose if check_delims => return Ok(()),
                _ => return Err(self.unexpected_token(&tok)),
            };

            // Resolve the field descriptor.
            let mut fd: Option<FieldDescriptor> = None;
            let mut is_field_number = false;
            match &name {
                NameKind::Ident(ident) => {
                    fd = desc.field_by_name(ident);
                    if fd.is_none() {
                        // The proto name of a group field is all lowercase,
                        // while the textproto field name is the group
                        // message name.
                        let lower = ident.to_ascii_lowercase();
                        if let Some(gd) = desc.field_by_name(&lower) {
                            if gd.kind() == Kind::Group
                                && gd.message().is_some_and(|md| md.name() == *ident)
                            {
                                fd = Some(gd);
                            }
                        }
                    } else if fd.as_ref().is_some_and(|f| {
                        f.kind() == Kind::Group && f.message().is_some_and(|md| md.name() != *ident)
                    }) {
                        // The token was the field name, not the group
                        // message name.
                        fd = None;
                    }
                }
                NameKind::Type(type_name) => match self.find_extension(type_name) {
                    Ok(xt) => fd = Some(xt),
                    Err(ResolverError::NotFound) => {}
                    Err(err) => {
                        return Err(self.new_error(
                            tok.pos(),
                            DecodeError::UnresolvableExtension {
                                name: (*type_name).to_owned(),
                                reason: err.to_string(),
                            },
                        ))
                    }
                },
                NameKind::Number(num) => {
                    is_field_number = true;
                    if !(1..=MAX_FIELD_NUMBER).contains(num) {
                        return Err(
                            self.new_error(tok.pos(), DecodeError::InvalidFieldNumber(*num))
                        );
                    }
                    fd = desc.field_by_number(*num as u32);
                    if fd.is_none() {
                        match self
                            .resolver
                            .find_extension_by_number(desc.full_name(), *num as u32)
                        {
                            Ok(xt) => fd = Some(xt),
                            Err(ResolverError::NotFound) => {}
                            Err(err) => {
                                return Err(self.new_error(
                                    tok.pos(),
                                    DecodeError::UnresolvableExtension {
                                        name: tok.raw_string(),
                                        reason: err.to_string(),
                                    },
                                ))
                            }
                        }
                    }
                }
            }

            // A resolved extension must actually extend this message.
            if let Some(f) = &fd {
                if f.is_extension()
                    && (!desc.has_extension_range(f.number())
                        || f.containing_message_name() != desc.full_name())
                {
                    return Err(self.new_error(
                        tok.pos(),
                        DecodeError::CannotExtend {
                            message: desc.full_name().to_owned(),
                            extension: f.full_name().to_owned(),
                        },
                    ));
                }
            }
            if cfg!(feature = "legacy") {
                let unlinked_weak = fd.as_ref().is_some_and(|f| {
                    f.is_weak() && f.message().is_some_and(|md| md.is_placeholder())
                });
                if unlinked_weak {
                    fd = None;
                }
            }

            let Some(fd) = fd else {
                let reserved =
                    matches!(&name, NameKind::Ident(ident) if desc.is_reserved_name(ident));
                if self.discard_unknown || reserved {
                    self.skip_value()?;
                    continue;
                }
                return Err(self.new_error(tok.pos(), DecodeError::UnknownField(tok.raw_string())));
            };

            // Known or not, numeric labels are rejected: text format is not
            // a wire format.
            if is_field_number {
                return Err(self.new_error(tok.pos(), DecodeError::FieldByNumber(tok.raw_string())));
            }

            if fd.is_list() {
                if !fd.kind().is_message() && !has_separator {
                    return Err(self.new_error(tok.pos(), SyntaxError::MissingSeparator));
                }
                let list = message.mutable_list(&fd);
                self.unmarshal_list(&fd, list)?;
            } else if fd.is_map() {
                let map = message.mutable_map(&fd);
                self.unmarshal_map(&fd, map)?;
            } else {
                if !fd.kind().is_message() && !has_separator {
                    return Err(self.new_error(tok.pos(), SyntaxError::MissingSeparator));
                }
                if let Some(oneof) = fd.containing_oneof() {
                    let index = oneof.index() as u64;
                    if seen_oneofs.has(index) {
                        return Err(self.new_error(
                            tok.pos(),
                            DecodeError::OneofAlreadySet {
                                raw: tok.raw_string(),
                                oneof: oneof.full_name().to_owned(),
                            },
                        ));
                    }
                    seen_oneofs.set(index);
                }
                let number = u64::from(fd.number());
                if seen_numbers.has(number) {
                    return Err(
                        self.new_error(tok.pos(), DecodeError::DuplicateField(tok.raw_string()))
                    );
                }
                self.unmarshal_singular(&fd, message)?;
                seen_numbers.set(number);
            }
        }
    }

    /// Extension lookup with the proto1 MessageSet fallback: an item written
    /// as `[the.Message]` resolves through the `message_set_extension` field
    /// declared inside that message.
    fn find_extension(&self, name: &str) -> Result<FieldDescriptor, ResolverError> {
        let first = match self.resolver.find_extension_by_name(name) {
            Ok(xt) => return Ok(xt),
            Err(err) => err,
        };
        let set_name = format!("{name}.message_set_extension");
        if let Ok(xt) = self.resolver.find_extension_by_name(&set_name) {
            // A MessageSet item extension is a singular message field whose
            // type is the named message itself; anything else merely shares
            // the name.
            if xt.kind() == Kind::Message
                && !xt.is_list()
                && xt.message().is_some_and(|m| m.full_name() == name)
            {
                return Ok(xt);
            }
        }
        Err(first)
    }

    fn unmarshal_singular(
        &mut self,
        fd: &FieldDescriptor,
        message: &mut DynamicMessage,
    ) -> Result<(), Error> {
        let value = match fd.kind() {
            Kind::Message | Kind::Group => {
                let mut sub = DynamicMessage::new(message_type(fd));
                self.unmarshal_message(&mut sub, true)?;
                Value::Message(sub)
            }
            _ => self.unmarshal_scalar(fd)?,
        };
        message.set(fd, value);
        Ok(())
    }

    /// Coerces one scalar token to the field's declared kind.
    fn unmarshal_scalar(&mut self, fd: &FieldDescriptor) -> Result<Value, Error> {
        let tok = self.tok.read()?;
        if !matches!(tok.kind(), TokenKind::Scalar(_)) {
            return Err(self.unexpected_token(&tok));
        }
        let kind = fd.kind();
        let value = match kind {
            Kind::Bool => tok.bool_value().map(Value::Bool),
            Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => tok.int32().map(Value::I32),
            Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => tok.int64().map(Value::I64),
            Kind::Uint32 | Kind::Fixed32 => tok.uint32().map(Value::U32),
            Kind::Uint64 | Kind::Fixed64 => tok.uint64().map(Value::U64),
            Kind::Float => tok.float32().map(Value::F32),
            Kind::Double => tok.float64().map(Value::F64),
            Kind::String => match tok.bytes_value() {
                Some(b) => match std::str::from_utf8(b) {
                    Ok(s) => Some(Value::String(s.to_owned())),
                    Err(_) => return Err(self.new_error(tok.pos(), DecodeError::InvalidUtf8)),
                },
                None => None,
            },
            Kind::Bytes => tok.bytes_value().map(|b| Value::Bytes(b.to_vec())),
            Kind::Enum => {
                // An unknown identifier falls through to the integer parse;
                // only both failing is an error.
                tok.enum_ident()
                    .and_then(|ident| fd.enum_type().and_then(|e| e.value_by_name(ident)))
                    .or_else(|| tok.int32())
                    .map(Value::EnumNumber)
            }
            Kind::Message | Kind::Group => None,
        };
        value.ok_or_else(|| {
            self.new_error(
                tok.pos(),
                DecodeError::InvalidValue {
                    kind,
                    raw: tok.raw_string(),
                },
            )
        })
    }

    /// A list value: `[...]`, or a single bare element.
    fn unmarshal_list(
        &mut self,
        fd: &FieldDescriptor,
        list: &mut Vec<Value>,
    ) -> Result<(), Error> {
        let tok = self.tok.peek()?;
        if fd.kind().is_message() {
            match tok.kind() {
                TokenKind::ListOpen => {
                    self.tok.read()?;
                    loop {
                        let tok = self.tok.peek()?;
                        match tok.kind() {
                            TokenKind::ListClose => {
                                self.tok.read()?;
                                return Ok(());
                            }
                            TokenKind::MessageOpen => {
                                let mut sub = DynamicMessage::new(message_type(fd));
                                self.unmarshal_message(&mut sub, true)?;
                                list.push(Value::Message(sub));
                            }
                            _ => return Err(self.unexpected_token(&tok)),
                        }
                    }
                }
                TokenKind::MessageOpen => {
                    let mut sub = DynamicMessage::new(message_type(fd));
                    self.unmarshal_message(&mut sub, true)?;
                    list.push(Value::Message(sub));
                    Ok(())
                }
                _ => Err(self.unexpected_token(&tok)),
            }
        } else {
            match tok.kind() {
                TokenKind::ListOpen => {
                    self.tok.read()?;
                    loop {
                        let tok = self.tok.peek()?;
                        match tok.kind() {
                            TokenKind::ListClose => {
                                self.tok.read()?;
                                return Ok(());
                            }
                            TokenKind::Scalar(_) => list.push(self.unmarshal_scalar(fd)?),
                            _ => return Err(self.unexpected_token(&tok)),
                        }
                    }
                }
                TokenKind::Scalar(_) => {
                    list.push(self.unmarshal_scalar(fd)?);
                    Ok(())
                }
                _ => Err(self.unexpected_token(&tok)),
            }
        }
    }

    /// A map value: one `{key: ..., value: ...}` entry message, or a
    /// bracketed list of them.
    fn unmarshal_map(
        &mut self,
        fd: &FieldDescriptor,
        map: &mut BTreeMap<MapKey, Value>,
    ) -> Result<(), Error> {
        let tok = self.tok.read()?;
        match tok.kind() {
            TokenKind::MessageOpen => self.unmarshal_map_entry(fd, map),
            TokenKind::ListOpen => loop {
                let tok = self.tok.read()?;
                match tok.kind() {
                    TokenKind::ListClose => return Ok(()),
                    TokenKind::MessageOpen => self.unmarshal_map_entry(fd, map)?,
                    _ => return Err(self.unexpected_token(&tok)),
                }
            },
            _ => Err(self.unexpected_token(&tok)),
        }
    }

    /// One entry; the caller has consumed the opening delimiter.
    fn unmarshal_map_entry(
        &mut self,
        fd: &FieldDescriptor,
        map: &mut BTreeMap<MapKey, Value>,
    ) -> Result<(), Error> {
        let key_fd = fd.map_key();
        let value_fd = fd.map_value();
        let mut key: Option<MapKey> = None;
        let mut value: Option<Value> = None;
        loop {
            let tok = self.tok.read()?;
            let (name, has_separator) = match tok.kind() {
                TokenKind::Name {
                    name: NameKind::Ident(ident),
                    has_separator,
                } => (*ident, *has_separator),
                TokenKind::Name { .. } => {
                    if !self.discard_unknown {
                        return Err(self.new_error(
                            tok.pos(),
                            DecodeError::UnknownMapEntryField(tok.raw_string()),
                        ));
                    }
                    self.skip_value()?;
                    continue;
                }
                TokenKind::MessageClose => break,
                TokenKind::Eof => {
                    return Err(self.new_error(tok.pos(), SyntaxError::UnexpectedEof))
                }
                _ => return Err(self.unexpected_token(&tok)),
            };
            match name {
                "key" => {
                    if !has_separator {
                        return Err(self.new_error(tok.pos(), SyntaxError::MissingSeparator));
                    }
                    if key.is_some() {
                        return Err(self.new_error(tok.pos(), DecodeError::DuplicateMapKey));
                    }
                    key = Some(map_key(self.unmarshal_scalar(&key_fd)?));
                }
                "value" => {
                    if !value_fd.kind().is_message() && !has_separator {
                        return Err(self.new_error(tok.pos(), SyntaxError::MissingSeparator));
                    }
                    if value.is_some() {
                        return Err(self.new_error(tok.pos(), DecodeError::DuplicateMapValue));
                    }
                    value = Some(self.unmarshal_map_value(&value_fd)?);
                }
                _ => {
                    if !self.discard_unknown {
                        return Err(self.new_error(
                            tok.pos(),
                            DecodeError::UnknownMapEntryField(tok.raw_string()),
                        ));
                    }
                    self.skip_value()?;
                }
            }
        }
        let key = key.unwrap_or_else(|| map_key(key_fd.default_value()));
        let value = value.unwrap_or_else(|| match value_fd.kind() {
            // An absent message value still marks the entry present; give it
            // a fresh empty sub-message.
            Kind::Message | Kind::Group => Value::Message(DynamicMessage::new(message_type(
                &value_fd,
            ))),
            _ => value_fd.default_value(),
        });
        map.insert(key, value);
        Ok(())
    }

    fn unmarshal_map_value(&mut self, value_fd: &FieldDescriptor) -> Result<Value, Error> {
        match value_fd.kind() {
            Kind::Message | Kind::Group => {
                let mut sub = DynamicMessage::new(message_type(value_fd));
                self.unmarshal_message(&mut sub, true)?;
                Ok(Value::Message(sub))
            }
            _ => self.unmarshal_scalar(value_fd),
        }
    }

    /// `google.protobuf.Any`, in either canonical or expanded form.
    fn unmarshal_any(
        &mut self,
        message: &mut DynamicMessage,
        check_delims: bool,
    ) -> Result<(), Error> {
        let mut type_url = String::new();
        let mut value_bytes: Vec<u8> = Vec::new();
        // Seen markers; duplicates and cross-form mixes are conflicts.
        let mut has_type_url = false;
        let mut has_value = false;
        let mut has_expanded = false;

        if check_delims {
            let tok = self.tok.read()?;
            if !matches!(tok.kind(), TokenKind::MessageOpen) {
                return Err(self.unexpected_token(&tok));
            }
        }

        loop {
            let tok = self.tok.read()?;
            let (name, has_separator) = match tok.kind() {
                TokenKind::Name {
                    name,
                    has_separator,
                } => (name.clone(), *has_separator),
                TokenKind::MessageClose if check_delims => break,
                TokenKind::Eof if !check_delims => break,
                TokenKind::Eof => {
                    return Err(self.new_error(tok.pos(), SyntaxError::UnexpectedEof))
                }
                _ => return Err(self.unexpected_token(&tok)),
            };
            match &name {
                NameKind::Ident(ident) => {
                    if !has_separator {
                        return Err(self.new_error(tok.pos(), SyntaxError::MissingSeparator));
                    }
                    match *ident {
                        "type_url" => {
                            if has_type_url {
                                return Err(
                                    self.new_error(tok.pos(), DecodeError::DuplicateAnyTypeUrl)
                                );
                            }
                            if has_expanded {
                                return Err(self.new_error(
                                    tok.pos(),
                                    DecodeError::ConflictWithExpanded(type_url.clone()),
                                ));
                            }
                            let tok = self.tok.read()?;
                            type_url = match tok.bytes_value().map(std::str::from_utf8) {
                                Some(Ok(s)) => s.to_owned(),
                                _ => {
                                    return Err(self.new_error(
                                        tok.pos(),
                                        DecodeError::InvalidAnyTypeUrl(tok.raw_string()),
                                    ))
                                }
                            };
                            has_type_url = true;
                        }
                        "value" => {
                            if has_value {
                                return Err(
                                    self.new_error(tok.pos(), DecodeError::DuplicateAnyValue)
                                );
                            }
                            if has_expanded {
                                return Err(self.new_error(
                                    tok.pos(),
                                    DecodeError::ConflictWithExpanded(type_url.clone()),
                                ));
                            }
                            let tok = self.tok.read()?;
                            value_bytes = match tok.bytes_value() {
                                Some(b) => b.to_vec(),
                                None => {
                                    return Err(self.new_error(
                                        tok.pos(),
                                        DecodeError::InvalidAnyValue(tok.raw_string()),
                                    ))
                                }
                            };
                            has_value = true;
                        }
                        _ => {
                            if !self.discard_unknown {
                                return Err(self.new_error(
                                    tok.pos(),
                                    DecodeError::InvalidAnyFieldName(tok.raw_string()),
                                ));
                            }
                            self.skip_value()?;
                        }
                    }
                }
                NameKind::Type(url) => {
                    if has_expanded {
                        return Err(self.new_error(tok.pos(), DecodeError::MultipleAnyTypes));
                    }
                    if has_type_url {
                        return Err(self.new_error(tok.pos(), DecodeError::ConflictWithTypeUrl));
                    }
                    if has_value {
                        return Err(self.new_error(tok.pos(), DecodeError::ConflictWithValue));
                    }
                    type_url = (*url).to_owned();
                    value_bytes = self.unmarshal_expanded_any(url, tok.pos())?;
                    has_expanded = true;
                }
                NameKind::Number(_) => {
                    if !self.discard_unknown {
                        return Err(self.new_error(
                            tok.pos(),
                            DecodeError::InvalidAnyFieldName(tok.raw_string()),
                        ));
                    }
                    self.skip_value()?;
                }
            }
        }

        let desc = message.descriptor().clone();
        if !type_url.is_empty() {
            let fd = desc
                .field_by_number(ANY_TYPE_URL_NUMBER)
                .expect("Any descriptor has a type_url field");
            message.set(&fd, Value::String(type_url));
        }
        if !value_bytes.is_empty() {
            let fd = desc
                .field_by_number(ANY_VALUE_NUMBER)
                .expect("Any descriptor has a value field");
            message.set(&fd, Value::Bytes(value_bytes));
        }
        Ok(())
    }

    /// Parses the braced body of an expanded `Any` and re-serializes it
    /// deterministically into the payload bytes.
    fn unmarshal_expanded_any(&mut self, url: &str, pos: usize) -> Result<Vec<u8>, Error> {
        let desc = self.resolver.find_message_by_url(url).map_err(|err| {
            self.new_error(
                pos,
                DecodeError::UnresolvableAnyType {
                    url: url.to_owned(),
                    reason: err.to_string(),
                },
            )
        })?;
        let mut sub = DynamicMessage::new(desc);
        self.unmarshal_message(&mut sub, true)?;
        // Required fields inside an Any payload are never checked.
        Ok(wire::marshal(&sub))
    }

    /// Parses and discards one well-formed value. Structural validity is the
    /// tokenizer's job; only delimiter pairing matters here.
    fn skip_value(&mut self) -> Result<(), Error> {
        let tok = self.tok.read()?;
        match tok.kind() {
            TokenKind::MessageOpen => self.skip_message(),
            TokenKind::ListOpen => loop {
                let tok = self.tok.read()?;
                match tok.kind() {
                    TokenKind::ListClose => return Ok(()),
                    TokenKind::MessageOpen => self.skip_message()?,
                    TokenKind::Eof => {
                        return Err(self.new_error(tok.pos(), SyntaxError::UnexpectedEof))
                    }
                    // Elements may be of mixed scalar types; each token is
                    // its own value.
                    _ => {}
                }
            },
            _ => Ok(()),
        }
    }

    fn skip_message(&mut self) -> Result<(), Error> {
        self.depth += 1;
        let res = self.skip_message_inner();
        self.depth -= 1;
        res
    }

    fn skip_message_inner(&mut self) -> Result<(), Error> {
        if self.depth > MAX_RECURSION_DEPTH {
            let pos = self.tok.peek().map_or(0, |t| t.pos());
            return Err(self.new_error(pos, SyntaxError::DepthLimit));
        }
        loop {
            let tok = self.tok.read()?;
            match tok.kind() {
                TokenKind::MessageClose => return Ok(()),
                TokenKind::Name { .. } => self.skip_value()?,
                TokenKind::Eof => {
                    return Err(self.new_error(tok.pos(), SyntaxError::UnexpectedEof))
                }
                _ => {}
            }
        }
    }
}

fn message_type(fd: &FieldDescriptor) -> MessageDescriptor {
    fd.message().expect("message field has a message type")
}

fn map_key(value: Value) -> MapKey {
    value.into_map_key().expect("map keys are scalar kinds")
}

/// Seen-set for field numbers and oneof indices: a 64-bit mask for the
/// common case, spilling to a set for larger members.
#[derive(Default)]
struct IntSet {
    low: u64,
    high: BTreeSet<u64>,
}

impl IntSet {
    fn new() -> Self {
        IntSet::default()
    }

    fn has(&self, n: u64) -> bool {
        if n < 64 {
            self.low & 1 << n != 0
        } else {
            self.high.contains(&n)
        }
    }

    fn set(&mut self, n: u64) {
        if n < 64 {
            self.low |= 1 << n;
        } else {
            self.high.insert(n);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::IntSet;

    #[test]
    fn int_set_low_and_high() {
        let mut s = IntSet::new();
        assert!(!s.has(0));
        s.set(0);
        s.set(63);
        s.set(64);
        s.set(536_870_911);
        assert!(s.has(0));
        assert!(s.has(63));
        assert!(s.has(64));
        assert!(s.has(536_870_911));
        assert!(!s.has(1));
        assert!(!s.has(65));
    }
}
