//! Error types for text-format decoding.
//!
//! Every error produced while consuming input carries the source position of
//! the offending token as a `(line, column)` pair. The only position-free
//! errors are the post-parse required-field check and the MessageSet
//! rejection, which are not tied to a single token.

use thiserror::Error;

use crate::descriptor::Kind;

/// Top-level error returned by [`unmarshal`](crate::unmarshal) and
/// [`UnmarshalOptions::unmarshal`](crate::UnmarshalOptions::unmarshal).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Parsing failed. `line` and `column` are 1-based and derived from the
    /// byte position of the offending token.
    #[error("(line {line}:{column}): {source}")]
    Parse {
        source: ErrorSource,
        line: usize,
        column: usize,
    },

    /// A required field was absent after a successful parse. Only produced
    /// when `allow_partial` is off.
    #[error("required field {name} not set")]
    Uninitialized { name: String },

    /// The target descriptor is a proto1 MessageSet and the `legacy` feature
    /// is not enabled.
    #[error("no support for proto1 MessageSets")]
    LegacyMessageSet,
}

impl Error {
    pub(crate) fn parse(source: impl Into<ErrorSource>, line: usize, column: usize) -> Self {
        Error::Parse {
            source: source.into(),
            line,
            column,
        }
    }

    /// The source position of a parse error, if this is one.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            Error::Parse { line, column, .. } => Some((*line, *column)),
            _ => None,
        }
    }
}

/// What went wrong inside a [`Error::Parse`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorSource {
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("{0}")]
    Decode(#[from] DecodeError),
}

/// Token-layer errors: malformed input independent of any descriptor.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyntaxError {
    #[error("invalid character {0:?}")]
    InvalidChar(char),
    #[error("invalid field name: {0}")]
    InvalidName(String),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("invalid escape sequence {0:?} in string literal")]
    InvalidEscape(String),
    #[error("newline in string literal")]
    NewlineInString,
    #[error("invalid number literal: {0}")]
    InvalidNumber(String),
    #[error("missing field separator :")]
    MissingSeparator,
    #[error("unexpected token: {0}")]
    UnexpectedToken(String),
    #[error("mismatched closing delimiter {0:?}")]
    MismatchedDelimiter(char),
    #[error("lists cannot be nested")]
    NestedList,
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("exceeded maximum recursion depth")]
    DepthLimit,
}

/// Descriptor-driven errors: the input is well-formed text format but does
/// not fit the target schema.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("invalid field number: {0}")]
    InvalidFieldNumber(u64),
    #[error("unknown field: {0}")]
    UnknownField(String),
    #[error("cannot specify field by number: {0}")]
    FieldByNumber(String),
    #[error("message {message} cannot be extended by {extension}")]
    CannotExtend { message: String, extension: String },
    #[error("unable to resolve [{name}]: {reason}")]
    UnresolvableExtension { name: String, reason: String },
    #[error("error parsing {raw:?}, oneof {oneof} is already set")]
    OneofAlreadySet { raw: String, oneof: String },
    #[error("non-repeated field {0:?} is repeated")]
    DuplicateField(String),
    #[error("invalid value for {kind} type: {raw}")]
    InvalidValue { kind: Kind, raw: String },
    #[error("contains invalid UTF-8")]
    InvalidUtf8,
    #[error("map entry \"key\" cannot be repeated")]
    DuplicateMapKey,
    #[error("map entry \"value\" cannot be repeated")]
    DuplicateMapValue,
    #[error("unknown map entry field {0:?}")]
    UnknownMapEntryField(String),
    #[error("duplicate Any type_url field")]
    DuplicateAnyTypeUrl,
    #[error("duplicate Any value field")]
    DuplicateAnyValue,
    #[error("conflict with type_url field")]
    ConflictWithTypeUrl,
    #[error("conflict with value field")]
    ConflictWithValue,
    #[error("conflict with [{0}] field")]
    ConflictWithExpanded(String),
    #[error("cannot have more than one type")]
    MultipleAnyTypes,
    #[error("invalid field name {0:?} in google.protobuf.Any message")]
    InvalidAnyFieldName(String),
    #[error("invalid Any type_url: {0}")]
    InvalidAnyTypeUrl(String),
    #[error("invalid Any value: {0}")]
    InvalidAnyValue(String),
    #[error("unable to resolve message [{url}]: {reason}")]
    UnresolvableAnyType { url: String, reason: String },
}
