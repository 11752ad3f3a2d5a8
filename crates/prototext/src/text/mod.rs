//! The text-format tokenizer.
//!
//! This module turns a byte buffer into the token stream the decoder
//! consumes: field names (identifier, bracketed type name, or field number,
//! each recording whether a `:` separator followed), undifferentiated scalar
//! literals with typed on-demand accessors, message and list delimiters, and
//! EOF. The stream supports exactly one token of lookahead via [`peek`]
//! (`Tokenizer::peek`); the decoder never backtracks further.
//!
//! Whether a given character starts a field name or a value depends on
//! position, so the lexer runs a small state machine: after a name token the
//! next token is lexed in value position, and a delimiter stack tracks
//! whether we are inside a message (`{`/`<`), where names are expected, or a
//! bracketed list, where comma-separated values are. The stack also enforces
//! matching close delimiters, which is what lets the decoder's skip machine
//! discard unknown values without re-validating structure.

mod number;
mod string;


use smallvec::SmallVec;

use crate::error::{Error, SyntaxError};

/// A single lexed token. Borrows the input buffer for raw text and payloads.
#[derive(Clone, Debug)]
pub struct Token<'a> {
    kind: TokenKind<'a>,
    pos: usize,
    raw: &'a [u8],
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind<'a> {
    /// A field label, with whether a `:` separator followed it.
    Name {
        name: NameKind<'a>,
        has_separator: bool,
    },
    /// An undifferentiated scalar literal; use the typed accessors.
    Scalar(Lit<'a>),
    /// `{` or `<`.
    MessageOpen,
    /// `}` or `>`.
    MessageClose,
    /// `[` in value position.
    ListOpen,
    /// `]`.
    ListClose,
    Eof,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NameKind<'a> {
    /// An ordinary field name (or group message name).
    Ident(&'a str),
    /// The bracket-enclosed name of an extension field or `Any` type URL,
    /// without the brackets.
    Type(&'a str),
    /// A numeric field label. Out-of-range values saturate; the decoder
    /// rejects them either way.
    Number(u64),
}

/// Scalar literal payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Lit<'a> {
    /// Decoded bytes of one or more adjacent quoted literals.
    Bytes(Vec<u8>),
    /// Raw text of a number literal.
    Number(&'a [u8]),
    /// A bare identifier: booleans, `inf`/`nan`, enum value names.
    Ident(&'a str),
}

impl<'a> Token<'a> {
    pub fn kind(&self) -> &TokenKind<'a> {
        &self.kind
    }

    /// Byte offset of the token start, for [`Tokenizer::position`].
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// The raw source text of the token, for diagnostics.
    pub fn raw_string(&self) -> String {
        String::from_utf8_lossy(self.raw).into_owned()
    }

    pub fn bool_value(&self) -> Option<bool> {
        match self.lit()? {
            Lit::Ident("true" | "True" | "t") => Some(true),
            Lit::Ident("false" | "False" | "f") => Some(false),
            Lit::Number(b"1") => Some(true),
            Lit::Number(b"0") => Some(false),
            _ => None,
        }
    }

    pub fn int32(&self) -> Option<i32> {
        match self.lit()? {
            Lit::Number(raw) => number::int32(raw),
            _ => None,
        }
    }

    pub fn int64(&self) -> Option<i64> {
        match self.lit()? {
            Lit::Number(raw) => number::int64(raw),
            _ => None,
        }
    }

    pub fn uint32(&self) -> Option<u32> {
        match self.lit()? {
            Lit::Number(raw) => number::uint32(raw),
            _ => None,
        }
    }

    pub fn uint64(&self) -> Option<u64> {
        match self.lit()? {
            Lit::Number(raw) => number::uint64(raw),
            _ => None,
        }
    }

    pub fn float32(&self) -> Option<f32> {
        match self.lit()? {
            Lit::Number(raw) => number::float32(raw),
            Lit::Ident(s) => number::special(s).map(|v| v as f32),
            _ => None,
        }
    }

    pub fn float64(&self) -> Option<f64> {
        match self.lit()? {
            Lit::Number(raw) => number::float64(raw),
            Lit::Ident(s) => number::special(s),
            _ => None,
        }
    }

    /// Decoded bytes of a string literal. UTF-8 validity is the caller's
    /// concern; `bytes` fields take these verbatim.
    pub fn bytes_value(&self) -> Option<&[u8]> {
        match self.lit()? {
            Lit::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// The literal as an enum value identifier.
    pub fn enum_ident(&self) -> Option<&'a str> {
        match self.lit()? {
            Lit::Ident(s) => Some(*s),
            _ => None,
        }
    }

    fn lit(&self) -> Option<&Lit<'a>> {
        match &self.kind {
            TokenKind::Scalar(lit) => Some(lit),
            _ => None,
        }
    }
}

/// Whether the lexer is looking at a field name or a field value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LexPos {
    FieldName,
    FieldValue,
}

/// An open delimiter awaiting its matching close.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Delim {
    Brace,
    Angle,
    Bracket,
}

pub struct Tokenizer<'a> {
    input: &'a [u8],
    pos: usize,
    peeked: Option<Token<'a>>,
    state: LexPos,
    delims: SmallVec<[Delim; 8]>,
    /// Set after a value inside a list; the next element needs a `,` first.
    need_list_sep: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Tokenizer {
            input,
            pos: 0,
            peeked: None,
            state: LexPos::FieldName,
            delims: SmallVec::new(),
            need_list_sep: false,
        }
    }

    /// Consumes and returns the next token.
    pub fn read(&mut self) -> Result<Token<'a>, Error> {
        if let Some(tok) = self.peeked.take() {
            return Ok(tok);
        }
        self.lex()
    }

    /// Returns the next token without consuming it.
    pub fn peek(&mut self) -> Result<Token<'a>, Error> {
        if self.peeked.is_none() {
            let tok = self.lex()?;
            self.peeked = Some(tok);
        }
        Ok(self.peeked.clone().expect("just peeked"))
    }

    /// Maps a byte offset to a 1-based `(line, column)` pair. Columns count
    /// characters since the last newline.
    pub fn position(&self, pos: usize) -> (usize, usize) {
        let pos = pos.min(self.input.len());
        let before = &self.input[..pos];
        let line_start = match before.iter().rposition(|&b| b == b'\n') {
            Some(i) => i + 1,
            None => 0,
        };
        let line = 1 + before.iter().filter(|&&b| b == b'\n').count();
        // Continuation bytes don't start a character.
        let column = 1 + before[line_start..]
            .iter()
            .filter(|&&b| b & 0xC0 != 0x80)
            .count();
        (line, column)
    }

    pub(crate) fn syntax_error(&self, pos: usize, source: SyntaxError) -> Error {
        let (line, column) = self.position(pos);
        Error::parse(source, line, column)
    }

    fn lex(&mut self) -> Result<Token<'a>, Error> {
        self.skip_ignored();
        if self.state == LexPos::FieldValue && self.in_list() && self.need_list_sep {
            self.lex_list_separator()?;
        }
        let start = self.pos;
        let Some(&b) = self.input.get(self.pos) else {
            return Ok(self.token(TokenKind::Eof, start));
        };
        match self.state {
            LexPos::FieldName => self.lex_name(start, b),
            LexPos::FieldValue => self.lex_value(start, b),
        }
    }

    fn lex_name(&mut self, start: usize, b: u8) -> Result<Token<'a>, Error> {
        match b {
            b'}' | b'>' => {
                let want = if b == b'}' { Delim::Brace } else { Delim::Angle };
                if self.delims.last() != Some(&want) {
                    return Err(self.syntax_error(start, SyntaxError::MismatchedDelimiter(b as char)));
                }
                self.delims.pop();
                self.pos += 1;
                let end = self.pos;
                self.end_of_value();
                Ok(Token {
                    kind: TokenKind::MessageClose,
                    pos: start,
                    raw: &self.input[start..end],
                })
            }
            b'[' => self.lex_type_name(start),
            b'0'..=b'9' => self.lex_field_number(start),
            _ if is_ident_start(b) => {
                let name = self.lex_ident();
                let end = self.pos;
                let has_separator = self.lex_separator();
                self.state = LexPos::FieldValue;
                Ok(Token {
                    kind: TokenKind::Name {
                        name: NameKind::Ident(name),
                        has_separator,
                    },
                    pos: start,
                    raw: &self.input[start..end],
                })
            }
            _ => Err(self.syntax_error(start, SyntaxError::InvalidChar(b as char))),
        }
    }

    /// `[fully.qualified.Name]` or `[type.url/fully.qualified.Name]`.
    fn lex_type_name(&mut self, start: usize) -> Result<Token<'a>, Error> {
        self.pos += 1;
        let name_start = self.pos;
        while let Some(&b) = self.input.get(self.pos) {
            if b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'/' | b'-') {
                self.pos += 1;
            } else {
                break;
            }
        }
        let name = ascii_str(&self.input[name_start..self.pos]);
        let bad_name = || {
            let raw = String::from_utf8_lossy(&self.input[start..self.pos.min(self.input.len())]);
            SyntaxError::InvalidName(raw.into_owned())
        };
        if name.is_empty() || name.starts_with(['.', '/', '-']) || name.ends_with(['.', '/', '-']) {
            return Err(self.syntax_error(start, bad_name()));
        }
        if self.input.get(self.pos) != Some(&b']') {
            return Err(self.syntax_error(start, bad_name()));
        }
        self.pos += 1;
        let end = self.pos;
        let has_separator = self.lex_separator();
        self.state = LexPos::FieldValue;
        Ok(Token {
            kind: TokenKind::Name {
                name: NameKind::Type(name),
                has_separator,
            },
            pos: start,
            raw: &self.input[start..end],
        })
    }

    fn lex_field_number(&mut self, start: usize) -> Result<Token<'a>, Error> {
        let mut num: u64 = 0;
        while let Some(&b) = self.input.get(self.pos) {
            if !b.is_ascii_digit() {
                break;
            }
            num = num.saturating_mul(10).saturating_add(u64::from(b - b'0'));
            self.pos += 1;
        }
        // `1abc` is not a field number.
        if let Some(&b) = self.input.get(self.pos) {
            if is_ident_char(b) || b == b'.' {
                while let Some(&b) = self.input.get(self.pos) {
                    if !is_ident_char(b) && b != b'.' {
                        break;
                    }
                    self.pos += 1;
                }
                let raw = ascii_str(&self.input[start..self.pos]).to_owned();
                return Err(self.syntax_error(start, SyntaxError::InvalidName(raw)));
            }
        }
        let end = self.pos;
        let has_separator = self.lex_separator();
        self.state = LexPos::FieldValue;
        Ok(Token {
            kind: TokenKind::Name {
                name: NameKind::Number(num),
                has_separator,
            },
            pos: start,
            raw: &self.input[start..end],
        })
    }

    fn lex_value(&mut self, start: usize, b: u8) -> Result<Token<'a>, Error> {
        match b {
            b'{' | b'<' => {
                self.delims
                    .push(if b == b'{' { Delim::Brace } else { Delim::Angle });
                self.pos += 1;
                self.state = LexPos::FieldName;
                Ok(self.token(TokenKind::MessageOpen, start))
            }
            b'[' => {
                if self.in_list() {
                    return Err(self.syntax_error(start, SyntaxError::NestedList));
                }
                self.delims.push(Delim::Bracket);
                self.need_list_sep = false;
                self.pos += 1;
                Ok(self.token(TokenKind::ListOpen, start))
            }
            b']' => {
                if !self.in_list() {
                    return Err(self.syntax_error(start, SyntaxError::MismatchedDelimiter(']')));
                }
                self.delims.pop();
                self.pos += 1;
                let end = self.pos;
                self.end_of_value();
                Ok(Token {
                    kind: TokenKind::ListClose,
                    pos: start,
                    raw: &self.input[start..end],
                })
            }
            b'"' | b'\'' => self.lex_string(start),
            b'-' | b'.' | b'0'..=b'9' => self.lex_number(start),
            _ if is_ident_start(b) => {
                let ident = self.lex_ident();
                let end = self.pos;
                self.end_of_scalar();
                Ok(Token {
                    kind: TokenKind::Scalar(Lit::Ident(ident)),
                    pos: start,
                    raw: &self.input[start..end],
                })
            }
            _ => Err(self.syntax_error(start, SyntaxError::InvalidChar(b as char))),
        }
    }

    /// One or more adjacent quoted literals, concatenated.
    fn lex_string(&mut self, start: usize) -> Result<Token<'a>, Error> {
        let mut bytes = Vec::new();
        let mut end;
        loop {
            match string::lex_string(self.input, self.pos, &mut bytes) {
                Ok(next) => {
                    self.pos = next;
                    end = next;
                }
                Err((pos, e)) => return Err(self.syntax_error(pos, e)),
            }
            self.skip_ignored();
            if !matches!(self.input.get(self.pos), Some(b'"' | b'\'')) {
                break;
            }
        }
        self.end_of_scalar();
        Ok(Token {
            kind: TokenKind::Scalar(Lit::Bytes(bytes)),
            pos: start,
            raw: &self.input[start..end],
        })
    }

    fn lex_number(&mut self, start: usize) -> Result<Token<'a>, Error> {
        let len = number::lex_len(&self.input[start..]);
        if len == 0 || (len == 1 && self.input[start] == b'-') {
            let raw = String::from_utf8_lossy(&self.input[start..start + len.max(1)]).into_owned();
            return Err(self.syntax_error(start, SyntaxError::InvalidNumber(raw)));
        }
        self.pos = start + len;
        let raw = &self.input[start..self.pos];
        self.end_of_scalar();
        Ok(Token {
            kind: TokenKind::Scalar(Lit::Number(raw)),
            pos: start,
            raw,
        })
    }

    fn lex_ident(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(&b) = self.input.get(self.pos) {
            if !is_ident_char(b) {
                break;
            }
            self.pos += 1;
        }
        ascii_str(&self.input[start..self.pos])
    }

    /// Consumes an optional `:` after a field name.
    fn lex_separator(&mut self) -> bool {
        self.skip_ignored();
        if self.input.get(self.pos) == Some(&b':') {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consumes an optional `,` between list elements. A comma directly
    /// before the closing `]` is invalid.
    fn lex_list_separator(&mut self) -> Result<(), Error> {
        self.need_list_sep = false;
        if self.input.get(self.pos) == Some(&b',') {
            self.pos += 1;
            self.skip_ignored();
            if self.input.get(self.pos) == Some(&b']') {
                return Err(self.syntax_error(self.pos, SyntaxError::UnexpectedToken("]".into())));
            }
        }
        Ok(())
    }

    /// State transition after a scalar value.
    fn end_of_scalar(&mut self) {
        if self.in_list() {
            self.need_list_sep = true;
        } else {
            self.state = LexPos::FieldName;
            self.lex_field_separator();
        }
    }

    /// State transition after a `}`, `>` or `]` close.
    fn end_of_value(&mut self) {
        if self.in_list() {
            // The closed message was a list element.
            self.state = LexPos::FieldValue;
            self.need_list_sep = true;
        } else {
            self.state = LexPos::FieldName;
            self.lex_field_separator();
        }
    }

    /// Consumes an optional `;` or `,` after a field.
    fn lex_field_separator(&mut self) {
        self.skip_ignored();
        if matches!(self.input.get(self.pos), Some(b';' | b',')) {
            self.pos += 1;
        }
    }

    fn skip_ignored(&mut self) {
        while let Some(&b) = self.input.get(self.pos) {
            match b {
                b' ' | b'\t' | b'\r' | b'\n' => self.pos += 1,
                b'#' => {
                    while let Some(&b) = self.input.get(self.pos) {
                        self.pos += 1;
                        if b == b'\n' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn in_list(&self) -> bool {
        self.delims.last() == Some(&Delim::Bracket)
    }

    fn token(&self, kind: TokenKind<'a>, start: usize) -> Token<'a> {
        Token {
            kind,
            pos: start,
            raw: &self.input[start..self.pos],
        }
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Slices lexed with ASCII-only character classes are valid UTF-8.
fn ascii_str(bytes: &[u8]) -> &str {
    std::str::from_utf8(bytes).expect("ascii token text")
}
