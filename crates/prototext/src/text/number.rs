//! Number literal lexing and the typed parses behind the scalar accessors.
//!
//! Numbers are lexed as an undifferentiated span of text; the typed accessors
//! on [`Token`](super::Token) parse that span on demand, mirroring the fact
//! that the target kind is unknown until the decoder has resolved a field
//! descriptor. Each parse returns `None` on shape mismatch or overflow.

/// Length of the maximal number-shaped span at the start of `bytes`.
///
/// The span is deliberately generous: it swallows trailing identifier
/// characters (`1abc`) so that malformed numbers surface as a single token
/// whose typed parses all fail, rather than as two confusing tokens.
pub(super) fn lex_len(bytes: &[u8]) -> usize {
    let mut i = 0;
    if bytes.first() == Some(&b'-') {
        i += 1;
    }
    let mut prev_exp = false;
    while let Some(&b) = bytes.get(i) {
        let more = match b {
            b'0'..=b'9' | b'.' | b'_' => true,
            b'a'..=b'z' | b'A'..=b'Z' => true,
            b'+' | b'-' => prev_exp,
            _ => false,
        };
        if !more {
            break;
        }
        prev_exp = matches!(b, b'e' | b'E');
        i += 1;
    }
    i
}

/// Parses an integer literal into a sign and magnitude.
///
/// Accepts decimal, `0`-prefixed octal and `0x`-prefixed hex forms with an
/// optional leading `-`; rejects anything float-shaped.
pub(super) fn parse_int(raw: &[u8]) -> Option<(bool, u64)> {
    let s = std::str::from_utf8(raw).ok()?;
    let (neg, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    if s.is_empty() {
        return None;
    }
    let mag = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()?
    } else if s.len() > 1 && s.starts_with('0') {
        u64::from_str_radix(&s[1..], 8).ok()?
    } else {
        s.parse::<u64>().ok()?
    };
    Some((neg, mag))
}

pub(super) fn int32(raw: &[u8]) -> Option<i32> {
    let (neg, mag) = parse_int(raw)?;
    if neg {
        (mag <= 1 << 31).then(|| (mag as i64).wrapping_neg() as i32)
    } else {
        i32::try_from(mag).ok()
    }
}

pub(super) fn int64(raw: &[u8]) -> Option<i64> {
    let (neg, mag) = parse_int(raw)?;
    if neg {
        (mag <= 1 << 63).then(|| (mag as i64).wrapping_neg())
    } else {
        i64::try_from(mag).ok()
    }
}

pub(super) fn uint32(raw: &[u8]) -> Option<u32> {
    let (neg, mag) = parse_int(raw)?;
    if neg {
        return None;
    }
    u32::try_from(mag).ok()
}

pub(super) fn uint64(raw: &[u8]) -> Option<u64> {
    let (neg, mag) = parse_int(raw)?;
    (!neg).then_some(mag)
}

/// Parses a float literal, including the `-inf`/`-infinity`/`-nan` ident
/// forms the lexer folds into number tokens and a trailing protobuf `f`
/// suffix. Finite out-of-range literals are rejected rather than rounded to
/// infinity.
pub(super) fn float64(raw: &[u8]) -> Option<f64> {
    let s = std::str::from_utf8(raw).ok()?;
    if let Some(v) = special(s) {
        return Some(v);
    }
    let s = strip_suffix(s);
    let v: f64 = s.parse().ok()?;
    if v.is_infinite() {
        return None;
    }
    Some(v)
}

pub(super) fn float32(raw: &[u8]) -> Option<f32> {
    let s = std::str::from_utf8(raw).ok()?;
    if let Some(v) = special(s) {
        return Some(v as f32);
    }
    let s = strip_suffix(s);
    let v: f32 = s.parse().ok()?;
    if v.is_infinite() {
        return None;
    }
    Some(v)
}

/// The identifier-shaped float values, with optional leading `-`.
pub(super) fn special(s: &str) -> Option<f64> {
    let (neg, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let v = if s.eq_ignore_ascii_case("inf") || s.eq_ignore_ascii_case("infinity") {
        f64::INFINITY
    } else if s.eq_ignore_ascii_case("nan") {
        f64::NAN
    } else {
        return None;
    };
    Some(if neg { -v } else { v })
}

fn strip_suffix(s: &str) -> &str {
    s.strip_suffix(['f', 'F']).unwrap_or(s)
}
