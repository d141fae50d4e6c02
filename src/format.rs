//! Format codes and format strings.
//!
//! Each primitive leaf maps to one code of a fixed alphabet:
//!
//! | Code | Type | Wire width |
//! |------|------|------------|
//! | `?` | bool | 1 |
//! | `h` | i16 | 2 |
//! | `f` | f32 | 4 |
//! | `d` | f64 | 8 |
//! | `c` | single byte | 1 |
//! | `<N>s` | UTF-8 string | N |
//!
//! A [`FormatString`] is the concatenation of these codes in depth-first leaf order.
//! Container boundaries are not recorded; only a [`TypeMap`](crate::typemap::TypeMap)
//! can restore them. The byte-order marker (`!`, network order) is added only when the
//! string is rendered for the packer ([`FormatString::packer_format`]).

use crate::codec::CodecError;
use crate::parser;
use crate::value::{PrimitiveType, Value};
use std::fmt;
use std::str::FromStr;

/// Byte-order marker prepended for the packer: network (big-endian).
pub const NETWORK_ORDER: char = '!';

/// One entry of a format string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatCode {
    Bool,
    I16,
    Float,
    Double,
    Char,
    /// String occupying exactly N bytes on the wire.
    Str(usize),
}

impl FormatCode {
    /// Code character, without any length prefix.
    pub fn symbol(&self) -> char {
        match self {
            FormatCode::Bool => '?',
            FormatCode::I16 => 'h',
            FormatCode::Float => 'f',
            FormatCode::Double => 'd',
            FormatCode::Char => 'c',
            FormatCode::Str(_) => 's',
        }
    }

    /// Bytes occupied on the wire. A string's digit prefix adds nothing.
    pub fn width(&self) -> usize {
        match self {
            FormatCode::Bool | FormatCode::Char => 1,
            FormatCode::I16 => 2,
            FormatCode::Float => 4,
            FormatCode::Double => 8,
            FormatCode::Str(n) => *n,
        }
    }

    pub fn primitive(&self) -> PrimitiveType {
        match self {
            FormatCode::Bool => PrimitiveType::Bool,
            FormatCode::I16 => PrimitiveType::I16,
            FormatCode::Float => PrimitiveType::Float,
            FormatCode::Double => PrimitiveType::Double,
            FormatCode::Char => PrimitiveType::Byte,
            FormatCode::Str(_) => PrimitiveType::Str,
        }
    }

    /// Code for a leaf type. Strings need their byte length.
    pub fn for_primitive(ty: PrimitiveType, str_len: usize) -> Self {
        match ty {
            PrimitiveType::Bool => FormatCode::Bool,
            PrimitiveType::I16 => FormatCode::I16,
            PrimitiveType::Float => FormatCode::Float,
            PrimitiveType::Double => FormatCode::Double,
            PrimitiveType::Byte => FormatCode::Char,
            PrimitiveType::Str => FormatCode::Str(str_len),
        }
    }
}

impl fmt::Display for FormatCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatCode::Str(n) => write!(f, "{}s", n),
            other => write!(f, "{}", other.symbol()),
        }
    }
}

/// Ordered sequence of format codes, one per flattened leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FormatString {
    codes: Vec<FormatCode>,
}

impl FormatString {
    pub fn new() -> Self {
        FormatString { codes: Vec::new() }
    }

    /// Parse format text such as `"!2shf"`. The byte-order marker is optional,
    /// but when present it must be network order (`!` or `>`).
    pub fn parse(source: &str) -> Result<Self, CodecError> {
        let codes = parser::parse_format(source).map_err(CodecError::FormatParse)?;
        Ok(FormatString { codes })
    }

    pub fn codes(&self) -> &[FormatCode] {
        &self.codes
    }

    pub fn push(&mut self, code: FormatCode) {
        self.codes.push(code);
    }

    pub fn extend(&mut self, other: FormatString) {
        self.codes.extend(other.codes);
    }

    /// Number of value slots (= number of codes; digit prefixes are not slots).
    pub fn leaf_count(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Total packed length in bytes. Saturates instead of overflowing on
    /// absurd string lengths from untrusted format text.
    pub fn byte_len(&self) -> usize {
        self.codes.iter().fold(0usize, |acc, c| acc.saturating_add(c.width()))
    }

    /// Digit-free form, used to compare against the shape a TypeMap expects.
    pub fn stripped(&self) -> String {
        self.codes.iter().map(FormatCode::symbol).collect()
    }

    /// Format text as handed to the packer: marker plus codes.
    pub fn packer_format(&self) -> String {
        format!("{}{}", NETWORK_ORDER, self)
    }
}

impl fmt::Display for FormatString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for code in &self.codes {
            write!(f, "{}", code)?;
        }
        Ok(())
    }
}

impl FromStr for FormatString {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormatString::parse(s)
    }
}

impl FromIterator<FormatCode> for FormatString {
    fn from_iter<I: IntoIterator<Item = FormatCode>>(iter: I) -> Self {
        FormatString { codes: iter.into_iter().collect() }
    }
}

/// Format code of a single primitive value.
///
/// Strings are measured in UTF-8 bytes, not characters, so `"héllo"` is `6s`.
/// Raw bytes only have a code when exactly one byte long.
pub fn derive_code(value: &Value) -> Result<FormatCode, CodecError> {
    match value {
        Value::Bool(_) => Ok(FormatCode::Bool),
        Value::I16(_) => Ok(FormatCode::I16),
        Value::Float(_) => Ok(FormatCode::Float),
        Value::Double(_) => Ok(FormatCode::Double),
        Value::Bytes(b) if b.len() == 1 => Ok(FormatCode::Char),
        Value::Bytes(b) => Err(CodecError::UnsupportedType(format!(
            "raw bytes of length {} (only single bytes have a format code)",
            b.len()
        ))),
        Value::Str(s) => Ok(FormatCode::Str(s.len())),
        other => Err(CodecError::UnsupportedType(format!(
            "{} is not a primitive value",
            other.kind_name()
        ))),
    }
}

/// Full format string of a (possibly nested) value, in depth-first leaf order.
pub fn derive_code_sequence(value: &Value) -> Result<FormatString, CodecError> {
    let mut out = FormatString::new();
    push_codes(value, &mut out)?;
    Ok(out)
}

fn push_codes(value: &Value, out: &mut FormatString) -> Result<(), CodecError> {
    match value {
        Value::List(items) | Value::Tuple(items) => {
            for item in items {
                push_codes(item, out)?;
            }
            Ok(())
        }
        Value::Record(r) => {
            for (_, v) in r.fields() {
                push_codes(v, out)?;
            }
            Ok(())
        }
        Value::Set(_) => Err(CodecError::UnsupportedShape(
            "set has no reproducible element order".to_string(),
        )),
        leaf => {
            out.push(derive_code(leaf)?);
            Ok(())
        }
    }
}
