//! Flatten/pack nested values to network-order bytes and remap them back.
//!
//! Encoding walks a value depth-first, collecting primitive leaves and their
//! format codes, then packs the leaves against the format string. Decoding
//! checks the supplied format string against the shape a [`TypeMap`] expects,
//! unpacks the bytes into flat leaves, and re-nests them by walking the map.

use crate::format::{derive_code, FormatCode, FormatString};
use crate::typemap::{ContainerKind, TypeMap};
use crate::value::{PrimitiveType, Record, Value};
use byteorder::{NetworkEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read, Write};

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),
    #[error("Unsupported shape: {0}")]
    UnsupportedShape(String),
    #[error("Format parse: {0}")]
    FormatParse(String),
    #[error("Format mismatch: type map expects '{expected}', got '{found}'")]
    FormatMismatch { expected: String, found: String },
    #[error("Type mismatch at leaf {position}: expected {expected}, found {found}")]
    TypeMismatch {
        position: usize,
        expected: PrimitiveType,
        found: &'static str,
    },
    #[error("Invalid UTF-8 in string at leaf {position}")]
    InvalidUtf8 { position: usize },
    #[error("Pack: {0}")]
    Pack(String),
    #[error("Unpack: {0}")]
    Unpack(String),
}

/// Result of [`encode`]: packed bytes, their format string and the flat leaves.
#[derive(Debug, Clone, PartialEq)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    pub format: FormatString,
    pub leaves: Vec<Value>,
}

/// Flatten a value depth-first into its format string and primitive leaves.
///
/// Container boundaries are dropped; only a [`TypeMap`] can restore them.
pub fn flatten(value: &Value) -> Result<(FormatString, Vec<Value>), CodecError> {
    let mut format = FormatString::new();
    let mut leaves = Vec::new();
    flatten_into(value, &mut format, &mut leaves)?;
    Ok((format, leaves))
}

fn flatten_into(value: &Value, format: &mut FormatString, leaves: &mut Vec<Value>) -> Result<(), CodecError> {
    match value {
        Value::List(items) | Value::Tuple(items) => {
            for item in items {
                flatten_into(item, format, leaves)?;
            }
        }
        Value::Record(r) => {
            for (_, v) in r.fields() {
                flatten_into(v, format, leaves)?;
            }
        }
        Value::Set(_) => {
            return Err(CodecError::UnsupportedShape(
                "set has no reproducible element order".to_string(),
            ))
        }
        leaf => {
            format.push(derive_code(leaf)?);
            leaves.push(leaf.clone());
        }
    }
    Ok(())
}

/// Encode a value: flatten, then pack in network byte order.
pub fn encode(value: &Value) -> Result<Encoded, CodecError> {
    let (format, leaves) = flatten(value)?;
    let bytes = pack(&format, &leaves)?;
    log::debug!(
        "encode: {} leaves, {} bytes, format {}",
        leaves.len(),
        bytes.len(),
        format.packer_format()
    );
    Ok(Encoded { bytes, format, leaves })
}

/// Pack primitive leaves against a format string.
///
/// Leaf count and per-slot types must match the codes exactly; a string must be
/// exactly as many UTF-8 bytes long as its code declares.
pub fn pack(format: &FormatString, leaves: &[Value]) -> Result<Vec<u8>, CodecError> {
    if format.leaf_count() != leaves.len() {
        return Err(CodecError::Pack(format!(
            "format {} has {} slots, got {} values",
            format,
            format.leaf_count(),
            leaves.len()
        )));
    }
    let mut out = Vec::new();
    for (i, (code, leaf)) in format.codes().iter().zip(leaves).enumerate() {
        write_leaf(&mut out, code, leaf).map_err(|e| match e {
            CodecError::Pack(msg) => CodecError::Pack(format!("slot {}: {}", i, msg)),
            other => other,
        })?;
    }
    Ok(out)
}

fn write_leaf(w: &mut Vec<u8>, code: &FormatCode, leaf: &Value) -> Result<(), CodecError> {
    match (code, leaf) {
        (FormatCode::Bool, Value::Bool(b)) => w.write_u8(u8::from(*b))?,
        (FormatCode::I16, Value::I16(x)) => w.write_i16::<NetworkEndian>(*x)?,
        (FormatCode::Float, Value::Float(x)) => w.write_f32::<NetworkEndian>(*x)?,
        (FormatCode::Double, Value::Double(x)) => w.write_f64::<NetworkEndian>(*x)?,
        (FormatCode::Char, Value::Bytes(b)) if b.len() == 1 => w.write_all(b)?,
        (FormatCode::Str(n), Value::Str(s)) => {
            if s.len() != *n {
                return Err(CodecError::Pack(format!(
                    "string is {} bytes, code {} declares {}",
                    s.len(),
                    code,
                    n
                )));
            }
            w.write_all(s.as_bytes())?;
        }
        (code, leaf) => {
            return Err(CodecError::Pack(format!(
                "code {} cannot hold a {} value",
                code,
                leaf.kind_name()
            )))
        }
    }
    Ok(())
}

/// Unpack bytes into flat primitive leaves, one per format code.
///
/// The buffer must be exactly [`FormatString::byte_len`] bytes long.
pub fn unpack(bytes: &[u8], format: &FormatString) -> Result<Vec<Value>, CodecError> {
    let expected = format.byte_len();
    if bytes.len() != expected {
        return Err(CodecError::Unpack(format!(
            "format {} needs {} bytes, got {}",
            format.packer_format(),
            expected,
            bytes.len()
        )));
    }
    let mut r = Cursor::new(bytes);
    let mut out = Vec::with_capacity(format.leaf_count());
    for (position, code) in format.codes().iter().enumerate() {
        let v = match code {
            FormatCode::Bool => Value::Bool(r.read_u8()? != 0),
            FormatCode::I16 => Value::I16(r.read_i16::<NetworkEndian>()?),
            FormatCode::Float => Value::Float(r.read_f32::<NetworkEndian>()?),
            FormatCode::Double => Value::Double(r.read_f64::<NetworkEndian>()?),
            FormatCode::Char => Value::Bytes(vec![r.read_u8()?]),
            FormatCode::Str(n) => {
                let mut buf = vec![0u8; *n];
                r.read_exact(&mut buf)?;
                let s = String::from_utf8(buf).map_err(|_| CodecError::InvalidUtf8 { position })?;
                Value::Str(s)
            }
        };
        log::trace!("unpack: leaf {} {} = {:?}", position, code, v);
        out.push(v);
    }
    Ok(out)
}

/// Re-nest flat leaves into the shape described by `type_map`.
///
/// Leaves are consumed positionally in depth-first order; each is type-checked
/// against its primitive node. Every leaf must be consumed.
pub fn remap(flat: Vec<Value>, type_map: &TypeMap) -> Result<Value, CodecError> {
    if flat.len() != type_map.size() {
        return Err(CodecError::Unpack(format!(
            "type map holds {} leaves, got {} values",
            type_map.size(),
            flat.len()
        )));
    }
    let mut leaves = flat.into_iter().enumerate();
    remap_node(&mut leaves, type_map)
}

fn remap_node<I>(leaves: &mut I, node: &TypeMap) -> Result<Value, CodecError>
where
    I: Iterator<Item = (usize, Value)>,
{
    match node {
        TypeMap::Primitive(expected) => {
            let (position, v) = leaves
                .next()
                .ok_or_else(|| CodecError::Unpack("ran out of leaves".to_string()))?;
            match v.primitive_type() {
                Some(t) if t == *expected => Ok(v),
                _ => Err(CodecError::TypeMismatch { position, expected: *expected, found: v.kind_name() }),
            }
        }
        TypeMap::Container(c) => {
            let mut items = Vec::with_capacity(c.element_count());
            for child in &c.children {
                items.push(remap_node(leaves, child)?);
            }
            Ok(match &c.kind {
                ContainerKind::List => Value::List(items),
                ContainerKind::Tuple => Value::Tuple(items),
                ContainerKind::Record { name, fields } => {
                    if fields.len() != items.len() {
                        return Err(CodecError::UnsupportedShape(format!(
                            "record {}: {} field names for {} children",
                            name,
                            fields.len(),
                            items.len()
                        )));
                    }
                    let mut record = Record::new(name.clone());
                    for (field, v) in fields.iter().zip(items) {
                        record.push(field.clone(), v);
                    }
                    Value::Record(record)
                }
            })
        }
    }
}

/// Check that a format string has the shape `type_map` expects.
///
/// String lengths are ignored (digit-stripped comparison).
pub fn check_format(format: &FormatString, type_map: &TypeMap) -> Result<(), CodecError> {
    let expected = type_map.expected_format();
    let found = format.stripped();
    if expected != found {
        log::warn!("format mismatch: type map expects '{}', got '{}'", expected, found);
        return Err(CodecError::FormatMismatch { expected, found });
    }
    Ok(())
}

/// Decode bytes back into the nested shape of `type_map`.
///
/// Fails atomically: either the full value is rebuilt and type-checked, or an
/// error is returned.
pub fn decode(bytes: &[u8], format: &FormatString, type_map: &TypeMap) -> Result<Value, CodecError> {
    check_format(format, type_map)?;
    let flat = unpack(bytes, format)?;
    let value = remap(flat, type_map)?;
    log::debug!("decode: {} bytes into {} leaves", bytes.len(), type_map.size());
    Ok(value)
}

/// [`decode`] with format text (e.g. `"!2shf"`) as received from a peer.
pub fn decode_str(bytes: &[u8], format: &str, type_map: &TypeMap) -> Result<Value, CodecError> {
    decode(bytes, &FormatString::parse(format)?, type_map)
}
