//! Runtime values for flattening/remapping (codec representation).

use crate::codec::CodecError;
use std::fmt;

/// Leaf type tag. One per wire format code family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Bool,
    I16,
    Float,
    Double,
    /// Single raw byte (`c`).
    Byte,
    /// UTF-8 text (`<N>s`).
    Str,
}

impl PrimitiveType {
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Bool => "bool",
            PrimitiveType::I16 => "i16",
            PrimitiveType::Float => "f32",
            PrimitiveType::Double => "f64",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Str => "string",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single value: primitive leaf or container.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I16(i16),
    Float(f32),
    Double(f64),
    /// Raw bytes. Only a single byte has a wire code (`c`).
    Bytes(Vec<u8>),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Record(Record),
    /// Unordered collection. Accepted as a value, rejected by every wire operation.
    Set(Vec<Value>),
}

impl Value {
    /// Leaf type of a primitive value; `None` for containers.
    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        match self {
            Value::Bool(_) => Some(PrimitiveType::Bool),
            Value::I16(_) => Some(PrimitiveType::I16),
            Value::Float(_) => Some(PrimitiveType::Float),
            Value::Double(_) => Some(PrimitiveType::Double),
            Value::Bytes(_) => Some(PrimitiveType::Byte),
            Value::Str(_) => Some(PrimitiveType::Str),
            Value::List(_) | Value::Tuple(_) | Value::Record(_) | Value::Set(_) => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        self.primitive_type().is_some()
    }

    /// Short name used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Record(_) => "record",
            Value::Set(_) => "set",
            other => other.primitive_type().map(|t| t.name()).unwrap_or("unknown"),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_i16(&self) -> Option<i16> {
        match self {
            Value::I16(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Elements of a list or tuple.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) | Value::Tuple(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::I16(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::Bytes(vec![v])
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Record(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

/// Conversion out of a decoded [`Value`], used when rebuilding typed records.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, CodecError>;
}

macro_rules! impl_from_value {
    ($ty:ty, $variant:ident, $prim:expr) => {
        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self, CodecError> {
                match value {
                    Value::$variant(x) => Ok(x),
                    other => Err(CodecError::TypeMismatch {
                        position: 0,
                        expected: $prim,
                        found: other.kind_name(),
                    }),
                }
            }
        }
    };
}

impl_from_value!(bool, Bool, PrimitiveType::Bool);
impl_from_value!(i16, I16, PrimitiveType::I16);
impl_from_value!(f32, Float, PrimitiveType::Float);
impl_from_value!(f64, Double, PrimitiveType::Double);
impl_from_value!(String, Str, PrimitiveType::Str);

impl FromValue for u8 {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Bytes(b) if b.len() == 1 => Ok(b[0]),
            other => Err(CodecError::TypeMismatch {
                position: 0,
                expected: PrimitiveType::Byte,
                found: other.kind_name(),
            }),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::List(items) | Value::Tuple(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(CodecError::UnsupportedShape(format!(
                "expected list or tuple, found {}",
                other.kind_name()
            ))),
        }
    }
}

/// Named aggregate with fields in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub name: String,
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new(name: impl Into<String>) -> Self {
        Record { name: name.into(), fields: Vec::new() }
    }

    /// Append a field (builder style). Order of calls is the wire order.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Remove a field by name and convert it.
    pub fn take<T: FromValue>(&mut self, name: &str) -> Result<T, CodecError> {
        T::from_value(self.take_value(name)?)
    }

    pub fn take_value(&mut self, name: &str) -> Result<Value, CodecError> {
        let idx = self
            .fields
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| CodecError::UnsupportedShape(format!("record {}: missing field {}", self.name, name)))?;
        Ok(self.fields.remove(idx).1)
    }

    pub fn into_fields(self) -> Vec<(String, Value)> {
        self.fields
    }
}
