//! Typed records: Rust structs with a declared field layout.
//!
//! A [`WireRecord`] declares its [`RecordSchema`] (field names, ordinals and
//! type tags in wire order) and converts to and from [`Record`] values.
//! [`RecordCodec`] derives the record's [`TypeMap`] once from the default
//! instance and reuses it for every call; it is never rebuilt from a live
//! instance.

use crate::codec::{self, CodecError, Encoded};
use crate::format::FormatString;
use crate::typemap::{build_typemap, TypeMap};
use crate::value::{PrimitiveType, Record, Value};
use std::marker::PhantomData;

/// Declared type of a record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldTag {
    Primitive(PrimitiveType),
    List,
    Tuple,
    /// Nested record, by type name.
    Record(&'static str),
}

impl FieldTag {
    fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (FieldTag::Primitive(t), v) => v.primitive_type() == Some(*t),
            (FieldTag::List, Value::List(_)) | (FieldTag::Tuple, Value::Tuple(_)) => true,
            (FieldTag::Record(name), Value::Record(r)) => r.name == *name,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub ordinal: usize,
    pub tag: FieldTag,
}

/// Field layout of a record type, in declaration (= wire) order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    pub name: &'static str,
    pub fields: Vec<FieldDescriptor>,
}

impl RecordSchema {
    pub fn new(name: &'static str) -> Self {
        RecordSchema { name, fields: Vec::new() }
    }

    /// Append a field; its ordinal is its position.
    pub fn field(mut self, name: &'static str, tag: FieldTag) -> Self {
        let ordinal = self.fields.len();
        self.fields.push(FieldDescriptor { name, ordinal, tag });
        self
    }

    /// Check that a record value has exactly this layout.
    pub fn check(&self, record: &Record) -> Result<(), CodecError> {
        if record.name != self.name {
            return Err(CodecError::UnsupportedShape(format!(
                "expected record {}, found {}",
                self.name, record.name
            )));
        }
        if record.len() != self.fields.len() {
            return Err(CodecError::UnsupportedShape(format!(
                "record {}: schema has {} fields, value has {}",
                self.name,
                self.fields.len(),
                record.len()
            )));
        }
        for (desc, (name, value)) in self.fields.iter().zip(record.fields()) {
            if desc.name != name.as_str() {
                return Err(CodecError::UnsupportedShape(format!(
                    "record {}: field {} is {}, schema declares {}",
                    self.name, desc.ordinal, name, desc.name
                )));
            }
            if !desc.tag.matches(value) {
                return Err(CodecError::UnsupportedShape(format!(
                    "record {}: field {} holds {}, schema declares {:?}",
                    self.name,
                    desc.name,
                    value.kind_name(),
                    desc.tag
                )));
            }
        }
        Ok(())
    }
}

/// A Rust struct with a fixed wire layout. `Default` is the template instance.
pub trait WireRecord: Default + Sized {
    fn schema() -> RecordSchema;

    /// Field values in schema order.
    fn to_record(&self) -> Record;

    fn from_record(record: Record) -> Result<Self, CodecError>;
}

/// Rebuild a nested record field (see [`Record::take`] for primitive fields).
pub fn take_record<T: WireRecord>(record: &mut Record, name: &str) -> Result<T, CodecError> {
    match record.take_value(name)? {
        Value::Record(r) => T::from_record(r),
        other => Err(CodecError::UnsupportedShape(format!(
            "field {}: expected record, found {}",
            name,
            other.kind_name()
        ))),
    }
}

/// Encoder/decoder for one record type with a cached type map.
#[derive(Debug, Clone)]
pub struct RecordCodec<T: WireRecord> {
    schema: RecordSchema,
    type_map: TypeMap,
    _marker: PhantomData<fn() -> T>,
}

impl<T: WireRecord> RecordCodec<T> {
    /// Build the type map from `T::default()`.
    pub fn new() -> Result<Self, CodecError> {
        let schema = T::schema();
        let template = T::default().to_record();
        schema.check(&template)?;
        let type_map = build_typemap(&Value::Record(template))?;
        log::debug!(
            "record {}: {} fields, {} leaves, format {}",
            schema.name,
            schema.fields.len(),
            type_map.size(),
            type_map.expected_format()
        );
        Ok(RecordCodec { schema, type_map, _marker: PhantomData })
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    pub fn type_map(&self) -> &TypeMap {
        &self.type_map
    }

    pub fn encode(&self, record: &T) -> Result<Encoded, CodecError> {
        let value = record.to_record();
        self.schema.check(&value)?;
        codec::encode(&Value::Record(value))
    }

    pub fn decode(&self, bytes: &[u8], format: &FormatString) -> Result<T, CodecError> {
        match codec::decode(bytes, format, &self.type_map)? {
            Value::Record(r) => T::from_record(r),
            other => Err(CodecError::UnsupportedShape(format!(
                "expected record {}, decoded {}",
                self.schema.name,
                other.kind_name()
            ))),
        }
    }

    /// Decode over an existing instance. `target` is left untouched on error.
    pub fn decode_into(&self, target: &mut T, bytes: &[u8], format: &FormatString) -> Result<(), CodecError> {
        *target = self.decode(bytes, format)?;
        Ok(())
    }
}
