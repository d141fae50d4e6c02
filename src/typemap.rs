//! Type maps: recursive shape descriptors used to re-nest flat leaf sequences.
//!
//! A [`TypeMap`] is built once from a template value and records, for every
//! nesting level, the container kind, element count and child descriptors.
//! Its leaf count ([`TypeMap::size`]) always equals the number of codes in the
//! format string of a value with the same shape.

use crate::codec::CodecError;
use crate::format::{derive_code, FormatCode};
use crate::value::{PrimitiveType, Value};

/// Container kinds that have a reproducible element order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerKind {
    List,
    Tuple,
    /// Record type name and field names in declaration order.
    Record { name: String, fields: Vec<String> },
}

impl ContainerKind {
    pub fn name(&self) -> &str {
        match self {
            ContainerKind::List => "list",
            ContainerKind::Tuple => "tuple",
            ContainerKind::Record { name, .. } => name,
        }
    }
}

/// Container node: kind, children and cached leaf count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerMap {
    pub kind: ContainerKind,
    pub children: Vec<TypeMap>,
    size: usize,
}

impl ContainerMap {
    pub fn new(kind: ContainerKind, children: Vec<TypeMap>) -> Self {
        let size = children.iter().map(TypeMap::size).sum();
        ContainerMap { kind, children, size }
    }

    pub fn element_count(&self) -> usize {
        self.children.len()
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

/// Shape descriptor for a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeMap {
    Primitive(PrimitiveType),
    Container(ContainerMap),
}

impl TypeMap {
    /// Number of leaf slots reachable from this node.
    pub fn size(&self) -> usize {
        match self {
            TypeMap::Primitive(_) => 1,
            TypeMap::Container(c) => c.size(),
        }
    }

    /// Maximum nesting depth (a primitive is depth 0).
    pub fn depth(&self) -> usize {
        match self {
            TypeMap::Primitive(_) => 0,
            TypeMap::Container(c) => 1 + c.children.iter().map(TypeMap::depth).max().unwrap_or(0),
        }
    }

    /// Leaf types in depth-first order.
    pub fn leaf_types(&self) -> Vec<PrimitiveType> {
        let mut out = Vec::with_capacity(self.size());
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves(&self, out: &mut Vec<PrimitiveType>) {
        match self {
            TypeMap::Primitive(t) => out.push(*t),
            TypeMap::Container(c) => {
                for child in &c.children {
                    child.collect_leaves(out);
                }
            }
        }
    }

    /// Digit-free format string this shape expects (string lengths are payload-specific).
    pub fn expected_format(&self) -> String {
        self.leaf_types()
            .into_iter()
            .map(|t| FormatCode::for_primitive(t, 0).symbol())
            .collect()
    }
}

/// Build the type map of a value.
///
/// Record fields are visited in declaration order, the same order the encoder
/// uses. Sets are rejected: their element order is not reproducible.
pub fn build_typemap(value: &Value) -> Result<TypeMap, CodecError> {
    match value {
        Value::List(items) => container(ContainerKind::List, items.iter()),
        Value::Tuple(items) => container(ContainerKind::Tuple, items.iter()),
        Value::Record(r) => {
            let kind = ContainerKind::Record {
                name: r.name.clone(),
                fields: r.field_names().map(str::to_string).collect(),
            };
            container(kind, r.fields().iter().map(|(_, v)| v))
        }
        Value::Set(_) => Err(CodecError::UnsupportedShape(
            "set has no reproducible element order".to_string(),
        )),
        // Same leaf rules as the encoder.
        leaf => Ok(TypeMap::Primitive(derive_code(leaf)?.primitive())),
    }
}

fn container<'a>(kind: ContainerKind, items: impl Iterator<Item = &'a Value>) -> Result<TypeMap, CodecError> {
    let children = items.map(build_typemap).collect::<Result<Vec<_>, _>>()?;
    Ok(TypeMap::Container(ContainerMap::new(kind, children)))
}
