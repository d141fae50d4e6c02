//! Format values and type maps for display (dump text, tree view).

use crate::typemap::{ContainerKind, TypeMap};
use crate::value::Value;

/// Lowercase hex, no separators.
pub fn hex_string(b: &[u8]) -> String {
    b.iter().map(|x| format!("{:02x}", x)).collect()
}

/// Parse hex text (whitespace ignored) into bytes.
pub fn parse_hex(s: &str) -> Result<Vec<u8>, String> {
    let digits: Vec<u8> = s.bytes().filter(|c| !c.is_ascii_whitespace()).collect();
    if digits.len() % 2 != 0 {
        return Err(format!("odd number of hex digits ({})", digits.len()));
    }
    digits
        .chunks(2)
        .map(|pair| {
            let text = std::str::from_utf8(pair).map_err(|e| e.to_string())?;
            u8::from_str_radix(text, 16).map_err(|_| format!("invalid hex byte: {}", text))
        })
        .collect()
}

pub fn format_scalar(v: &Value) -> String {
    match v {
        Value::Bool(x) => format!("{}", x),
        Value::I16(x) => format!("{}", x),
        Value::Float(x) => format!("{}", x),
        Value::Double(x) => format!("{}", x),
        Value::Bytes(b) => format!("hex({})", hex_string(b)),
        Value::Str(s) => format!("{:?}", s),
        other => other.kind_name().to_string(),
    }
}

/// Render a value as an indented tree.
pub fn value_to_dump(v: &Value, indent: usize) -> String {
    let pad = "  ".repeat(indent);
    match v {
        Value::List(items) | Value::Tuple(items) | Value::Set(items) => {
            let (open, close) = match v {
                Value::List(_) => ("[", "]"),
                Value::Tuple(_) => ("(", ")"),
                _ => ("{", "}"),
            };
            if items.is_empty() {
                return format!("{}{}{}", pad, open, close);
            }
            let mut lines = vec![format!("{}{}", pad, open)];
            for item in items {
                lines.push(value_to_dump(item, indent + 1));
            }
            lines.push(format!("{}{}", pad, close));
            lines.join("\n")
        }
        Value::Record(r) => {
            let mut lines = vec![format!("{}{} {{", pad, r.name)];
            for (name, field) in r.fields() {
                if field.is_primitive() {
                    lines.push(format!("{}  {}: {}", pad, name, format_scalar(field)));
                } else {
                    lines.push(format!("{}  {}:", pad, name));
                    lines.push(value_to_dump(field, indent + 2));
                }
            }
            lines.push(format!("{}}}", pad));
            lines.join("\n")
        }
        scalar => format!("{}{}", pad, format_scalar(scalar)),
    }
}

/// Render a type map: one line per node with kind, element count and leaf size.
pub fn typemap_to_dump(map: &TypeMap, indent: usize) -> String {
    let pad = "  ".repeat(indent);
    match map {
        TypeMap::Primitive(t) => format!("{}{}", pad, t),
        TypeMap::Container(c) => {
            let label = match &c.kind {
                ContainerKind::Record { name, .. } => format!("record {}", name),
                other => other.name().to_string(),
            };
            let mut lines = vec![format!("{}{} [{} elements, size {}]", pad, label, c.element_count(), c.size())];
            let names: Vec<Option<&str>> = match &c.kind {
                ContainerKind::Record { fields, .. } => fields.iter().map(|f| Some(f.as_str())).collect(),
                _ => vec![None; c.children.len()],
            };
            for (child, name) in c.children.iter().zip(names) {
                match name {
                    Some(n) => {
                        let body = typemap_to_dump(child, indent + 1);
                        lines.push(format!("{}  {}: {}", pad, n, body.trim_start()));
                    }
                    None => lines.push(typemap_to_dump(child, indent + 1)),
                }
            }
            lines.join("\n")
        }
    }
}
