//! Parse format-string text into format codes using PEST.

use crate::format::FormatCode;
use pest::Parser;
use pest_derive::Parser as PestParser;

#[derive(PestParser)]
#[grammar = "grammar.pest"]
struct FormatParser;

/// Parse format text (e.g. `"!2shf"`) into codes.
pub fn parse_format(source: &str) -> Result<Vec<FormatCode>, String> {
    if let Some(marker) = source.trim_start().chars().next() {
        if matches!(marker, '<' | '=' | '@') {
            return Err(format!(
                "byte order '{}' not supported: wire format is network order ('!')",
                marker
            ));
        }
    }
    let pairs = FormatParser::parse(Rule::format, source).map_err(|e| format!("Parse error: {}", e))?;
    let pair = pairs.into_iter().next().ok_or("Empty parse")?;
    let mut codes = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::string_code => codes.push(build_string_code(inner)?),
            Rule::scalar_code => codes.push(build_scalar_code(inner.as_str())?),
            _ => {}
        }
    }
    Ok(codes)
}

fn build_string_code(pair: pest::iterators::Pair<Rule>) -> Result<FormatCode, String> {
    // A bare `s` is a one-byte string, as with C-style struct packers.
    let mut len = 1usize;
    for inner in pair.into_inner() {
        if inner.as_rule() == Rule::count {
            len = inner
                .as_str()
                .parse()
                .map_err(|e| format!("string length {}: {}", inner.as_str(), e))?;
        }
    }
    Ok(FormatCode::Str(len))
}

fn build_scalar_code(s: &str) -> Result<FormatCode, String> {
    match s {
        "?" => Ok(FormatCode::Bool),
        "h" => Ok(FormatCode::I16),
        "f" => Ok(FormatCode::Float),
        "d" => Ok(FormatCode::Double),
        "c" => Ok(FormatCode::Char),
        other => Err(format!("unknown format code: {}", other)),
    }
}
