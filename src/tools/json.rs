//! JSON conversions.

use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Serializer, Value};

use crate::{error::Result, tools::text::normalize_json_literals};

/// Parse JSON text. Text written with single quotes and `True`/`False`/`None`
/// literals is normalized and retried once.
pub fn parse_json(text: &str) -> Result<Value> {
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(first) => {
            let normalized = normalize_json_literals(text);
            if normalized == text {
                return Err(first.into());
            }
            Ok(serde_json::from_str(&normalized)?)
        }
    }
}

/// Compact JSON; non-ASCII characters are written as-is.
pub fn to_json_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Pretty JSON indented by `indent` spaces per level.
pub fn to_string_indented<T: Serialize + ?Sized>(value: &T, indent: usize) -> Result<String> {
    let pad = " ".repeat(indent);
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(pad.as_bytes()));
    value.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
