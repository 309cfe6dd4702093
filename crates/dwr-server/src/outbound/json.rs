//! Default converter for JSON-shaped data
//!
//! Primitives convert to inline literals. Composite `serde_json::Value`s
//! (arrays and objects) get one temporary each, declared as a JSON literal,
//! which is valid script once the line and paragraph separators and `<` are
//! escaped.

use dwr_common::{DwrError, Result};
use serde_json::Value;

use super::context::{OutboundContext, OutboundVariable};
use super::data::ScriptData;
use super::Converter;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonConverter;

impl JsonConverter {
    pub fn new() -> Self {
        JsonConverter
    }

    fn convert_composite(
        &self,
        data: &ScriptData,
        value: &Value,
        ctx: &mut OutboundContext,
    ) -> Result<OutboundVariable> {
        if let Some(existing) = ctx.get(data) {
            return Ok(existing.clone());
        }

        let name = ctx.next_variable_name();
        let literal = script_safe(serde_json::to_string(value)?);
        let variable = OutboundVariable::new(format!("var {}={};", name, literal), name);
        ctx.put(data, variable.clone());
        Ok(variable)
    }
}

impl Converter for JsonConverter {
    fn convert(&self, data: &ScriptData, ctx: &mut OutboundContext) -> Result<OutboundVariable> {
        let reference = match data {
            ScriptData::Null => "null".to_string(),
            ScriptData::Bool(b) => b.to_string(),
            ScriptData::Int(i) => i.to_string(),
            ScriptData::Float(n) => number_literal(*n),
            ScriptData::Char(c) => escape_string(c.encode_utf8(&mut [0; 4])),
            ScriptData::Str(s) => escape_string(s),
            ScriptData::Object(_) => {
                return match data.downcast_ref::<Value>() {
                    Some(value @ (Value::Array(_) | Value::Object(_))) => {
                        self.convert_composite(data, value, ctx)
                    }
                    Some(primitive) => self.convert(&ScriptData::from(primitive.clone()), ctx),
                    None => Err(DwrError::marshal(
                        "No converter for object: only serde_json values are supported",
                    )),
                };
            }
        };

        Ok(OutboundVariable::inline(reference))
    }
}

fn number_literal(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        n.to_string()
    }
}

/// Quote a string as a double-quoted script literal.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '<' => out.push_str("\\u003C"),
            '>' => out.push_str("\\u003E"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// JSON text is script once these characters are escaped. They can only
/// occur inside JSON strings, so a plain replace is safe.
fn script_safe(json: String) -> String {
    if !json.contains(|c| matches!(c, '<' | '>' | '\u{2028}' | '\u{2029}')) {
        return json;
    }
    json.replace('<', "\\u003C")
        .replace('>', "\\u003E")
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}
