//! Batch parser shared by both transports
//!
//! Both transports deliver the same `key=value` pairs; they only differ in
//! how the pairs are framed. [`parse_batch`] turns the decoded pairs into a
//! [`Calls`] batch.

use std::collections::HashMap;

use dwr_common::{Call, Calls, DwrError, Result};
use serde_json::{Map, Number, Value};

/// How deep `reference:` chains and nested arrays/objects may go.
const MAX_DEPTH: usize = 32;

const CALL_COUNT: &str = "callCount";

/// Most values one batch may decode, counting every copy of a shared
/// `reference:` target.
const MAX_NODES: usize = 10_000;

/// Parse a batch from decoded `key=value` pairs. Later duplicates win.
pub fn parse_batch<I>(pairs: I) -> Result<Calls>
where
    I: IntoIterator<Item = (String, String)>,
{
    let pairs: HashMap<String, String> = pairs.into_iter().collect();
    let mut batch = Batch {
        pairs: &pairs,
        resolved: HashMap::new(),
        nodes: 0,
    };
    batch.calls()
}

struct Batch<'a> {
    pairs: &'a HashMap<String, String>,
    /// Decoded `reference:` targets with their node counts
    resolved: HashMap<&'a str, (Value, usize)>,
    nodes: usize,
}

impl<'a> Batch<'a> {
    fn calls(&mut self) -> Result<Calls> {
        let count = self.required(CALL_COUNT)?;
        let count: usize = count
            .trim()
            .parse()
            .map_err(|_| DwrError::marshal(format!("Bad callCount: {}", count)))?;

        let mut calls = Calls::new();
        for index in 0..count {
            calls.push(self.call(index)?);
        }
        Ok(calls)
    }

    fn call(&mut self, index: usize) -> Result<Call> {
        let prefix = format!("c{}-", index);
        let script_name = self.required(&format!("{}scriptName", prefix))?;
        let method_name = self.required(&format!("{}methodName", prefix))?;
        let id = self
            .pairs
            .get(&format!("{}id", prefix))
            .cloned()
            .unwrap_or_else(|| index.to_string());

        let mut params = Vec::new();
        let pairs = self.pairs;
        while let Some(raw) = pairs.get(&format!("{}param{}", prefix, params.len())) {
            let (value, _) = self.decode(raw, 0)?;
            params.push(value);
        }

        Ok(Call::new(id, script_name, method_name, params))
    }

    fn required(&self, key: &str) -> Result<&'a str> {
        self.pairs
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| DwrError::marshal(format!("Missing parameter: {}", key)))
    }

    /// Adds `count` freshly built values to the batch total.
    fn charge(&mut self, count: usize) -> Result<()> {
        self.nodes = self.nodes.saturating_add(count);
        if self.nodes > MAX_NODES {
            return Err(DwrError::marshal(format!(
                "Batch too large: more than {} values",
                MAX_NODES
            )));
        }
        Ok(())
    }

    /// Decode one typed value, e.g. `string:Joe` or `reference:c0-e1`.
    ///
    /// Returns the value and the number of values it contains.
    fn decode(&mut self, raw: &'a str, depth: usize) -> Result<(Value, usize)> {
        if depth > MAX_DEPTH {
            return Err(DwrError::marshal("Value nesting too deep"));
        }

        let (kind, value) = raw
            .split_once(':')
            .ok_or_else(|| DwrError::marshal(format!("Missing type prefix: {}", raw)))?;

        let scalar = match kind {
            "string" => Value::String(value.to_string()),
            "number" => parse_number(value)?,
            "boolean" => Value::Bool(value.trim() == "true"),
            "null" | "undefined" => Value::Null,
            "reference" => return self.resolve(value, depth),
            "Array" => {
                let inner = enclosed(value, '[', ']')?;
                let mut items = Vec::new();
                let mut size = 1;
                for member in split_members(inner) {
                    let (item, count) = self.decode(member, depth + 1)?;
                    items.push(item);
                    size += count;
                }
                self.charge(1)?;
                return Ok((Value::Array(items), size));
            }
            "Object" => {
                let inner = enclosed(value, '{', '}')?;
                let mut object = Map::new();
                let mut size = 1;
                for member in split_members(inner) {
                    let (name, typed) = member.split_once(':').ok_or_else(|| {
                        DwrError::marshal(format!("Bad object member: {}", member))
                    })?;
                    let (item, count) = self.decode(typed, depth + 1)?;
                    object.insert(name.trim().to_string(), item);
                    size += count;
                }
                self.charge(1)?;
                return Ok((Value::Object(object), size));
            }
            other => return Err(DwrError::marshal(format!("Unknown type: {}", other))),
        };

        self.charge(1)?;
        Ok((scalar, 1))
    }

    /// Decodes the value stored under `key` once; later references clone it.
    fn resolve(&mut self, key: &'a str, depth: usize) -> Result<(Value, usize)> {
        if let Some(&(_, size)) = self.resolved.get(key) {
            self.charge(size)?;
            if let Some((value, _)) = self.resolved.get(key) {
                return Ok((value.clone(), size));
            }
        }

        let pairs = self.pairs;
        let target = pairs
            .get(key)
            .ok_or_else(|| DwrError::marshal(format!("Missing reference: {}", key)))?;
        let decoded = self.decode(target, depth + 1)?;
        self.resolved.insert(key, decoded.clone());
        Ok(decoded)
    }
}

fn parse_number(value: &str) -> Result<Value> {
    let value = value.trim();
    if let Ok(int) = value.parse::<i64>() {
        return Ok(Value::Number(int.into()));
    }
    value
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| DwrError::marshal(format!("Not a number: {}", value)))
}

fn enclosed(value: &str, open: char, close: char) -> Result<&str> {
    value
        .trim()
        .strip_prefix(open)
        .and_then(|rest| rest.strip_suffix(close))
        .ok_or_else(|| DwrError::marshal(format!("Expected {}...{}: {}", open, close, value)))
}

/// Split on top-level commas, ignoring commas inside nested brackets.
fn split_members(inner: &str) -> Vec<&str> {
    let mut members = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in inner.char_indices() {
        match c {
            '[' | '{' => depth += 1,
            ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                members.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    members.push(&inner[start..]);

    members
        .into_iter()
        .map(str::trim)
        .filter(|member| !member.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(lines: &[(&str, &str)]) -> Vec<(String, String)> {
        lines
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn single_call(extra: &[(&str, &str)]) -> Result<Calls> {
        let mut lines = vec![
            ("callCount", "1"),
            ("c0-scriptName", "Demo"),
            ("c0-methodName", "sayHello"),
            ("c0-id", "8467_1133888541111"),
        ];
        lines.extend_from_slice(extra);
        parse_batch(pairs(&lines))
    }

    #[test]
    fn test_simple_call() {
        let calls = single_call(&[("c0-param0", "string:Joe")]).unwrap();
        assert_eq!(
            calls.calls,
            vec![Call::new("8467_1133888541111", "Demo", "sayHello", vec![json!("Joe")])]
        );
    }

    #[test]
    fn test_scalar_types() {
        let calls = single_call(&[
            ("c0-param0", "number:42"),
            ("c0-param1", "number:1.5"),
            ("c0-param2", "boolean:true"),
            ("c0-param3", "null:null"),
            ("c0-param4", "undefined:undefined"),
            ("c0-param5", "string:a:b"),
        ])
        .unwrap();
        assert_eq!(
            calls.calls[0].params,
            vec![json!(42), json!(1.5), json!(true), json!(null), json!(null), json!("a:b")]
        );
    }

    #[test]
    fn test_references_and_composites() {
        let calls = single_call(&[
            ("c0-e1", "string:Joe"),
            ("c0-e2", "number:7"),
            ("c0-e3", "Array:[reference:c0-e2,number:8]"),
            ("c0-param0", "Object:{name:reference:c0-e1, scores:reference:c0-e3}"),
        ])
        .unwrap();
        assert_eq!(
            calls.calls[0].params,
            vec![json!({"name": "Joe", "scores": [7, 8]})]
        );
    }

    #[test]
    fn test_empty_array() {
        let calls = single_call(&[("c0-param0", "Array:[]")]).unwrap();
        assert_eq!(calls.calls[0].params, vec![json!([])]);
    }

    #[test]
    fn test_missing_id_defaults_to_index() {
        let calls = parse_batch(pairs(&[
            ("callCount", "2"),
            ("c0-scriptName", "A"),
            ("c0-methodName", "x"),
            ("c1-scriptName", "B"),
            ("c1-methodName", "y"),
        ]))
        .unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls.calls[0].id, "0");
        assert_eq!(calls.calls[1].id, "1");
        assert!(calls.calls[1].params.is_empty());
    }

    #[test]
    fn test_malformed_batches() {
        assert!(matches!(parse_batch(Vec::new()), Err(DwrError::Marshal(_))));
        assert!(matches!(
            parse_batch(pairs(&[("callCount", "one")])),
            Err(DwrError::Marshal(_))
        ));
        assert!(matches!(
            parse_batch(pairs(&[("callCount", "1"), ("c0-scriptName", "A")])),
            Err(DwrError::Marshal(_))
        ));
        assert!(single_call(&[("c0-param0", "Joe")]).is_err());
        assert!(single_call(&[("c0-param0", "date:today")]).is_err());
        assert!(single_call(&[("c0-param0", "number:abc")]).is_err());
        assert!(single_call(&[("c0-param0", "reference:c0-e9")]).is_err());
        assert!(single_call(&[("c0-param0", "Array:1,2")]).is_err());
    }

    #[test]
    fn test_reference_cycle_hits_depth_limit() {
        let result = single_call(&[
            ("c0-e1", "reference:c0-e2"),
            ("c0-e2", "reference:c0-e1"),
            ("c0-param0", "reference:c0-e1"),
        ]);
        match result {
            Err(DwrError::Marshal(msg)) => assert!(msg.contains("too deep")),
            other => panic!("expected marshal error, got {:?}", other),
        }
    }

    #[test]
    fn test_shared_reference_decoded_once() {
        let calls = single_call(&[
            ("c0-e1", "Object:{name:string:Ann}"),
            ("c0-param0", "Array:[reference:c0-e1,reference:c0-e1]"),
            ("c0-param1", "reference:c0-e1"),
        ])
        .unwrap();
        assert_eq!(
            calls.calls[0].params,
            vec![json!([{"name": "Ann"}, {"name": "Ann"}]), json!({"name": "Ann"})]
        );
    }

    #[test]
    fn test_fan_out_is_rejected() {
        // Each level holds 60 references to the next one: 60^4 values in all
        let width = 60;
        let mut lines: Vec<(String, String)> = vec![
            ("callCount".into(), "1".into()),
            ("c0-scriptName".into(), "Demo".into()),
            ("c0-methodName".into(), "sayHello".into()),
            ("c0-e4".into(), "number:1".into()),
            ("c0-param0".into(), "reference:c0-e0".into()),
        ];
        for level in 0..4 {
            let members = vec![format!("reference:c0-e{}", level + 1); width].join(",");
            lines.push((format!("c0-e{}", level), format!("Array:[{}]", members)));
        }

        match parse_batch(lines) {
            Err(DwrError::Marshal(msg)) => assert!(msg.contains("too large")),
            other => panic!("expected marshal error, got {:?}", other.map(|c| c.len())),
        }
    }

    #[test]
    fn test_node_budget_spans_the_batch() {
        let members = vec!["number:1"; 6_000].join(",");
        let array = format!("Array:[{}]", members);
        let result = single_call(&[("c0-param0", array.as_str()), ("c0-param1", array.as_str())]);
        assert!(matches!(result, Err(DwrError::Marshal(_))));

        let result = single_call(&[("c0-param0", array.as_str())]);
        assert_eq!(result.unwrap().calls[0].params[0].as_array().unwrap().len(), 6_000);
    }

    #[test]
    fn test_split_members_respects_nesting() {
        assert_eq!(
            split_members("a:Array:[x,y], b:string:z"),
            vec!["a:Array:[x,y]", "b:string:z"]
        );
    }
}
