//! Loosely-typed inbound update and the coercion rules applied to it.
//!
//! Producers are not validated: every accessor degrades to a default instead
//! of failing, so a malformed field never rejects the whole update.

use serde_json::{Map, Value};

use crate::error::EngineError;
use crate::record::Direction;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Payload(Map<String, Value>);

impl Payload {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Wraps any JSON value; non-objects are kept under a `body` key so they
    /// can still be recorded in raw history.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            other => {
                let mut map = Map::new();
                map.insert("body".to_string(), other);
                Self(map)
            }
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Trimmed, non-empty string symbol.
    pub fn symbol(&self) -> Result<&str, EngineError> {
        match self.0.get("symbol") {
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim()),
            _ => Err(EngineError::MissingSymbol),
        }
    }

    /// Key exists and is not `null`.
    pub fn is_present(&self, key: &str) -> bool {
        !matches!(self.0.get(key), None | Some(Value::Null))
    }

    pub fn is_true(&self, key: &str) -> bool {
        match self.0.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    /// Numeric value from a JSON number or a numeric string.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(coerce_f64)
    }

    /// Oscillator reading; anything unparseable reads as `0`.
    pub fn oscillator(&self, key: &str) -> f64 {
        self.number(key).unwrap_or(0.0)
    }

    pub fn direction(&self, key: &str) -> Direction {
        match self.0.get(key) {
            Some(Value::String(s)) => Direction::parse(s),
            _ => Direction::Flat,
        }
    }

    /// String form of a field: strings as-is, numbers/bools stringified.
    pub fn label(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Clone of every field except the listed ones.
    pub fn without(&self, keys: &[&str]) -> Map<String, Value> {
        self.0
            .iter()
            .filter(|(k, _)| !keys.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn coerce_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}
