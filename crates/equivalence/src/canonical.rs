//! Canonical JSON trees
//!
//! Payloads are parsed into [`CanonicalValue`], a tagged union whose equality
//! is structural: object keys are unordered and numbers that denote the same
//! value compare equal regardless of literal form (`1`, `1.0`, `1e0`).

use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// Largest magnitude an integral float may have to be folded into an integer.
const MAX_FOLDED_FLOAT: f64 = 1.0e38;

/// A normalized JSON number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalNumber {
    /// Any number with an integral value, including integral floats
    Int(i128),
    /// A non-integral float, stored as its bit pattern
    Float(u64),
}

impl CanonicalNumber {
    fn from_f64(value: f64) -> Self {
        if value.fract() == 0.0 && value.abs() < MAX_FOLDED_FLOAT {
            // -0.0 folds to 0 here
            Self::Int(value as i128)
        } else {
            Self::Float(value.to_bits())
        }
    }

    fn to_json(self) -> Value {
        match self {
            Self::Int(i) => {
                if let Ok(i) = i64::try_from(i) {
                    Value::Number(Number::from(i))
                } else if let Ok(u) = u64::try_from(i) {
                    Value::Number(Number::from(u))
                } else {
                    Number::from_f64(i as f64).map_or(Value::Null, Value::Number)
                }
            }
            Self::Float(bits) => Number::from_f64(f64::from_bits(bits)).map_or(Value::Null, Value::Number),
        }
    }
}

impl From<&Number> for CanonicalNumber {
    fn from(n: &Number) -> Self {
        if let Some(i) = n.as_i64() {
            Self::Int(i128::from(i))
        } else if let Some(u) = n.as_u64() {
            Self::Int(i128::from(u))
        } else {
            Self::from_f64(n.as_f64().unwrap_or(f64::NAN))
        }
    }
}

/// A JSON document in canonical form
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CanonicalValue {
    Null,
    Bool(bool),
    Number(CanonicalNumber),
    String(String),
    /// Order-significant
    Array(Vec<CanonicalValue>),
    /// Keys are sorted, so map equality ignores source order
    Object(BTreeMap<String, CanonicalValue>),
}

impl CanonicalValue {
    /// Remove a top-level object field, returning it if present
    ///
    /// Non-object values are left untouched.
    pub fn strip_field(&mut self, field: &str) -> Option<CanonicalValue> {
        match self {
            Self::Object(map) => map.remove(field),
            _ => None,
        }
    }

    /// Value of a top-level object field
    pub fn field(&self, field: &str) -> Option<&CanonicalValue> {
        match self {
            Self::Object(map) => map.get(field),
            _ => None,
        }
    }

    /// Convert back into a `serde_json::Value` with normalized numbers
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => n.to_json(),
            Self::String(s) => Value::String(s.clone()),
            Self::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for CanonicalValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(CanonicalNumber::from(&n)),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

/// Parse a JSON payload into its canonical tree
pub fn parse(text: &str) -> serde_json::Result<CanonicalValue> {
    let value: Value = serde_json::from_str(text)?;
    let canonical = CanonicalValue::from(value);
    log::trace!("canonical tree: {:?}", canonical);
    Ok(canonical)
}

/// Render a payload as compact JSON with sorted keys and normalized numbers
pub fn normalize(text: &str) -> serde_json::Result<String> {
    let canonical = parse(text)?;
    serde_json::to_string(&canonical.to_json())
}
