//! Column types and cell values shared by every Appraisal crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Literal text treated as a second null marker, distinct from a missing cell.
pub const SENTINEL_NULL: &str = "Null";

/// Cell texts that count as a true null when parsing delimited input.
///
/// `"Null"` is deliberately absent: it survives parsing as text so the
/// transformer can drop it as a sentinel.
const NULL_TOKENS: &[&str] = &["", "NA", "N/A", "n/a", "NaN", "nan", "NULL", "null", "None"];

/// Canonical column type of a record set.
///
/// `String` is the fallback for anything that is not uniformly boolean or
/// numeric, including columns that only ever held nulls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Boolean,
    Int64,
    Float64,
    #[default]
    String,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Boolean => "boolean",
            DataType::Int64 => "int64",
            DataType::Float64 => "float64",
            DataType::String => "string",
        }
    }

    /// Returns true if this type is numeric
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int64 | DataType::Float64)
    }

    /// Infer the column type from observed values. Nulls carry no type information.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Value>) -> DataType {
        let mut tracker = TypeTracker::default();
        for value in values {
            tracker.observe(value);
        }
        tracker.inferred_type()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "boolean" | "bool" => Ok(DataType::Boolean),
            "int64" | "integer" | "int" => Ok(DataType::Int64),
            "float64" | "float" | "double" => Ok(DataType::Float64),
            "string" | "text" | "utf8" => Ok(DataType::String),
            _ => Err(format!("Invalid data type: '{}'", s)),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct TypeTracker {
    has_integers: bool,
    has_floats: bool,
    has_booleans: bool,
    has_strings: bool,
}

impl TypeTracker {
    fn observe(&mut self, value: &Value) {
        match value {
            Value::Null => {}
            Value::Boolean(_) => self.has_booleans = true,
            Value::Int(_) => self.has_integers = true,
            Value::Float(_) => self.has_floats = true,
            Value::Text(_) => self.has_strings = true,
        }
    }

    fn inferred_type(&self) -> DataType {
        if self.has_strings {
            return DataType::String;
        }
        if self.has_booleans {
            // Booleans mixed with numbers have no common column type.
            if self.has_integers || self.has_floats {
                return DataType::String;
            }
            return DataType::Boolean;
        }
        if self.has_floats {
            return DataType::Float64;
        }
        if self.has_integers {
            return DataType::Int64;
        }
        DataType::String
    }
}

/// A single cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Parse one delimited-file cell: null tokens first, then typed literals.
    pub fn parse_cell(raw: &str) -> Value {
        let trimmed = raw.trim();
        if NULL_TOKENS.contains(&trimmed) {
            return Value::Null;
        }
        Value::parse_typed(trimmed)
    }

    /// Parse text into a boolean or number when it reads as one, else keep it as text.
    pub fn parse_typed(text: &str) -> Value {
        if text.eq_ignore_ascii_case("true") {
            return Value::Boolean(true);
        }
        if text.eq_ignore_ascii_case("false") {
            return Value::Boolean(false);
        }
        if let Ok(i) = text.parse::<i64>() {
            return Value::Int(i);
        }
        if let Ok(f) = text.parse::<f64>() {
            if f.is_finite() {
                return Value::Float(f);
            }
        }
        Value::Text(text.to_string())
    }

    pub fn from_json(value: &serde_json::Value) -> Value {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True only for the exact text `"Null"`.
    pub fn is_sentinel_null(&self) -> bool {
        matches!(self, Value::Text(s) if s == SENTINEL_NULL)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    /// Convert to the representation used by a column of `data_type`.
    ///
    /// Callers only pass types produced by [`DataType::infer`] over the same
    /// values, so the only widening needed is int to float and anything to text.
    pub(crate) fn coerce(self, data_type: DataType) -> Value {
        match (data_type, self) {
            (_, Value::Null) => Value::Null,
            (DataType::Float64, Value::Int(i)) => Value::Float(i as f64),
            (DataType::String, Value::Text(s)) => Value::Text(s),
            (DataType::String, other) => Value::Text(other.to_string()),
            (_, other) => other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell_keeps_sentinel_as_text() {
        assert_eq!(Value::parse_cell("Null"), Value::Text("Null".to_string()));
        assert!(Value::parse_cell("Null").is_sentinel_null());
        assert_eq!(Value::parse_cell(""), Value::Null);
        assert_eq!(Value::parse_cell("NULL"), Value::Null);
        assert_eq!(Value::parse_cell("NaN"), Value::Null);
    }

    #[test]
    fn test_parse_cell_literals() {
        assert_eq!(Value::parse_cell("TRUE"), Value::Boolean(true));
        assert_eq!(Value::parse_cell("42"), Value::Int(42));
        assert_eq!(Value::parse_cell("-122.1"), Value::Float(-122.1));
        assert_eq!(Value::parse_cell(" NEAR BAY "), Value::Text("NEAR BAY".to_string()));
    }

    #[test]
    fn test_infer_types() {
        assert_eq!(DataType::infer(&[Value::Int(1), Value::Null]), DataType::Int64);
        assert_eq!(DataType::infer(&[Value::Int(1), Value::Float(2.5)]), DataType::Float64);
        assert_eq!(DataType::infer(&[Value::Boolean(true)]), DataType::Boolean);
        assert_eq!(DataType::infer(&[Value::Boolean(true), Value::Int(1)]), DataType::String);
        assert_eq!(DataType::infer(&[Value::Null]), DataType::String);
        assert_eq!(DataType::infer(&[Value::from("x"), Value::Int(1)]), DataType::String);
    }

    #[test]
    fn test_coerce_widens() {
        assert_eq!(Value::Int(3).coerce(DataType::Float64), Value::Float(3.0));
        assert_eq!(Value::Boolean(true).coerce(DataType::String), Value::from("true"));
        assert_eq!(Value::Null.coerce(DataType::Int64), Value::Null);
    }

    #[test]
    fn test_json_conversion() {
        let v = serde_json::json!({"a": 1, "b": 1.5, "c": "x", "d": null, "e": true});
        let obj = v.as_object().unwrap();
        assert_eq!(Value::from_json(&obj["a"]), Value::Int(1));
        assert_eq!(Value::from_json(&obj["b"]), Value::Float(1.5));
        assert_eq!(Value::from_json(&obj["c"]), Value::from("x"));
        assert_eq!(Value::from_json(&obj["d"]), Value::Null);
        assert_eq!(Value::from_json(&obj["e"]), Value::Boolean(true));
    }
}
