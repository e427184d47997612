//! Tree values
//!
//! Values stored under a tree path form a closed set of variants.
//! Sparse arrays are homogeneous in practice (metric steps are numbers),
//! but the type is only enforced when materializing numeric buffers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A value stored at a tree path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Missing slot in a dense materialization
    None,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Floating point
    Float(f64),
    /// UTF-8 string
    Str(String),
    /// Opaque blob
    Bytes(Vec<u8>),
    /// Dense array
    List(Vec<Value>),
    /// Nested mapping
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Short type name used in error messages
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Numeric view of the value, if it is a number
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Self::List(items) => write!(f, "[{} items]", items.len()),
            Self::Map(map) => write!(f, "{{{} keys}}", map.len()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

/// Declared element type of a numeric sparse array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementType {
    /// 64-bit signed integers
    Int,
    /// 64-bit floats (integers are widened)
    Float,
}

impl ElementType {
    /// Type name used in error messages
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
        }
    }
}

/// Dense numeric buffer produced from a sparse array
#[derive(Debug, Clone, PartialEq)]
pub enum NumericArray {
    /// Integer buffer
    Int(Vec<i64>),
    /// Float buffer
    Float(Vec<f64>),
}

impl NumericArray {
    /// Number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Int(v) => v.len(),
            Self::Float(v) => v.len(),
        }
    }

    /// Whether the buffer has no elements
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element type of the buffer
    #[must_use]
    pub const fn element_type(&self) -> ElementType {
        match self {
            Self::Int(_) => ElementType::Int,
            Self::Float(_) => ElementType::Float,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_json_round_trip() {
        let mut map = BTreeMap::new();
        map.insert("lr".to_string(), Value::Float(0.01));
        map.insert("tags".to_string(), Value::List(vec![Value::from("a"), Value::None]));
        let value = Value::Map(map);

        let bytes = serde_json::to_vec(&value).unwrap();
        let decoded: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_as_f64() {
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::Float(0.5).as_f64(), Some(0.5));
        assert_eq!(Value::from("x").as_f64(), None);
    }

    #[test]
    fn test_numeric_array_len() {
        let ints = NumericArray::Int(vec![1, 2, 3]);
        assert_eq!(ints.len(), 3);
        assert_eq!(ints.element_type(), ElementType::Int);
        assert!(NumericArray::Float(vec![]).is_empty());
    }
}
