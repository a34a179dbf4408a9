//! Literal values carried by request nodes.

use std::fmt;

use multicorn_types::Ty;
use serde::{Deserialize, Serialize};

/// Bounds of a slice operand, `start:stop:step`; every bound is optional.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SliceBounds {
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub stop: Option<i64>,
    #[serde(default)]
    pub step: Option<i64>,
}

impl fmt::Display for SliceBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = |b: Option<i64>| b.map(|n| n.to_string()).unwrap_or_default();
        write!(f, "{}:{}", bound(self.start), bound(self.stop))?;
        if let Some(step) = self.step {
            write!(f, ":{}", step)?;
        }
        Ok(())
    }
}

/// A literal value.
///
/// Deserializes from plain JSON scalars (`null`, booleans, numbers,
/// strings) and from `{"start": .., "stop": .., "step": ..}` objects for
/// slices.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Slice(SliceBounds),
}

impl Value {
    /// The type of this value.
    pub fn ty(&self) -> Ty {
        match self {
            Value::None => Ty::none(),
            Value::Bool(_) => Ty::bool(),
            Value::Int(_) => Ty::int(),
            Value::Float(_) => Ty::float(),
            Value::String(_) => Ty::string(),
            Value::Slice(_) => Ty::slice(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Slice(bounds) => write!(f, "{}", bounds),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Value {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Value {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Value {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::String(s)
    }
}

impl From<SliceBounds> for Value {
    fn from(bounds: SliceBounds) -> Value {
        Value::Slice(bounds)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Value {
        Value::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_types() {
        assert_eq!(Value::None.ty(), Ty::none());
        assert_eq!(Value::from(true).ty(), Ty::bool());
        assert_eq!(Value::from(3).ty(), Ty::int());
        assert_eq!(Value::from(2.5).ty(), Ty::float());
        assert_eq!(Value::from("x").ty(), Ty::string());
        assert_eq!(Value::from(SliceBounds::default()).ty(), Ty::slice());
    }

    #[test]
    fn display() {
        assert_eq!(Value::from(1.0).to_string(), "1.0");
        assert_eq!(Value::from("a\"b").to_string(), "\"a\\\"b\"");
        let bounds = SliceBounds {
            start: Some(1),
            stop: None,
            step: Some(2),
        };
        assert_eq!(Value::from(bounds).to_string(), "1::2");
        assert_eq!(SliceBounds::default().to_string(), ":");
    }

    #[test]
    fn deserialize_scalars() {
        let values: Vec<Value> =
            serde_json::from_str(r#"[null, true, 3, 2.5, "age", {"stop": 4}]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Value::None,
                Value::Bool(true),
                Value::Int(3),
                Value::Float(2.5),
                Value::String("age".into()),
                Value::Slice(SliceBounds {
                    start: None,
                    stop: Some(4),
                    step: None
                }),
            ]
        );
    }

    #[test]
    fn deserialize_rejects_unknown_object() {
        assert!(serde_json::from_str::<Value>(r#"{"begin": 1}"#).is_err());
    }
}
