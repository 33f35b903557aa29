//! The closed value model.
//!
//! [`Value`] is the only data shape that elements store and that the
//! persistence codec and delta log carry. Numeric variants are never coerced
//! into each other: `Int(1)` and `Float(1.0)` are different values.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::pointer::IndexPointer;

/// Deepest `Seq`/`Map` nesting a value may have and still be saved. A
/// scalar has depth 1.
pub const MAX_VALUE_DEPTH: usize = 32;

/// A table row: column name to cell value. Unset cells are absent.
pub type Row = BTreeMap<String, Value>;

/// A storable value.
///
/// `Value` has a total order so it can key the derived index maps. Floats
/// are compared with [`f64::total_cmp`], which also makes equality reflexive
/// for NaN. Values of different variants order by variant.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Seq(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Pointer(IndexPointer),
}

impl Value {
    /// Short name of the variant, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Text(_) => "text",
            Value::Seq(_) => "seq",
            Value::Map(_) => "map",
            Value::Pointer(_) => "pointer",
        }
    }

    pub fn as_seq(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_seq_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_pointer(&self) -> Option<&IndexPointer> {
        match self {
            Value::Pointer(ptr) => Some(ptr),
            _ => None,
        }
    }

    /// Returns `false` if any float anywhere in the tree is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        match self {
            Value::Float(f) => f.is_finite(),
            Value::Seq(items) => items.iter().all(Value::is_finite),
            Value::Map(map) => map.values().all(Value::is_finite),
            _ => true,
        }
    }

    /// Nesting depth: 1 for scalars and pointers, one more than the deepest
    /// item for sequences and maps.
    pub fn depth(&self) -> usize {
        let children = match self {
            Value::Seq(items) => items.iter().map(Value::depth).max(),
            Value::Map(map) => map.values().map(Value::depth).max(),
            _ => return 1,
        };
        1 + children.unwrap_or(0)
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Int(_) => 0,
            Value::Float(_) => 1,
            Value::Bool(_) => 2,
            Value::Text(_) => 3,
            Value::Seq(_) => 4,
            Value::Map(_) => 5,
            Value::Pointer(_) => 6,
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Seq(a), Value::Seq(b)) => a.cmp(b),
            (Value::Map(a), Value::Map(b)) => a.cmp(b),
            (Value::Pointer(a), Value::Pointer(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

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

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
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

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Seq(v)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

impl From<IndexPointer> for Value {
    fn from(v: IndexPointer) -> Self {
        Value::Pointer(v)
    }
}
