use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::NodeId;

/// Field values of a record, keyed by field name in declaration order.
pub type Record = IndexMap<String, Value>;

/// An in-memory value, read and written according to a [`crate::Shape`].
///
/// The variant carries the data; the shape says how to interpret it (for
/// example which integer width an `Int` has, or which enumeration an `Enum`
/// ordinal belongs to).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Char(char),
    /// Value of a signed integer shape.
    Int(i64),
    /// Value of an unsigned integer shape.
    UInt(u64),
    Float(f64),
    /// Byte string; `None` is the absent string.
    Str(Option<Vec<u8>>),
    /// Ordinal of an enumeration member.
    Enum(i64),
    Array(Vec<Value>),
    /// Dynamically sized sequence; `None` is the absent sequence.
    Seq(Option<Vec<Value>>),
    Record(Record),
    /// Member ordinals of a set.
    Set(BTreeSet<i64>),
    Ref(Option<NodeId>),
    /// Address-like value (callable, raw pointer); never dereferenced.
    Opaque(Option<u64>),
}

impl Value {
    pub fn str(s: &str) -> Self {
        Value::Str(Some(s.as_bytes().to_vec()))
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Str(Some(bytes.into()))
    }

    pub fn seq(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Seq(Some(items.into_iter().collect()))
    }

    pub fn record<'a>(fields: impl IntoIterator<Item = (&'a str, Value)>) -> Self {
        Value::Record(
            fields
                .into_iter()
                .map(|(name, value)| (name.to_owned(), value))
                .collect(),
        )
    }

    pub fn set(ordinals: impl IntoIterator<Item = i64>) -> Self {
        Value::Set(ordinals.into_iter().collect())
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Char(_) => "character",
            Value::Int(_) | Value::UInt(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Enum(_) => "enumeration",
            Value::Array(_) => "array",
            Value::Seq(_) => "sequence",
            Value::Record(_) => "record",
            Value::Set(_) => "set",
            Value::Ref(_) => "reference",
            Value::Opaque(_) => "opaque address",
        }
    }

    /// Integer ordinal of an ordinal-kind value.
    pub fn ordinal(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Char(c) => Some(i64::from(u32::from(*c))),
            Value::Int(i) | Value::Enum(i) => Some(*i),
            Value::UInt(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_record_mut(&mut self) -> Option<&mut Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Field of a record value.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.as_record().and_then(|record| record.get(name))
    }

    /// Target of a reference value.
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Value::Ref(node) => *node,
            _ => None,
        }
    }
}
