//! Bridge between plain Rust types and the shape/value model.
//!
//! Implementing [`Marshal`] gives a type a declared [`Shape`] plus
//! conversions to and from [`Value`], which is all [`to_text`] and
//! [`from_text`] need.

use std::collections::BTreeSet;

use crate::error::{MarshalError, Result};
use crate::shape::{FloatWidth, IntWidth, RecordShape, Registry};
use crate::{Codec, Heap, Shape, Value};

pub trait Marshal: Sized {
    fn shape() -> Shape;
    fn to_value(&self) -> Value;
    fn from_value(value: &Value) -> Result<Self>;
}

/// Types whose values map onto integer ordinals, usable as set members.
pub trait Ordinal: Sized {
    fn ordinal(&self) -> i64;
    fn from_ordinal(ordinal: i64) -> Option<Self>;
}

/// Encodes a plain value.
///
/// ```
/// let text = graphjson::to_text(&(String::from("tuple test"), 56i32)).unwrap();
/// assert_eq!(text, r#"{"Field0": "tuple test", "Field1": 56}"#);
/// ```
pub fn to_text<T: Marshal>(value: &T) -> Result<String> {
    let registry = Registry::new();
    Codec::new(&registry).store(&T::shape(), &value.to_value(), &Heap::new())
}

/// Decodes a plain value.
///
/// ```
/// let grid: Vec<Option<Vec<u8>>> = graphjson::from_text("[[1, 2], null, []]").unwrap();
/// assert_eq!(grid, vec![Some(vec![1, 2]), None, Some(vec![])]);
/// ```
pub fn from_text<T: Marshal>(text: &str) -> Result<T> {
    let registry = Registry::new();
    let value = Codec::new(&registry).load(text, &T::shape(), &mut Heap::new())?;
    T::from_value(&value)
}

fn mismatch<T>(expected: &str, value: &Value) -> Result<T> {
    Err(MarshalError::mismatch(expected, value.kind_name()))
}

impl Marshal for bool {
    fn shape() -> Shape {
        Shape::Bool
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => mismatch("boolean", other),
        }
    }
}

impl Marshal for char {
    fn shape() -> Shape {
        Shape::Char
    }

    fn to_value(&self) -> Value {
        Value::Char(*self)
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Char(c) => Ok(*c),
            other => mismatch("character", other),
        }
    }
}

macro_rules! marshal_int {
    ($($ty:ty => $width:ident, $variant:ident;)*) => {
        $(
            impl Marshal for $ty {
                fn shape() -> Shape {
                    Shape::Int(IntWidth::$width)
                }

                fn to_value(&self) -> Value {
                    Value::$variant((*self).into())
                }

                fn from_value(value: &Value) -> Result<Self> {
                    let converted = match value {
                        Value::Int(i) => <$ty>::try_from(*i).ok(),
                        Value::UInt(u) => <$ty>::try_from(*u).ok(),
                        other => return mismatch(IntWidth::$width.name(), other),
                    };
                    converted.ok_or_else(|| {
                        MarshalError::mismatch(IntWidth::$width.name(), "integer out of range")
                    })
                }
            }
        )*
    };
}

marshal_int! {
    i8 => I8, Int;
    i16 => I16, Int;
    i32 => I32, Int;
    i64 => I64, Int;
    u8 => U8, UInt;
    u16 => U16, UInt;
    u32 => U32, UInt;
    u64 => U64, UInt;
}

impl Marshal for f64 {
    fn shape() -> Shape {
        Shape::Float(FloatWidth::F64)
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Float(f) => Ok(*f),
            other => mismatch("float", other),
        }
    }
}

impl Marshal for f32 {
    fn shape() -> Shape {
        Shape::Float(FloatWidth::F32)
    }

    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Float(f) => Ok(*f as f32),
            other => mismatch("float", other),
        }
    }
}

/// An absent string reads back as empty.
impl Marshal for String {
    fn shape() -> Shape {
        Shape::String
    }

    fn to_value(&self) -> Value {
        Value::str(self)
    }

    fn from_value(value: &Value) -> Result<Self> {
        Ok(Option::<String>::from_value(value)?.unwrap_or_default())
    }
}

impl Marshal for Option<String> {
    fn shape() -> Shape {
        Shape::String
    }

    fn to_value(&self) -> Value {
        Value::Str(self.as_ref().map(|s| s.as_bytes().to_vec()))
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Str(None) => Ok(None),
            Value::Str(Some(bytes)) => String::from_utf8(bytes.clone())
                .map(Some)
                .map_err(|_| MarshalError::mismatch("UTF-8 string", "invalid UTF-8 bytes")),
            other => mismatch("string", other),
        }
    }
}

/// An absent sequence reads back as empty.
impl<T: Marshal> Marshal for Vec<T> {
    fn shape() -> Shape {
        Shape::seq(T::shape())
    }

    fn to_value(&self) -> Value {
        Value::seq(self.iter().map(Marshal::to_value))
    }

    fn from_value(value: &Value) -> Result<Self> {
        Ok(Option::<Vec<T>>::from_value(value)?.unwrap_or_default())
    }
}

impl<T: Marshal> Marshal for Option<Vec<T>> {
    fn shape() -> Shape {
        Shape::seq(T::shape())
    }

    fn to_value(&self) -> Value {
        Value::Seq(
            self.as_ref()
                .map(|items| items.iter().map(Marshal::to_value).collect()),
        )
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Seq(None) => Ok(None),
            Value::Seq(Some(items)) => items.iter().map(T::from_value).collect::<Result<_>>().map(Some),
            other => mismatch("sequence", other),
        }
    }
}

impl<T: Marshal, const N: usize> Marshal for [T; N] {
    fn shape() -> Shape {
        Shape::array(N, T::shape())
    }

    fn to_value(&self) -> Value {
        Value::Array(self.iter().map(Marshal::to_value).collect())
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Array(items) => {
                let items = items.iter().map(T::from_value).collect::<Result<Vec<T>>>()?;
                let len = items.len();
                items.try_into().map_err(|_| {
                    MarshalError::mismatch(format!("array of {N} elements"), format!("array of {len} elements"))
                })
            }
            other => mismatch("array", other),
        }
    }
}

impl<T: Marshal + Ordinal + Ord> Marshal for BTreeSet<T> {
    fn shape() -> Shape {
        Shape::set(T::shape())
    }

    fn to_value(&self) -> Value {
        Value::set(self.iter().map(Ordinal::ordinal))
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Set(ordinals) => ordinals
                .iter()
                .map(|&ordinal| {
                    T::from_ordinal(ordinal)
                        .ok_or_else(|| MarshalError::mismatch("set member", format!("ordinal {ordinal}")))
                })
                .collect(),
            other => mismatch("set", other),
        }
    }
}

macro_rules! ordinal_int {
    ($($ty:ty),*) => {
        $(
            impl Ordinal for $ty {
                fn ordinal(&self) -> i64 {
                    i64::from(*self)
                }

                fn from_ordinal(ordinal: i64) -> Option<Self> {
                    <$ty>::try_from(ordinal).ok()
                }
            }
        )*
    };
}

ordinal_int!(i8, i16, i32, u8, u16, u32);

impl Ordinal for bool {
    fn ordinal(&self) -> i64 {
        i64::from(*self)
    }

    fn from_ordinal(ordinal: i64) -> Option<Self> {
        match ordinal {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }
    }
}

impl Ordinal for char {
    fn ordinal(&self) -> i64 {
        i64::from(u32::from(*self))
    }

    fn from_ordinal(ordinal: i64) -> Option<Self> {
        u32::try_from(ordinal).ok().and_then(char::from_u32)
    }
}

macro_rules! marshal_tuple {
    ($($name:ident : $index:tt),+) => {
        impl<$($name: Marshal),+> Marshal for ($($name,)+) {
            fn shape() -> Shape {
                Shape::Record(RecordShape::tuple([$($name::shape()),+]))
            }

            fn to_value(&self) -> Value {
                Value::Record(
                    [$((concat!("Field", stringify!($index)).to_owned(), self.$index.to_value())),+]
                        .into_iter()
                        .collect(),
                )
            }

            fn from_value(value: &Value) -> Result<Self> {
                let Value::Record(fields) = value else {
                    return mismatch("tuple", value);
                };
                Ok(($(
                    $name::from_value(
                        fields
                            .get(concat!("Field", stringify!($index)))
                            .ok_or_else(|| MarshalError::MissingField {
                                record: "tuple".to_owned(),
                                field: concat!("Field", stringify!($index)).to_owned(),
                            })?,
                    )?,
                )+))
            }
        }
    };
}

marshal_tuple!(A: 0, B: 1);
marshal_tuple!(A: 0, B: 1, C: 2);
