//! Runtime type descriptors.
//!
//! A [`Shape`] describes the declared layout of a value. The encoder and
//! decoder consult it node by node while they walk a value, so nothing about
//! a type has to be known ahead of time. Recursive layouts (a node type that
//! references itself) go through [`Shape::Named`] entries in a [`Registry`].

use std::collections::{BTreeSet, HashMap};

use crate::error::{MarshalError, Result};
use crate::{Kind, Record, Value};

/// Alias chains longer than this are treated as unresolvable.
const MAX_ALIAS_HOPS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl IntWidth {
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            IntWidth::I8 | IntWidth::I16 | IntWidth::I32 | IntWidth::I64
        )
    }

    pub fn min(self) -> i128 {
        match self {
            IntWidth::I8 => i8::MIN.into(),
            IntWidth::I16 => i16::MIN.into(),
            IntWidth::I32 => i32::MIN.into(),
            IntWidth::I64 => i64::MIN.into(),
            _ => 0,
        }
    }

    pub fn max(self) -> i128 {
        match self {
            IntWidth::I8 => i8::MAX.into(),
            IntWidth::I16 => i16::MAX.into(),
            IntWidth::I32 => i32::MAX.into(),
            IntWidth::I64 => i64::MAX.into(),
            IntWidth::U8 => u8::MAX.into(),
            IntWidth::U16 => u16::MAX.into(),
            IntWidth::U32 => u32::MAX.into(),
            IntWidth::U64 => u64::MAX.into(),
        }
    }

    pub fn contains(self, n: i128) -> bool {
        self.min() <= n && n <= self.max()
    }

    pub fn name(self) -> &'static str {
        match self {
            IntWidth::I8 => "i8",
            IntWidth::I16 => "i16",
            IntWidth::I32 => "i32",
            IntWidth::I64 => "i64",
            IntWidth::U8 => "u8",
            IntWidth::U16 => "u16",
            IntWidth::U32 => "u32",
            IntWidth::U64 => "u64",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatWidth {
    F32,
    F64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub shape: Shape,
}

impl Field {
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }
}

/// One arm of a variant part: the tag ordinals that select it and the
/// fields that exist while it is selected.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    /// Empty for the fallback (`else`) arm.
    pub tags: Vec<i64>,
    pub fields: Vec<Field>,
}

/// Tag-dependent tail of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub tag: Box<Field>,
    pub branches: Vec<Branch>,
}

impl Variant {
    pub fn new(tag: impl Into<String>, shape: Shape) -> Self {
        Self {
            tag: Box::new(Field::new(tag, shape)),
            branches: Vec::new(),
        }
    }

    pub fn branch(mut self, tags: impl IntoIterator<Item = i64>, fields: Vec<Field>) -> Self {
        self.branches.push(Branch {
            tags: tags.into_iter().collect(),
            fields,
        });
        self
    }

    pub fn otherwise(mut self, fields: Vec<Field>) -> Self {
        self.branches.push(Branch {
            tags: Vec::new(),
            fields,
        });
        self
    }

    /// Arm selected by a tag ordinal, if any.
    pub fn branch_for(&self, tag: i64) -> Option<&Branch> {
        self.branches
            .iter()
            .find(|branch| branch.tags.contains(&tag))
            .or_else(|| self.branches.iter().find(|branch| branch.tags.is_empty()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordShape {
    pub name: String,
    /// Declared base record; its fields come first.
    pub parent: Option<Box<Shape>>,
    pub fields: Vec<Field>,
    pub variant: Option<Variant>,
    pub tuple: bool,
}

impl RecordShape {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            fields: Vec::new(),
            variant: None,
            tuple: false,
        }
    }

    /// Anonymous tuple with positional field names `Field0`, `Field1`, ...
    pub fn tuple(shapes: impl IntoIterator<Item = Shape>) -> Self {
        let mut record = Self::new("tuple");
        record.tuple = true;
        record.fields = shapes
            .into_iter()
            .enumerate()
            .map(|(i, shape)| Field::new(format!("Field{i}"), shape))
            .collect();
        record
    }

    pub fn field(mut self, name: impl Into<String>, shape: Shape) -> Self {
        self.fields.push(Field::new(name, shape));
        self
    }

    pub fn extends(mut self, parent: Shape) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    pub fn variant(mut self, variant: Variant) -> Self {
        self.variant = Some(variant);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    pub name: String,
    pub ordinal: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumShape {
    pub name: String,
    pub members: Vec<EnumMember>,
}

impl EnumShape {
    /// Enumeration whose members have ordinals `0..n`.
    pub fn new<'a>(name: impl Into<String>, members: impl IntoIterator<Item = &'a str>) -> Self {
        Self::with_ordinals(
            name,
            members
                .into_iter()
                .enumerate()
                .map(|(i, member)| (member, i as i64)),
        )
    }

    pub fn with_ordinals<'a>(
        name: impl Into<String>,
        members: impl IntoIterator<Item = (&'a str, i64)>,
    ) -> Self {
        Self {
            name: name.into(),
            members: members
                .into_iter()
                .map(|(member, ordinal)| EnumMember {
                    name: member.to_owned(),
                    ordinal,
                })
                .collect(),
        }
    }

    pub fn member_name(&self, ordinal: i64) -> Option<&str> {
        self.members
            .iter()
            .find(|member| member.ordinal == ordinal)
            .map(|member| member.name.as_str())
    }

    pub fn member_ordinal(&self, name: &str) -> Option<i64> {
        self.members
            .iter()
            .find(|member| member.name == name)
            .map(|member| member.ordinal)
    }
}

/// Declared layout of a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Bool,
    Char,
    Int(IntWidth),
    Float(FloatWidth),
    String,
    Array { len: usize, elem: Box<Shape> },
    Seq(Box<Shape>),
    Record(RecordShape),
    /// Set of ordinals of the element shape.
    Set(Box<Shape>),
    Enum(EnumShape),
    /// Reference to a heap node holding a value of the target shape.
    Ref(Box<Shape>),
    Opaque,
    Range { base: Box<Shape>, low: i64, high: i64 },
    /// Alias resolved through a [`Registry`].
    Named(String),
}

impl Shape {
    pub fn int(width: IntWidth) -> Self {
        Shape::Int(width)
    }

    pub fn float() -> Self {
        Shape::Float(FloatWidth::F64)
    }

    pub fn array(len: usize, elem: Shape) -> Self {
        Shape::Array {
            len,
            elem: Box::new(elem),
        }
    }

    pub fn seq(elem: Shape) -> Self {
        Shape::Seq(Box::new(elem))
    }

    pub fn set(elem: Shape) -> Self {
        Shape::Set(Box::new(elem))
    }

    pub fn reference(target: Shape) -> Self {
        Shape::Ref(Box::new(target))
    }

    pub fn named(name: impl Into<String>) -> Self {
        Shape::Named(name.into())
    }

    pub fn range(base: Shape, low: i64, high: i64) -> Self {
        Shape::Range {
            base: Box::new(base),
            low,
            high,
        }
    }

    /// Kind tag; `None` for an alias, which has to be resolved first.
    pub fn kind(&self) -> Option<Kind> {
        Some(match self {
            Shape::Bool => Kind::Bool,
            Shape::Char => Kind::Char,
            Shape::Int(_) => Kind::Int,
            Shape::Float(_) => Kind::Float,
            Shape::String => Kind::String,
            Shape::Array { .. } => Kind::Array,
            Shape::Seq(_) => Kind::Seq,
            Shape::Record(_) => Kind::Record,
            Shape::Set(_) => Kind::Set,
            Shape::Enum(_) => Kind::Enum,
            Shape::Ref(_) => Kind::Ref,
            Shape::Opaque => Kind::Opaque,
            Shape::Range { .. } => Kind::Range,
            Shape::Named(_) => return None,
        })
    }
}

/// Named shapes, so that layouts can refer to themselves.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    aliases: HashMap<String, Shape>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: impl Into<String>, shape: Shape) -> &mut Self {
        self.aliases.insert(name.into(), shape);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Shape> {
        self.aliases.get(name)
    }

    /// Follows aliases until a concrete shape is reached.
    pub fn resolve_alias<'a>(&'a self, shape: &'a Shape) -> Result<&'a Shape> {
        let mut current = shape;
        for _ in 0..MAX_ALIAS_HOPS {
            match current {
                Shape::Named(name) => {
                    current = self
                        .aliases
                        .get(name)
                        .ok_or_else(|| MarshalError::UnknownShape(name.clone()))?;
                }
                other => return Ok(other),
            }
        }
        Err(MarshalError::UnknownShape(format!("{current:?}")))
    }

    /// Follows aliases and range subtypes down to the shape that decides
    /// encoding.
    pub fn resolve<'a>(&'a self, shape: &'a Shape) -> Result<&'a Shape> {
        let mut current = self.resolve_alias(shape)?;
        for _ in 0..MAX_ALIAS_HOPS {
            match current {
                Shape::Range { base, .. } => current = self.resolve_alias(base)?,
                other => return Ok(other),
            }
        }
        Err(MarshalError::UnknownShape(format!("{current:?}")))
    }

    pub fn kind(&self, shape: &Shape) -> Result<Kind> {
        self.resolve_alias(shape)?
            .kind()
            .ok_or_else(|| MarshalError::UnknownShape(format!("{shape:?}")))
    }

    /// Fields present in a record value, in wire order: parent fields, own
    /// fields, the variant tag, then the fields of the arm the tag selects.
    ///
    /// With no value (or no tag in it) the tag's default ordinal decides the
    /// arm.
    pub fn active_fields<'a>(
        &'a self,
        record: &'a RecordShape,
        value: Option<&Record>,
    ) -> Result<Vec<&'a Field>> {
        let mut out = Vec::new();
        self.collect_fields(record, value, &mut out, 0)?;
        Ok(out)
    }

    fn collect_fields<'a>(
        &'a self,
        record: &'a RecordShape,
        value: Option<&Record>,
        out: &mut Vec<&'a Field>,
        depth: usize,
    ) -> Result<()> {
        if depth > MAX_ALIAS_HOPS {
            return Err(MarshalError::UnknownShape(record.name.clone()));
        }
        if let Some(parent) = &record.parent {
            match self.resolve(parent)? {
                Shape::Record(parent) => self.collect_fields(parent, value, out, depth + 1)?,
                other => return Err(MarshalError::mismatch("record parent", format!("{other:?}"))),
            }
        }
        out.extend(record.fields.iter());
        if let Some(variant) = &record.variant {
            out.push(variant.tag.as_ref());
            let tag = match value.and_then(|v| v.get(&variant.tag.name)) {
                Some(tag) => tag
                    .ordinal()
                    .ok_or_else(|| MarshalError::mismatch("ordinal tag", tag.kind_name()))?,
                None => self.default_ordinal(&variant.tag.shape)?,
            };
            if let Some(branch) = variant.branch_for(tag) {
                out.extend(branch.fields.iter());
            }
        }
        Ok(())
    }

    /// Zero value of a shape.
    pub fn default_value(&self, shape: &Shape) -> Result<Value> {
        Ok(match self.resolve_alias(shape)? {
            Shape::Bool => Value::Bool(false),
            Shape::Char => Value::Char('\0'),
            Shape::Int(width) if width.is_signed() => Value::Int(0),
            Shape::Int(_) => Value::UInt(0),
            Shape::Float(_) => Value::Float(0.0),
            Shape::String => Value::Str(None),
            Shape::Array { len, elem } => {
                let elem = self.default_value(elem)?;
                Value::Array(vec![elem; *len])
            }
            Shape::Seq(_) => Value::Seq(None),
            Shape::Record(record) => {
                let mut fields = Record::new();
                for field in self.active_fields(record, None)? {
                    fields.insert(field.name.clone(), self.default_value(&field.shape)?);
                }
                Value::Record(fields)
            }
            Shape::Set(_) => Value::Set(BTreeSet::new()),
            Shape::Enum(e) => Value::Enum(e.members.first().map_or(0, |m| m.ordinal)),
            Shape::Ref(_) => Value::Ref(None),
            Shape::Opaque => Value::Opaque(None),
            Shape::Range { low, .. } => {
                let base = self.resolve(shape)?;
                self.from_ordinal(base, *low)
                    .ok_or_else(|| MarshalError::mismatch("ordinal range base", format!("{base:?}")))?
            }
            Shape::Named(name) => return Err(MarshalError::UnknownShape(name.clone())),
        })
    }

    fn default_ordinal(&self, shape: &Shape) -> Result<i64> {
        let value = self.default_value(shape)?;
        value
            .ordinal()
            .ok_or_else(|| MarshalError::mismatch("ordinal", value.kind_name()))
    }

    /// Whether `ordinal` is a legal value of an ordinal shape.
    pub fn is_valid_ordinal(&self, shape: &Shape, ordinal: i64) -> Result<bool> {
        Ok(match self.resolve_alias(shape)? {
            Shape::Bool => ordinal == 0 || ordinal == 1,
            Shape::Char => u32::try_from(ordinal).ok().and_then(char::from_u32).is_some(),
            Shape::Int(width) => width.contains(ordinal.into()),
            Shape::Enum(e) => e.member_name(ordinal).is_some(),
            Shape::Range { base, low, high } => {
                *low <= ordinal && ordinal <= *high && self.is_valid_ordinal(base, ordinal)?
            }
            other => return Err(MarshalError::mismatch("ordinal shape", format!("{other:?}"))),
        })
    }

    /// Builds the value of an ordinal shape from its ordinal.
    pub fn from_ordinal(&self, shape: &Shape, ordinal: i64) -> Option<Value> {
        match self.resolve(shape).ok()? {
            Shape::Bool => Some(Value::Bool(ordinal != 0)),
            Shape::Char => u32::try_from(ordinal)
                .ok()
                .and_then(char::from_u32)
                .map(Value::Char),
            Shape::Int(width) if width.is_signed() => Some(Value::Int(ordinal)),
            Shape::Int(_) => u64::try_from(ordinal).ok().map(Value::UInt),
            Shape::Enum(_) => Some(Value::Enum(ordinal)),
            _ => None,
        }
    }
}
