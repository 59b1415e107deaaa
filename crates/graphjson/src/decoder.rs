//! Rebuilds a value graph from a token stream.
//!
//! Mirrors the encoder: each node is read according to its [`Shape`].
//! A `[id, value]` reference form allocates a heap node and registers `id`
//! before the payload is read, so a reference back to a node that is still
//! being filled resolves to that node instead of recursing.

use std::collections::{BTreeSet, HashSet};

use graphjson_tokens::{Position, Spanned, Token, TokenReader};

use crate::error::{MarshalError, Result};
use crate::identity::BackrefTable;
use crate::options::{DanglingRefs, Options};
use crate::shape::{FloatWidth, IntWidth, RecordShape, Registry, Shape};
use crate::{Heap, Record, Value};

pub struct Decoder<'a> {
    registry: &'a Registry,
    options: &'a Options,
    heap: &'a mut Heap,
    reader: &'a mut TokenReader,
    backrefs: BackrefTable,
    depth: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(
        registry: &'a Registry,
        options: &'a Options,
        heap: &'a mut Heap,
        reader: &'a mut TokenReader,
    ) -> Self {
        Self {
            registry,
            options,
            heap,
            reader,
            backrefs: BackrefTable::new(),
            depth: 0,
        }
    }

    /// Reads exactly one value into `target`. Identities start fresh on
    /// every call.
    pub fn decode(&mut self, shape: &Shape, target: &mut Value) -> Result<()> {
        self.backrefs = BackrefTable::new();
        self.depth = 0;
        self.read_any(shape, target)
    }

    /// Number of reference targets allocated so far.
    pub fn allocated(&self) -> usize {
        self.backrefs.len()
    }

    pub fn read_any(&mut self, shape: &Shape, target: &mut Value) -> Result<()> {
        let registry = self.registry;
        match registry.resolve(shape)? {
            Shape::Bool => {
                let next = self.reader.next()?;
                match next.token {
                    Token::Bool(b) => *target = Value::Bool(b),
                    _ => return Err(unexpected("boolean", &next)),
                }
            }
            Shape::Char => *target = Value::Char(self.read_char()?),
            Shape::Int(width) => *target = self.read_int(*width)?,
            Shape::Float(width) => *target = Value::Float(self.read_float(*width)?),
            Shape::String => *target = Value::Str(self.read_bytes()?),
            Shape::Enum(e) => {
                let next = self.reader.next()?;
                match next.token {
                    Token::Str(name) => match e.member_ordinal(&name) {
                        Some(ordinal) => *target = Value::Enum(ordinal),
                        None => {
                            return Err(MarshalError::NoSuchMember {
                                enumeration: e.name.clone(),
                                name,
                                pos: next.pos,
                            })
                        }
                    },
                    _ => return Err(unexpected("enumeration member name", &next)),
                }
            }
            Shape::Array { len, elem } => self.read_array(*len, elem, target)?,
            Shape::Seq(elem) => self.read_seq(elem, target)?,
            Shape::Record(record) => self.read_record(record, target)?,
            Shape::Set(elem) => self.read_set(elem, target)?,
            Shape::Ref(inner) => self.read_ref(inner, target)?,
            Shape::Opaque => {
                let next = self.reader.next()?;
                *target = Value::Opaque(match next.token {
                    Token::Null => None,
                    Token::Integer(i) => Some(u64::try_from(i).map_err(|_| MarshalError::OutOfRange {
                        what: format!("address {i}"),
                        pos: next.pos,
                    })?),
                    Token::UInteger(u) => Some(u),
                    _ => return Err(unexpected("null or address", &next)),
                });
            }
            other => return Err(MarshalError::UnknownShape(format!("{other:?}"))),
        }
        Ok(())
    }

    fn enter(&mut self, pos: Position) -> Result<()> {
        self.depth += 1;
        match self.options.max_depth {
            Some(limit) if self.depth > limit => Err(MarshalError::TooDeep { limit, pos }),
            _ => Ok(()),
        }
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn expect_array_start(&mut self, expected: &str) -> Result<()> {
        let next = self.reader.next()?;
        match next.token {
            Token::ArrayStart => self.enter(next.pos),
            _ => Err(unexpected(expected, &next)),
        }
    }

    fn expect_array_end(&mut self) -> Result<()> {
        let next = self.reader.next()?;
        match next.token {
            Token::ArrayEnd => {
                self.leave();
                Ok(())
            }
            _ => Err(unexpected("']'", &next)),
        }
    }

    /// Consumes `]` if it is next.
    fn at_array_end(&mut self) -> Result<bool> {
        if self.reader.peek()?.token == Token::ArrayEnd {
            self.reader.next()?;
            self.leave();
            return Ok(true);
        }
        Ok(false)
    }

    fn read_char(&mut self) -> Result<char> {
        let next = self.reader.next()?;
        match &next.token {
            Token::Str(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(unexpected("one-character string", &next)),
                }
            }
            Token::Integer(code) => u32::try_from(*code)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(|| MarshalError::OutOfRange {
                    what: format!("code point {code}"),
                    pos: next.pos,
                }),
            _ => Err(unexpected("character", &next)),
        }
    }

    fn read_int(&mut self, width: IntWidth) -> Result<Value> {
        let next = self.reader.next()?;
        let n: i128 = match next.token {
            Token::Integer(i) => i.into(),
            Token::UInteger(u) => u.into(),
            _ => return Err(unexpected("integer", &next)),
        };
        if !width.contains(n) {
            return Err(MarshalError::OutOfRange {
                what: format!("{} value {n}", width.name()),
                pos: next.pos,
            });
        }
        // In range for the width, so the conversions below cannot truncate.
        Ok(if width.is_signed() {
            Value::Int(n as i64)
        } else {
            Value::UInt(n as u64)
        })
    }

    fn read_float(&mut self, width: FloatWidth) -> Result<f64> {
        let next = self.reader.next()?;
        let f = match &next.token {
            Token::Float(f) => *f,
            Token::Str(s) if s == "NaN" => f64::NAN,
            Token::Str(s) if s == "Infinity" => f64::INFINITY,
            Token::Str(s) if s == "-Infinity" => f64::NEG_INFINITY,
            _ => return Err(unexpected("float", &next)),
        };
        Ok(match width {
            FloatWidth::F32 => f64::from(f as f32),
            FloatWidth::F64 => f,
        })
    }

    fn read_bytes(&mut self) -> Result<Option<Vec<u8>>> {
        let next = self.reader.next()?;
        match next.token {
            Token::Null => Ok(None),
            Token::Str(s) => Ok(Some(s.into_bytes())),
            Token::ArrayStart => {
                self.enter(next.pos)?;
                let mut bytes = Vec::new();
                loop {
                    let item = self.reader.next()?;
                    match item.token {
                        Token::ArrayEnd => break,
                        Token::Integer(b) => {
                            let byte = u8::try_from(b).map_err(|_| MarshalError::OutOfRange {
                                what: format!("byte {b}"),
                                pos: item.pos,
                            })?;
                            bytes.push(byte);
                        }
                        _ => return Err(unexpected("byte value", &item)),
                    }
                }
                self.leave();
                Ok(Some(bytes))
            }
            _ => Err(unexpected("string, null or byte array", &next)),
        }
    }

    fn read_array(&mut self, len: usize, elem: &Shape, target: &mut Value) -> Result<()> {
        self.expect_array_start("'['")?;
        if !matches!(target, Value::Array(items) if items.len() == len) {
            *target = Value::Array(vec![self.registry.default_value(elem)?; len]);
        }
        if let Value::Array(items) = target {
            for (i, item) in items.iter_mut().enumerate() {
                let peeked = self.reader.peek()?;
                if peeked.token == Token::ArrayEnd {
                    return Err(MarshalError::Unexpected {
                        expected: format!("{len} elements"),
                        found: format!("{i} elements"),
                        pos: peeked.pos,
                    });
                }
                self.read_any(elem, item)?;
            }
        }
        self.expect_array_end()
    }

    fn read_seq(&mut self, elem: &Shape, target: &mut Value) -> Result<()> {
        let next = self.reader.next()?;
        match next.token {
            Token::Null => {
                *target = Value::Seq(None);
                Ok(())
            }
            Token::ArrayStart => {
                self.enter(next.pos)?;
                let mut items = Vec::new();
                while !self.at_array_end()? {
                    items.push(self.registry.default_value(elem)?);
                    if let Some(slot) = items.last_mut() {
                        self.read_any(elem, slot)?;
                    }
                }
                *target = Value::Seq(Some(items));
                Ok(())
            }
            _ => Err(unexpected("null or '['", &next)),
        }
    }

    fn read_record(&mut self, record: &RecordShape, target: &mut Value) -> Result<()> {
        let registry = self.registry;
        let next = self.reader.next()?;
        if next.token != Token::ObjectStart {
            return Err(unexpected("'{'", &next));
        }
        self.enter(next.pos)?;
        if !matches!(target, Value::Record(_)) {
            let mut fresh = Record::new();
            for field in registry.active_fields(record, None)? {
                fresh.insert(field.name.clone(), registry.default_value(&field.shape)?);
            }
            *target = Value::Record(fresh);
        }
        let Value::Record(fields) = target else {
            return Err(MarshalError::mismatch("record", "another kind"));
        };
        let mut seen = HashSet::new();
        loop {
            let key = self.reader.next()?;
            let name = match key.token {
                Token::ObjectEnd => break,
                Token::Str(name) => name,
                _ => return Err(unexpected("field name", &key)),
            };
            let before: Vec<&str> = registry
                .active_fields(record, Some(fields))?
                .into_iter()
                .map(|f| f.name.as_str())
                .collect();
            let field = registry
                .active_fields(record, Some(fields))?
                .into_iter()
                .find(|f| f.name == name)
                .ok_or_else(|| MarshalError::NoSuchField {
                    record: record.name.clone(),
                    name: name.clone(),
                    pos: key.pos,
                })?;
            // A repeated key replaces the earlier value instead of merging.
            let repeated = !seen.insert(name.clone());
            if repeated || !fields.contains_key(&name) {
                fields.insert(name.clone(), registry.default_value(&field.shape)?);
            }
            if let Some(slot) = fields.get_mut(&name) {
                self.read_any(&field.shape, slot)?;
            }
            // A new tag value can select another variant arm.
            let after = registry.active_fields(record, Some(fields))?;
            if after.len() != before.len() || after.iter().zip(&before).any(|(a, b)| a.name != *b) {
                for stale in before.iter().filter(|b| !after.iter().any(|a| a.name == **b)) {
                    fields.shift_remove(*stale);
                }
                for fresh in after {
                    if !fields.contains_key(&fresh.name) {
                        fields.insert(fresh.name.clone(), registry.default_value(&fresh.shape)?);
                    }
                }
            }
        }
        self.leave();
        Ok(())
    }

    fn read_set(&mut self, elem: &Shape, target: &mut Value) -> Result<()> {
        self.expect_array_start("'['")?;
        let mut ordinals = BTreeSet::new();
        loop {
            let item = self.reader.next()?;
            match item.token {
                Token::ArrayEnd => break,
                Token::Integer(ordinal) => {
                    if !self.registry.is_valid_ordinal(elem, ordinal)? {
                        return Err(MarshalError::OutOfRange {
                            what: format!("set member {ordinal}"),
                            pos: item.pos,
                        });
                    }
                    ordinals.insert(ordinal);
                }
                _ => return Err(unexpected("member ordinal", &item)),
            }
        }
        self.leave();
        *target = Value::Set(ordinals);
        Ok(())
    }

    fn read_ref(&mut self, inner: &Shape, target: &mut Value) -> Result<()> {
        let next = self.reader.next()?;
        match next.token {
            Token::Null => *target = Value::Ref(None),
            Token::Integer(_) | Token::UInteger(_) => {
                let id = identity(&next)?;
                *target = match self.backrefs.resolve(id) {
                    Some(node) => Value::Ref(Some(node)),
                    None => match self.options.dangling_refs {
                        DanglingRefs::Nil => {
                            tracing::warn!(id, pos = %next.pos, "unallocated identity decoded as empty reference");
                            Value::Ref(None)
                        }
                        DanglingRefs::Reject => {
                            return Err(MarshalError::DanglingRef { id, pos: next.pos })
                        }
                    },
                };
            }
            Token::ArrayStart => {
                self.enter(next.pos)?;
                let id_token = self.reader.next()?;
                let id = identity(&id_token)?;
                let mut value = self.registry.default_value(inner)?;
                let node = self.heap.alloc(value.clone());
                if !self.backrefs.register(id, node) {
                    return Err(MarshalError::DuplicateIdentity {
                        id,
                        pos: id_token.pos,
                    });
                }
                tracing::trace!(id, node = node.index(), "allocated reference target");
                self.read_any(inner, &mut value)?;
                self.heap.replace(node, value);
                self.expect_array_end()?;
                *target = Value::Ref(Some(node));
            }
            _ => return Err(unexpected("null, identity or [identity, value]", &next)),
        }
        Ok(())
    }
}

fn identity(spanned: &Spanned) -> Result<u64> {
    match spanned.token {
        Token::Integer(i) => u64::try_from(i).map_err(|_| MarshalError::OutOfRange {
            what: format!("identity {i}"),
            pos: spanned.pos,
        }),
        Token::UInteger(u) => Ok(u),
        _ => Err(unexpected("identity", spanned)),
    }
}

fn unexpected(expected: &str, found: &Spanned) -> MarshalError {
    MarshalError::Unexpected {
        expected: expected.to_owned(),
        found: found.token.to_string(),
        pos: found.pos,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::EnumShape;

    fn decode(shape: &Shape, text: &str) -> Result<Value> {
        let registry = Registry::new();
        let options = Options::default();
        let mut heap = Heap::new();
        let mut reader = TokenReader::new(text);
        let mut target = registry.default_value(shape)?;
        Decoder::new(&registry, &options, &mut heap, &mut reader).decode(shape, &mut target)?;
        Ok(target)
    }

    #[test]
    fn primitives() {
        assert_eq!(decode(&Shape::Bool, "false").unwrap(), Value::Bool(false));
        assert_eq!(decode(&Shape::Char, r#""x""#).unwrap(), Value::Char('x'));
        assert_eq!(decode(&Shape::Char, "233").unwrap(), Value::Char('é'));
        assert_eq!(
            decode(&Shape::int(IntWidth::I16), "-300").unwrap(),
            Value::Int(-300)
        );
        assert_eq!(
            decode(&Shape::int(IntWidth::U64), "18446744073709551615").unwrap(),
            Value::UInt(u64::MAX)
        );
        assert_eq!(decode(&Shape::float(), "2.5").unwrap(), Value::Float(2.5));
        assert!(matches!(
            decode(&Shape::float(), r#""NaN""#).unwrap(),
            Value::Float(f) if f.is_nan()
        ));
        assert_eq!(
            decode(&Shape::Opaque, "12").unwrap(),
            Value::Opaque(Some(12))
        );
    }

    #[test]
    fn numeric_class_must_match() {
        assert!(matches!(
            decode(&Shape::float(), "1"),
            Err(MarshalError::Unexpected { .. })
        ));
        assert!(matches!(
            decode(&Shape::int(IntWidth::I32), "1.0"),
            Err(MarshalError::Unexpected { .. })
        ));
        assert!(matches!(
            decode(&Shape::int(IntWidth::U8), "256"),
            Err(MarshalError::OutOfRange { .. })
        ));
        assert!(matches!(
            decode(&Shape::int(IntWidth::I64), "18446744073709551615"),
            Err(MarshalError::OutOfRange { .. })
        ));
    }

    #[test]
    fn chars_need_exactly_one() {
        assert!(matches!(
            decode(&Shape::Char, r#""ab""#),
            Err(MarshalError::Unexpected { .. })
        ));
        assert!(matches!(
            decode(&Shape::Char, "55296"),
            Err(MarshalError::OutOfRange { .. })
        ));
    }

    #[test]
    fn strings() {
        assert_eq!(decode(&Shape::String, "null").unwrap(), Value::Str(None));
        assert_eq!(decode(&Shape::String, r#""hi""#).unwrap(), Value::str("hi"));
        assert_eq!(
            decode(&Shape::String, "[104, 255]").unwrap(),
            Value::bytes(vec![104, 255])
        );
        assert!(matches!(
            decode(&Shape::String, "[300]"),
            Err(MarshalError::OutOfRange { .. })
        ));
        assert!(matches!(
            decode(&Shape::String, "true"),
            Err(MarshalError::Unexpected { .. })
        ));
    }

    #[test]
    fn enums() {
        let e = Shape::Enum(EnumShape::new("E", ["blah", "bah"]));
        assert_eq!(decode(&e, r#""bah""#).unwrap(), Value::Enum(1));
        assert!(matches!(
            decode(&e, r#""nope""#),
            Err(MarshalError::NoSuchMember { name, .. }) if name == "nope"
        ));
    }

    #[test]
    fn fixed_arrays_check_length() {
        let shape = Shape::array(2, Shape::Bool);
        assert_eq!(
            decode(&shape, "[true, false]").unwrap(),
            Value::Array(vec![Value::Bool(true), Value::Bool(false)])
        );
        assert!(matches!(
            decode(&shape, "[true]"),
            Err(MarshalError::Unexpected { .. })
        ));
        assert!(matches!(
            decode(&shape, "[true, true, true]"),
            Err(MarshalError::Unexpected { .. })
        ));
    }

    #[test]
    fn sets_validate_ordinals() {
        let shape = Shape::set(Shape::int(IntWidth::U8));
        assert_eq!(decode(&shape, "[3, 1, 3]").unwrap(), Value::set([1, 3]));
        assert!(matches!(
            decode(&shape, "[256]"),
            Err(MarshalError::OutOfRange { .. })
        ));
        assert!(matches!(
            decode(&shape, r#"["a"]"#),
            Err(MarshalError::Unexpected { .. })
        ));
    }

    #[test]
    fn depth_limit() {
        let registry = Registry::new();
        let options = Options {
            max_depth: Some(2),
            ..Options::default()
        };
        let shape = Shape::seq(Shape::seq(Shape::seq(Shape::Bool)));
        let mut heap = Heap::new();
        let mut reader = TokenReader::new("[[[true]]]");
        let mut target = Value::Seq(None);
        let err = Decoder::new(&registry, &options, &mut heap, &mut reader)
            .decode(&shape, &mut target)
            .unwrap_err();
        assert!(matches!(err, MarshalError::TooDeep { limit: 2, .. }));
    }

    #[test]
    fn identities_restart_on_every_decode() {
        let registry = Registry::new();
        let options = Options::default();
        let shape = Shape::reference(Shape::int(IntWidth::I32));
        let mut heap = Heap::new();
        let mut reader = TokenReader::new("[0, 1] [0, 2]");
        let mut decoder = Decoder::new(&registry, &options, &mut heap, &mut reader);
        let mut first = Value::Ref(None);
        let mut second = Value::Ref(None);
        decoder.decode(&shape, &mut first).expect("first");
        decoder.decode(&shape, &mut second).expect("second");
        assert_eq!(decoder.allocated(), 1);
        assert_ne!(first, second);
        assert_eq!(heap.get(second.as_node().expect("node")), Some(&Value::Int(2)));
    }

    #[test]
    fn repeated_keys_replace_nested_records() {
        let inner = Shape::Record(
            RecordShape::new("Inner")
                .field("a", Shape::int(IntWidth::I32))
                .field("b", Shape::seq(Shape::Bool)),
        );
        let shape = Shape::Record(RecordShape::new("Outer").field("inner", inner));
        let value = decode(
            &shape,
            r#"{"inner": {"a": 1, "b": [true]}, "inner": {"a": 3}}"#,
        )
        .expect("decode");
        assert_eq!(
            value.field("inner"),
            Some(&Value::record([("a", Value::Int(3)), ("b", Value::Seq(None))]))
        );
    }
}
