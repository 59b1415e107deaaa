//! Writes a value graph as text.
//!
//! The walk is depth-first and driven entirely by the [`Shape`] passed in
//! for each node. Reference targets are written in full (`[id, value]`) the
//! first time they are reached and as a bare `id` afterwards, so shared and
//! cyclic graphs come out finite.

use graphjson_buffers::Writer;

use crate::error::{MarshalError, Result};
use crate::identity::VisitedSet;
use crate::shape::{EnumShape, FloatWidth, IntWidth, RecordShape, Registry, Shape};
use crate::{Heap, NodeId, Record, Value};

const SEPARATOR: &str = ", ";
const KEY_SEPARATOR: &str = ": ";

pub struct Encoder<'a> {
    registry: &'a Registry,
    heap: &'a Heap,
    visited: VisitedSet,
    pub writer: Writer,
}

impl<'a> Encoder<'a> {
    pub fn new(registry: &'a Registry, heap: &'a Heap) -> Self {
        Self {
            registry,
            heap,
            visited: VisitedSet::new(),
            writer: Writer::new(),
        }
    }

    /// Writes one value graph. Identities start fresh on every call.
    pub fn encode(&mut self, shape: &Shape, value: &Value) -> Result<String> {
        self.writer.reset();
        self.visited = VisitedSet::new();
        self.write_any(shape, value)?;
        Ok(self.writer.flush_string())
    }

    /// Number of reference targets written in full so far.
    pub fn emitted(&self) -> usize {
        self.visited.len()
    }

    pub fn write_any(&mut self, shape: &Shape, value: &Value) -> Result<()> {
        let registry = self.registry;
        let shape = registry.resolve(shape)?;
        match (shape, value) {
            (Shape::Bool, Value::Bool(b)) => self.write_boolean(*b),
            (Shape::Char, Value::Char(c)) => self.write_char(*c)?,
            (Shape::Int(width), Value::Int(i)) => {
                check_width(*width, (*i).into())?;
                self.write_integer(*i);
            }
            (Shape::Int(width), Value::UInt(u)) => {
                check_width(*width, (*u).into())?;
                self.write_u_integer(*u);
            }
            (Shape::Float(width), Value::Float(f)) => self.write_float(*width, *f)?,
            (Shape::String, Value::Str(s)) => self.write_bytes(s.as_deref())?,
            (Shape::Enum(e), Value::Enum(ordinal)) => self.write_enum(e, *ordinal)?,
            (Shape::Array { len, elem }, Value::Array(items)) => {
                if items.len() != *len {
                    return Err(MarshalError::mismatch(
                        format!("array of {len} elements"),
                        format!("array of {} elements", items.len()),
                    ));
                }
                self.write_arr(elem, items)?;
            }
            (Shape::Seq(_), Value::Seq(None)) => self.write_null(),
            (Shape::Seq(elem), Value::Seq(Some(items))) => self.write_arr(elem, items)?,
            (Shape::Record(record), Value::Record(fields)) => self.write_record(record, fields)?,
            (Shape::Set(elem), Value::Set(ordinals)) => {
                for &ordinal in ordinals {
                    if !registry.is_valid_ordinal(elem, ordinal)? {
                        return Err(MarshalError::mismatch(
                            "set member",
                            format!("ordinal {ordinal}"),
                        ));
                    }
                }
                self.writer.u8(b'[');
                for (i, ordinal) in ordinals.iter().enumerate() {
                    if i > 0 {
                        self.writer.ascii(SEPARATOR);
                    }
                    self.write_integer(*ordinal);
                }
                self.writer.u8(b']');
            }
            (Shape::Ref(target), Value::Ref(node)) => self.write_ref(target, *node)?,
            (Shape::Opaque, Value::Opaque(None)) => self.write_null(),
            (Shape::Opaque, Value::Opaque(Some(addr))) => self.write_u_integer(*addr),
            (shape, value) => {
                let expected = shape.kind().map_or("shape", |kind| kind.name());
                return Err(MarshalError::mismatch(expected, value.kind_name()));
            }
        }
        Ok(())
    }

    pub fn write_null(&mut self) {
        self.writer.ascii("null");
    }

    pub fn write_boolean(&mut self, b: bool) {
        self.writer.ascii(if b { "true" } else { "false" });
    }

    pub fn write_integer(&mut self, int: i64) {
        self.writer.ascii(&int.to_string());
    }

    pub fn write_u_integer(&mut self, uint: u64) {
        self.writer.ascii(&uint.to_string());
    }

    /// ASCII characters as a one-character string, anything else as its code
    /// point.
    pub fn write_char(&mut self, c: char) -> Result<()> {
        if c.is_ascii() {
            let mut buf = [0u8; 4];
            self.write_str(c.encode_utf8(&mut buf))?;
        } else {
            self.write_u_integer(u64::from(u32::from(c)));
        }
        Ok(())
    }

    /// Finite values that do not fit the declared width are a mismatch.
    pub fn write_float(&mut self, width: FloatWidth, float: f64) -> Result<()> {
        if float.is_nan() {
            return self.write_str("NaN");
        }
        if float.is_infinite() {
            return self.write_str(if float > 0.0 { "Infinity" } else { "-Infinity" });
        }
        // Debug formatting always keeps a '.' or an exponent, so the
        // number reads back as a float.
        let text = match width {
            FloatWidth::F32 => {
                let narrow = float as f32;
                if narrow.is_infinite() {
                    return Err(MarshalError::mismatch("f32", format!("float {float:?}")));
                }
                format!("{narrow:?}")
            }
            FloatWidth::F64 => format!("{float:?}"),
        };
        self.writer.ascii(&text);
        Ok(())
    }

    /// Absent string as `null`, valid UTF-8 as a string, anything else as
    /// an array of byte values.
    pub fn write_bytes(&mut self, bytes: Option<&[u8]>) -> Result<()> {
        match bytes {
            None => self.write_null(),
            Some(bytes) => match std::str::from_utf8(bytes) {
                Ok(s) => self.write_str(s)?,
                Err(_) => {
                    self.writer.u8(b'[');
                    for (i, byte) in bytes.iter().enumerate() {
                        if i > 0 {
                            self.writer.ascii(SEPARATOR);
                        }
                        self.writer.ascii(&byte.to_string());
                    }
                    self.writer.u8(b']');
                }
            },
        }
        Ok(())
    }

    /// Write a JSON-encoded string (with escaping).
    pub fn write_str(&mut self, s: &str) -> Result<()> {
        let bytes = s.as_bytes();
        let plain = bytes
            .iter()
            .all(|&b| (32..=126).contains(&b) && b != b'"' && b != b'\\');
        if plain {
            self.writer.ensure_capacity(bytes.len() + 2);
            self.writer.u8(b'"');
            self.writer.buf(bytes);
            self.writer.u8(b'"');
            return Ok(());
        }
        let quoted = serde_json::to_string(s)?;
        self.writer.utf8(&quoted);
        Ok(())
    }

    fn write_enum(&mut self, e: &EnumShape, ordinal: i64) -> Result<()> {
        match e.member_name(ordinal) {
            Some(name) => self.write_str(name)?,
            None => self.write_integer(ordinal),
        }
        Ok(())
    }

    fn write_arr(&mut self, elem: &Shape, items: &[Value]) -> Result<()> {
        self.writer.u8(b'[');
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.writer.ascii(SEPARATOR);
            }
            self.write_any(elem, item)?;
        }
        self.writer.u8(b']');
        Ok(())
    }

    fn write_record(&mut self, record: &RecordShape, fields: &Record) -> Result<()> {
        let registry = self.registry;
        let active = registry.active_fields(record, Some(fields))?;
        self.writer.u8(b'{');
        for (i, field) in active.into_iter().enumerate() {
            let value = fields
                .get(&field.name)
                .ok_or_else(|| MarshalError::MissingField {
                    record: record.name.clone(),
                    field: field.name.clone(),
                })?;
            if i > 0 {
                self.writer.ascii(SEPARATOR);
            }
            self.write_str(&field.name)?;
            self.writer.ascii(KEY_SEPARATOR);
            self.write_any(&field.shape, value)?;
        }
        self.writer.u8(b'}');
        Ok(())
    }

    fn write_ref(&mut self, target: &Shape, node: Option<NodeId>) -> Result<()> {
        let Some(id) = node else {
            self.write_null();
            return Ok(());
        };
        let heap = self.heap;
        let value = heap.get(id).ok_or(MarshalError::InvalidNode(id))?;
        let identity = id.index().to_string();
        if !self.visited.first_visit(id) {
            self.writer.ascii(&identity);
            return Ok(());
        }
        self.writer.u8(b'[');
        self.writer.ascii(&identity);
        self.writer.ascii(SEPARATOR);
        self.write_any(target, value)?;
        self.writer.u8(b']');
        Ok(())
    }
}

fn check_width(width: IntWidth, n: i128) -> Result<()> {
    if width.contains(n) {
        Ok(())
    } else {
        Err(MarshalError::mismatch(width.name(), format!("integer {n}")))
    }
}
