//! Shape-driven serializer for in-memory value graphs.
//!
//! A [`Value`] tree is written to JSON-shaped text by walking a declared
//! [`Shape`]. Heap nodes live in a [`Heap`] and are reached through
//! [`Value::Ref`]; the first reference to a node writes `[id, value]`, every
//! later one writes the bare `id`. Decoding rebuilds the same topology, so
//! cycles and shared nodes survive a round trip.
//!
//! ```
//! use graphjson::{Codec, Heap, RecordShape, Registry, Shape, Value};
//!
//! let mut registry = Registry::new();
//! registry.define(
//!     "Node",
//!     Shape::Record(
//!         RecordShape::new("Node")
//!             .field("name", Shape::String)
//!             .field("next", Shape::reference(Shape::named("Node"))),
//!     ),
//! );
//! let shape = Shape::reference(Shape::named("Node"));
//!
//! let mut heap = Heap::new();
//! let node = heap.alloc(Value::Bool(false));
//! heap.replace(node, Value::record([("name", Value::str("a")), ("next", Value::Ref(Some(node)))]));
//!
//! let codec = Codec::new(&registry);
//! let text = codec.store(&shape, &Value::Ref(Some(node)), &heap).unwrap();
//! assert_eq!(text, r#"[0, {"name": "a", "next": 0}]"#);
//!
//! let mut decoded = Heap::new();
//! let root = codec.load(&text, &shape, &mut decoded).unwrap();
//! let id = root.as_node().unwrap();
//! assert_eq!(decoded.get(id).unwrap().field("next"), Some(&Value::Ref(Some(id))));
//! ```

use std::io;

pub use graphjson_tokens::{Position, TokenReader};

mod decoder;
mod encoder;
mod equal;
mod error;
mod heap;
mod identity;
mod kind;
mod marshal;
mod options;
mod shape;
mod value;

pub use decoder::Decoder;
pub use encoder::Encoder;
pub use equal::graph_equal;
pub use error::{ErrorKind, MarshalError, Result};
pub use heap::{Heap, NodeId};
pub use identity::{BackrefTable, VisitedSet};
pub use kind::Kind;
pub use marshal::{from_text, to_text, Marshal, Ordinal};
pub use options::{DanglingRefs, Options};
pub use shape::{
    Branch, EnumShape, Field, FloatWidth, IntWidth, RecordShape, Registry, Shape, Variant,
};
pub use value::{Record, Value};

/// Store/load entry points bound to a shape registry.
#[derive(Debug, Clone)]
pub struct Codec<'r> {
    registry: &'r Registry,
    options: Options,
}

impl<'r> Codec<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self::with_options(registry, Options::default())
    }

    pub fn with_options(registry: &'r Registry, options: Options) -> Self {
        Self { registry, options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Serializes `value` (and every heap node it reaches) to text.
    pub fn store(&self, shape: &Shape, value: &Value, heap: &Heap) -> Result<String> {
        let mut encoder = Encoder::new(self.registry, heap);
        let text = encoder.encode(shape, value)?;
        tracing::debug!(bytes = text.len(), nodes = encoder.emitted(), "stored value graph");
        Ok(text)
    }

    /// Serializes into `out`, returning the number of bytes written.
    pub fn store_to<W: io::Write>(
        &self,
        shape: &Shape,
        value: &Value,
        heap: &Heap,
        out: &mut W,
    ) -> Result<usize> {
        let mut encoder = Encoder::new(self.registry, heap);
        encoder.writer.reset();
        encoder.write_any(shape, value)?;
        let written = encoder.writer.flush_to(out)?;
        tracing::debug!(bytes = written, nodes = encoder.emitted(), "stored value graph");
        Ok(written)
    }

    /// Decodes a complete document into a fresh value of `shape`.
    ///
    /// On failure every node this call allocated is dropped from `heap`
    /// again.
    pub fn load(&self, text: &str, shape: &Shape, heap: &mut Heap) -> Result<Value> {
        let mut target = self.registry.default_value(shape)?;
        self.load_into(text, shape, &mut target, heap)?;
        Ok(target)
    }

    /// Decodes a complete document over an existing value.
    ///
    /// Record fields missing from the text keep whatever `target` already
    /// held.
    pub fn load_into(
        &self,
        text: &str,
        shape: &Shape,
        target: &mut Value,
        heap: &mut Heap,
    ) -> Result<()> {
        let start = heap.len();
        let mut reader = TokenReader::new(text);
        self.load_next(&mut reader, shape, target, heap)?;
        self.finish(&mut reader).inspect_err(|_| heap.truncate(start))
    }

    /// Reads a complete document from `input`.
    pub fn load_from<R: io::Read>(&self, input: R, shape: &Shape, heap: &mut Heap) -> Result<Value> {
        let mut reader = TokenReader::from_reader(input)?;
        let start = heap.len();
        let mut target = self.registry.default_value(shape)?;
        self.load_next(&mut reader, shape, &mut target, heap)?;
        self.finish(&mut reader).inspect_err(|_| heap.truncate(start))?;
        Ok(target)
    }

    /// Decodes one document from a token stream, leaving the reader after
    /// it. Identities are scoped to this document, and a failed document
    /// leaves no nodes behind in `heap`.
    pub fn load_next(
        &self,
        reader: &mut TokenReader,
        shape: &Shape,
        target: &mut Value,
        heap: &mut Heap,
    ) -> Result<()> {
        let start = heap.len();
        let decoded = {
            let mut decoder = Decoder::new(self.registry, &self.options, heap, reader);
            decoder
                .decode(shape, target)
                .map(|()| decoder.allocated())
        };
        match decoded {
            Ok(nodes) => {
                tracing::debug!(nodes, "loaded value graph");
                Ok(())
            }
            Err(err) => {
                heap.truncate(start);
                Err(err)
            }
        }
    }

    fn finish(&self, reader: &mut TokenReader) -> Result<()> {
        if self.options.allow_trailing {
            return Ok(());
        }
        let next = reader.peek()?;
        match next.token {
            graphjson_tokens::Token::Eof => Ok(()),
            _ => Err(MarshalError::TrailingData(next.pos)),
        }
    }
}
