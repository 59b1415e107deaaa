//! Text output buffer for graphjson.
//!
//! The encoder never talks to an I/O stream directly: it appends text
//! fragments to a [`Writer`] and the caller flushes the result wherever it
//! needs to go.

mod writer;

pub use writer::Writer;
