//! Token source for graphjson documents.
//!
//! [`TokenReader`] turns a byte buffer into a stream of typed [`Token`]s,
//! each tagged with the [`Position`] where it starts. Commas and colons are
//! checked by the reader and never reach the caller, so a consumer only has
//! to reason about values and container boundaries.

mod error;
mod reader;
mod token;
mod util;

pub use error::TokenError;
pub use reader::TokenReader;
pub use token::{Position, Spanned, Token};
pub use util::{decode_json_string, find_ending_quote};
