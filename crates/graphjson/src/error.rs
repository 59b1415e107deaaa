use graphjson_tokens::{Position, TokenError};
use thiserror::Error;

use crate::NodeId;

/// Design-level error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed text, or a token of the wrong kind for the target value.
    Parse,
    /// An enumeration name that the target enumeration does not declare.
    UnknownMember,
    /// The descriptor and the in-memory value disagree.
    Shape,
    Io,
}

#[derive(Debug, Error)]
pub enum MarshalError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("expected {expected}, found {found} at {pos}")]
    Unexpected {
        expected: String,
        found: String,
        pos: Position,
    },

    #[error("{what} out of range at {pos}")]
    OutOfRange { what: String, pos: Position },

    #[error("no such member {name:?} in enumeration {enumeration} at {pos}")]
    NoSuchMember {
        enumeration: String,
        name: String,
        pos: Position,
    },

    #[error("no such field {name:?} in record {record} at {pos}")]
    NoSuchField {
        record: String,
        name: String,
        pos: Position,
    },

    #[error("reference to unallocated identity {id} at {pos}")]
    DanglingRef { id: u64, pos: Position },

    #[error("identity {id} allocated twice at {pos}")]
    DuplicateIdentity { id: u64, pos: Position },

    #[error("trailing data at {0}")]
    TrailingData(Position),

    #[error("nesting deeper than {limit} at {pos}")]
    TooDeep { limit: usize, pos: Position },

    #[error("unknown shape {0:?}")]
    UnknownShape(String),

    #[error("value does not match shape: expected {expected}, found {found}")]
    ShapeMismatch { expected: String, found: String },

    #[error("record {record} is missing field {field:?}")]
    MissingField { record: String, field: String },

    #[error("reference to {0:?} which is not in the heap")]
    InvalidNode(NodeId),

    #[error("failed to escape string: {0}")]
    Escape(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MarshalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MarshalError::Token(_)
            | MarshalError::Unexpected { .. }
            | MarshalError::OutOfRange { .. }
            | MarshalError::NoSuchField { .. }
            | MarshalError::DanglingRef { .. }
            | MarshalError::DuplicateIdentity { .. }
            | MarshalError::TrailingData(_)
            | MarshalError::TooDeep { .. } => ErrorKind::Parse,
            MarshalError::NoSuchMember { .. } => ErrorKind::UnknownMember,
            MarshalError::UnknownShape(_)
            | MarshalError::ShapeMismatch { .. }
            | MarshalError::MissingField { .. }
            | MarshalError::InvalidNode(_)
            | MarshalError::Escape(_) => ErrorKind::Shape,
            MarshalError::Io(_) => ErrorKind::Io,
        }
    }

    /// Where in the input the error was detected, for errors raised while
    /// reading text.
    pub fn position(&self) -> Option<Position> {
        match self {
            MarshalError::Token(err) => Some(err.position()),
            MarshalError::Unexpected { pos, .. }
            | MarshalError::OutOfRange { pos, .. }
            | MarshalError::NoSuchMember { pos, .. }
            | MarshalError::NoSuchField { pos, .. }
            | MarshalError::DanglingRef { pos, .. }
            | MarshalError::DuplicateIdentity { pos, .. }
            | MarshalError::TooDeep { pos, .. } => Some(*pos),
            MarshalError::TrailingData(pos) => Some(*pos),
            _ => None,
        }
    }

    pub(crate) fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        MarshalError::ShapeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}

pub type Result<T, E = MarshalError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_failures_are_shape_errors() {
        let source = serde_json::from_str::<String>("1").unwrap_err();
        let err = MarshalError::from(source);
        assert!(matches!(err, MarshalError::Escape(_)));
        assert_eq!(err.kind(), ErrorKind::Shape);
        assert!(err.position().is_none());
    }
}
