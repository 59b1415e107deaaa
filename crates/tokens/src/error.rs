use thiserror::Error;

use crate::Position;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TokenError {
    #[error("unexpected end of input at {0}")]
    UnexpectedEof(Position),
    #[error("unexpected character {found:?} at {pos}, expected {expected}")]
    UnexpectedChar {
        found: char,
        expected: &'static str,
        pos: Position,
    },
    #[error("invalid number literal at {0}")]
    InvalidNumber(Position),
    #[error("invalid string literal at {pos}: {reason}")]
    InvalidString { reason: String, pos: Position },
}

impl TokenError {
    pub fn position(&self) -> Position {
        match self {
            TokenError::UnexpectedEof(pos) | TokenError::InvalidNumber(pos) => *pos,
            TokenError::UnexpectedChar { pos, .. } | TokenError::InvalidString { pos, .. } => *pos,
        }
    }
}
