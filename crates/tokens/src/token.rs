use std::fmt;

/// Location of a token in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Byte offset from the start of the input.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, counted in bytes.
    pub column: usize,
}

impl Position {
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Null,
    Bool(bool),
    /// Integer literal that fits in `i64`.
    Integer(i64),
    /// Integer literal above `i64::MAX`.
    UInteger(u64),
    Float(f64),
    Str(String),
    ArrayStart,
    ArrayEnd,
    ObjectStart,
    ObjectEnd,
    Eof,
}

impl Token {
    /// Short description used in diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            Token::Null => "null",
            Token::Bool(_) => "boolean",
            Token::Integer(_) | Token::UInteger(_) => "integer",
            Token::Float(_) => "float",
            Token::Str(_) => "string",
            Token::ArrayStart => "'['",
            Token::ArrayEnd => "']'",
            Token::ObjectStart => "'{'",
            Token::ObjectEnd => "'}'",
            Token::Eof => "end of input",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Bool(b) => write!(f, "{b}"),
            Token::Integer(i) => write!(f, "{i}"),
            Token::UInteger(u) => write!(f, "{u}"),
            Token::Float(x) => write!(f, "{x:?}"),
            Token::Str(s) => write!(f, "{s:?}"),
            other => f.write_str(other.describe()),
        }
    }
}

/// A token together with the position of its first byte.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub pos: Position,
}
