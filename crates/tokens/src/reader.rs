//! Pull tokenizer with grammar checking.
//!
//! Scans the same literal forms as a plain JSON decoder (strings with
//! escapes, `null`/`true`/`false`, integer and float numbers) but yields one
//! token at a time instead of building a tree. A small container stack tracks
//! where commas, colons and object keys are legal.

use std::io::{self, Read};

use crate::util::{decode_json_string, find_ending_quote};
use crate::{Position, Spanned, Token, TokenError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    First,
    AfterKey,
    AfterValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Array(Slot),
    Object(Slot),
}

pub struct TokenReader {
    data: Vec<u8>,
    x: usize,
    line: usize,
    line_start: usize,
    stack: Vec<Frame>,
    peeked: Option<Spanned>,
}

impl TokenReader {
    pub fn new(input: impl Into<Vec<u8>>) -> Self {
        Self {
            data: input.into(),
            x: 0,
            line: 1,
            line_start: 0,
            stack: Vec::new(),
            peeked: None,
        }
    }

    /// Reads the whole stream into memory and tokenizes it.
    pub fn from_reader<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Self::new(data))
    }

    /// Position of the next unread byte.
    pub fn position(&self) -> Position {
        match &self.peeked {
            Some(spanned) => spanned.pos,
            None => self.here(),
        }
    }

    /// Nesting depth of open arrays and objects.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn peek(&mut self) -> Result<&Spanned, TokenError> {
        if self.peeked.is_none() {
            let next = self.read_token()?;
            self.peeked = Some(next);
        }
        match &self.peeked {
            Some(spanned) => Ok(spanned),
            None => Err(TokenError::UnexpectedEof(self.here())),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Spanned, TokenError> {
        match self.peeked.take() {
            Some(spanned) => Ok(spanned),
            None => self.read_token(),
        }
    }

    fn here(&self) -> Position {
        Position::new(self.x, self.line, self.x - self.line_start + 1)
    }

    fn skip_whitespace(&mut self) {
        while self.x < self.data.len() {
            match self.data[self.x] {
                b' ' | b'\t' | b'\r' => self.x += 1,
                b'\n' => {
                    self.x += 1;
                    self.line += 1;
                    self.line_start = self.x;
                }
                _ => break,
            }
        }
    }

    fn current(&self) -> Option<u8> {
        self.data.get(self.x).copied()
    }

    fn unexpected(&self, expected: &'static str) -> TokenError {
        let pos = self.here();
        match self.data.get(self.x..) {
            Some(rest) if !rest.is_empty() => {
                let found = std::str::from_utf8(&rest[..rest.len().min(4)])
                    .ok()
                    .and_then(|s| s.chars().next())
                    .unwrap_or(char::from(rest[0]));
                TokenError::UnexpectedChar {
                    found,
                    expected,
                    pos,
                }
            }
            _ => TokenError::UnexpectedEof(pos),
        }
    }

    fn set_top(&mut self, slot: Slot) {
        if let Some(frame) = self.stack.last_mut() {
            *frame = match frame {
                Frame::Array(_) => Frame::Array(slot),
                Frame::Object(_) => Frame::Object(slot),
            };
        }
    }

    fn read_token(&mut self) -> Result<Spanned, TokenError> {
        self.skip_whitespace();
        match self.stack.last().copied() {
            None => {
                if self.x >= self.data.len() {
                    return Ok(Spanned {
                        token: Token::Eof,
                        pos: self.here(),
                    });
                }
                self.read_value()
            }
            Some(Frame::Array(slot)) => {
                if self.current() == Some(b']') {
                    return Ok(self.close(Token::ArrayEnd));
                }
                if slot == Slot::AfterValue {
                    self.expect_byte(b',', "',' or ']'")?;
                    self.skip_whitespace();
                }
                self.read_value()
            }
            Some(Frame::Object(slot)) => match slot {
                Slot::AfterKey => {
                    self.expect_byte(b':', "':'")?;
                    self.skip_whitespace();
                    self.read_value()
                }
                Slot::First | Slot::AfterValue => {
                    if self.current() == Some(b'}') {
                        return Ok(self.close(Token::ObjectEnd));
                    }
                    if slot == Slot::AfterValue {
                        self.expect_byte(b',', "',' or '}'")?;
                        self.skip_whitespace();
                    }
                    self.read_key()
                }
            },
        }
    }

    fn close(&mut self, token: Token) -> Spanned {
        let pos = self.here();
        self.x += 1;
        self.stack.pop();
        Spanned { token, pos }
    }

    fn expect_byte(&mut self, byte: u8, expected: &'static str) -> Result<(), TokenError> {
        if self.current() == Some(byte) {
            self.x += 1;
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn read_key(&mut self) -> Result<Spanned, TokenError> {
        if self.current() != Some(b'"') {
            return Err(self.unexpected("string key"));
        }
        let pos = self.here();
        let key = self.read_str()?;
        self.set_top(Slot::AfterKey);
        Ok(Spanned {
            token: Token::Str(key),
            pos,
        })
    }

    fn read_value(&mut self) -> Result<Spanned, TokenError> {
        let pos = self.here();
        let token = match self.current() {
            Some(b'[') => {
                self.x += 1;
                self.set_top(Slot::AfterValue);
                self.stack.push(Frame::Array(Slot::First));
                return Ok(Spanned {
                    token: Token::ArrayStart,
                    pos,
                });
            }
            Some(b'{') => {
                self.x += 1;
                self.set_top(Slot::AfterValue);
                self.stack.push(Frame::Object(Slot::First));
                return Ok(Spanned {
                    token: Token::ObjectStart,
                    pos,
                });
            }
            Some(b'"') => Token::Str(self.read_str()?),
            Some(b'n') => self.read_literal(b"null", Token::Null)?,
            Some(b't') => self.read_literal(b"true", Token::Bool(true))?,
            Some(b'f') => self.read_literal(b"false", Token::Bool(false))?,
            Some(c) if c.is_ascii_digit() || c == b'-' => self.read_num()?,
            _ => return Err(self.unexpected("value")),
        };
        self.set_top(Slot::AfterValue);
        Ok(Spanned { token, pos })
    }

    fn read_literal(&mut self, literal: &[u8], token: Token) -> Result<Token, TokenError> {
        let end = self.x + literal.len();
        if end > self.data.len() || &self.data[self.x..end] != literal {
            return Err(self.unexpected("value"));
        }
        self.x = end;
        Ok(token)
    }

    fn read_str(&mut self) -> Result<String, TokenError> {
        let pos = self.here();
        let x0 = self.x + 1;
        let x1 = find_ending_quote(&self.data, x0).ok_or(TokenError::UnexpectedEof(pos))?;
        let s = decode_json_string(&self.data[x0..x1])
            .map_err(|reason| TokenError::InvalidString { reason, pos })?;
        self.x = x1 + 1;
        Ok(s)
    }

    fn read_num(&mut self) -> Result<Token, TokenError> {
        let pos = self.here();
        let data = &self.data;
        let len = data.len();
        let start = self.x;
        let mut x = start;

        let digits = |mut x: usize| {
            let from = x;
            while x < len && data[x].is_ascii_digit() {
                x += 1;
            }
            (x, x - from)
        };

        if data[x] == b'-' {
            x += 1;
        }
        let (after_int, int_digits) = digits(x);
        if int_digits == 0 || (int_digits > 1 && data[x] == b'0') {
            return Err(TokenError::InvalidNumber(pos));
        }
        x = after_int;
        let mut is_float = false;
        if x < len && data[x] == b'.' {
            is_float = true;
            let (after, n) = digits(x + 1);
            if n == 0 {
                return Err(TokenError::InvalidNumber(pos));
            }
            x = after;
        }
        if x < len && (data[x] == b'e' || data[x] == b'E') {
            is_float = true;
            x += 1;
            if x < len && (data[x] == b'+' || data[x] == b'-') {
                x += 1;
            }
            let (after, n) = digits(x);
            if n == 0 {
                return Err(TokenError::InvalidNumber(pos));
            }
            x = after;
        }

        let s = std::str::from_utf8(&data[start..x]).map_err(|_| TokenError::InvalidNumber(pos))?;
        let token = if is_float {
            Token::Float(s.parse().map_err(|_| TokenError::InvalidNumber(pos))?)
        } else if let Ok(i) = s.parse::<i64>() {
            Token::Integer(i)
        } else if let Ok(u) = s.parse::<u64>() {
            Token::UInteger(u)
        } else {
            return Err(TokenError::InvalidNumber(pos));
        };
        self.x = x;
        Ok(token)
    }
}
