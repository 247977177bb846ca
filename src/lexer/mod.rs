//! Byte-level JSON tokenizer (spec §4.1).
//!
//! The lexer is hand-rolled: no regex crate backs it. A [`Lexer`] owns a
//! read cursor over a validated UTF-8 byte slice and produces one [`Token`]
//! at a time, tracking 1-based line and 0-based column as it goes.

mod cursor;

use crate::error::{Error, ErrorKind};
use crate::position::Position;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Colon,
    Comma,
    Null,
    True,
    False,
    String(String),
    Number(f64),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    position: Position,
}

impl<'a> Lexer<'a> {
    /// Validate `input` as UTF-8 (spec §6: "the encoder and lexer enforce
    /// this at ingress") and start a lexer over it.
    pub fn new(input: &'a [u8]) -> Result<Self, Error> {
        let src = std::str::from_utf8(input)
            .map_err(|_| Error::new(ErrorKind::InvalidUtf8, "input is not valid UTF-8"))?;
        Ok(Self {
            src,
            pos: 0,
            position: Position::START,
        })
    }

    pub fn line(&self) -> usize {
        self.position.line
    }

    pub fn column(&self) -> usize {
        self.position.column
    }

    /// Byte offset of the read cursor, used by the stream driver to resume
    /// lexing a buffer that grew since the last attempt.
    pub fn offset(&self) -> usize {
        self.pos
    }

    pub fn next_token(&mut self) -> Result<Token, Error> {
        self.skip_whitespace()?;
        let (line, column) = (self.position.line, self.position.column);

        let Some(byte) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                line,
                column,
            });
        };

        let kind = match byte {
            b'{' => {
                self.bump();
                TokenKind::LBrace
            }
            b'}' => {
                self.bump();
                TokenKind::RBrace
            }
            b'[' => {
                self.bump();
                TokenKind::LBracket
            }
            b']' => {
                self.bump();
                TokenKind::RBracket
            }
            b':' => {
                self.bump();
                TokenKind::Colon
            }
            b',' => {
                self.bump();
                TokenKind::Comma
            }
            b'"' => self.scan_string(line, column)?,
            b'-' | b'.' | b'0'..=b'9' => self.scan_number(line, column)?,
            b if b.is_ascii_alphabetic() => self.scan_keyword(line, column)?,
            other => {
                return Err(Error::at(
                    ErrorKind::UnexpectedToken,
                    format!("unexpected byte {:?}", other as char),
                    line,
                    column,
                ));
            }
        };

        Ok(Token { kind, line, column })
    }
}
