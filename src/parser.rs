//! Recursive descent parser driving the [`Lexer`] to build a [`Value`]
//! tree (spec §4.2).

use crate::error::{Error, ErrorKind};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::value::{Object, Value};

/// Tunable limits for [`Parser`] (spec §4.2, §4.8).
#[derive(Debug, Clone, Copy)]
pub struct ParserConfig {
    /// Maximum combined object+array nesting depth. Exceeding it raises
    /// [`ErrorKind::StackOverflow`].
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self { max_depth: 1000 }
    }
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    depth: usize,
    config: ParserConfig,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a [u8]) -> Result<Self, Error> {
        Self::with_config(input, ParserConfig::default())
    }

    pub fn with_config(input: &'a [u8], config: ParserConfig) -> Result<Self, Error> {
        let mut lexer = Lexer::new(input)?;
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            depth: 0,
            config,
        })
    }

    /// Parse exactly one top-level value and reject trailing non-whitespace
    /// input (spec §4.2, "extra data").
    pub fn parse(&mut self) -> Result<Value, Error> {
        let value = self.parse_value()?;
        if self.current.kind != TokenKind::Eof {
            return Err(Error::at(
                ErrorKind::UnexpectedToken,
                format!("unexpected trailing token {:?}", self.current.kind),
                self.current.line,
                self.current.column,
            ));
        }
        Ok(value)
    }

    fn bump(&mut self) -> Result<Token, Error> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn enter(&mut self) -> Result<(), Error> {
        if self.depth >= self.config.max_depth {
            return Err(Error::at(
                ErrorKind::StackOverflow,
                format!("nesting exceeds the configured limit of {}", self.config.max_depth),
                self.current.line,
                self.current.column,
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn exit(&mut self) {
        self.depth -= 1;
    }

    fn parse_value(&mut self) -> Result<Value, Error> {
        match &self.current.kind {
            TokenKind::LBrace => self.parse_object(),
            TokenKind::LBracket => self.parse_array(),
            TokenKind::String(_) => match self.bump()?.kind {
                TokenKind::String(s) => Ok(Value::String(s)),
                _ => unreachable!(),
            },
            TokenKind::Number(_) => match self.bump()?.kind {
                TokenKind::Number(n) => Ok(Value::Number(n)),
                _ => unreachable!(),
            },
            TokenKind::True => {
                self.bump()?;
                Ok(Value::Bool(true))
            }
            TokenKind::False => {
                self.bump()?;
                Ok(Value::Bool(false))
            }
            TokenKind::Null => {
                self.bump()?;
                Ok(Value::Null)
            }
            TokenKind::Eof => Err(Error::at(
                ErrorKind::UnexpectedEof,
                "unexpected end of input",
                self.current.line,
                self.current.column,
            )),
            other => Err(Error::at(
                ErrorKind::UnexpectedToken,
                format!("unexpected token {other:?}"),
                self.current.line,
                self.current.column,
            )),
        }
    }

    /// `parse_object` and `parse_array` increment/decrement `self.depth`
    /// around a body method so the counter unwinds symmetrically even on
    /// error (spec §4.2: "Depth decrements symmetrically on exit regardless
    /// of error").
    fn parse_object(&mut self) -> Result<Value, Error> {
        self.enter()?;
        let result = self.parse_object_body();
        self.exit();
        result
    }

    fn parse_object_body(&mut self) -> Result<Value, Error> {
        self.bump()?; // '{'
        let mut object = Object::new();
        if self.current.kind == TokenKind::RBrace {
            self.bump()?;
            return Ok(Value::Object(object));
        }
        loop {
            let key = self.expect_key()?;
            self.expect(TokenKind::Colon)?;
            let value = self.parse_value()?;
            // Duplicate key: the later value replaces the earlier one and
            // the earlier one is dropped here, with no error (spec §4.2).
            object.set(key, value);

            match &self.current.kind {
                TokenKind::Comma => {
                    self.bump()?;
                }
                TokenKind::RBrace => {
                    self.bump()?;
                    break;
                }
                other => {
                    return Err(Error::at(
                        ErrorKind::UnexpectedToken,
                        format!("expected ',' or '}}', found {other:?}"),
                        self.current.line,
                        self.current.column,
                    ));
                }
            }
        }
        Ok(Value::Object(object))
    }

    fn parse_array(&mut self) -> Result<Value, Error> {
        self.enter()?;
        let result = self.parse_array_body();
        self.exit();
        result
    }

    fn parse_array_body(&mut self) -> Result<Value, Error> {
        self.bump()?; // '['
        let mut items = Vec::new();
        if self.current.kind == TokenKind::RBracket {
            self.bump()?;
            return Ok(Value::Array(items));
        }
        loop {
            items.push(self.parse_value()?);
            match &self.current.kind {
                TokenKind::Comma => {
                    self.bump()?;
                }
                TokenKind::RBracket => {
                    self.bump()?;
                    break;
                }
                other => {
                    return Err(Error::at(
                        ErrorKind::UnexpectedToken,
                        format!("expected ',' or ']', found {other:?}"),
                        self.current.line,
                        self.current.column,
                    ));
                }
            }
        }
        Ok(Value::Array(items))
    }

    fn expect_key(&mut self) -> Result<String, Error> {
        match &self.current.kind {
            TokenKind::String(_) => match self.bump()?.kind {
                TokenKind::String(s) => Ok(s),
                _ => unreachable!(),
            },
            other => Err(Error::at(
                ErrorKind::UnexpectedToken,
                format!("expected an object key string, found {other:?}"),
                self.current.line,
                self.current.column,
            )),
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), Error> {
        if self.current.kind == kind {
            self.bump()?;
            Ok(())
        } else {
            Err(Error::at(
                ErrorKind::UnexpectedToken,
                format!("expected {kind:?}, found {:?}", self.current.kind),
                self.current.line,
                self.current.column,
            ))
        }
    }
}

pub fn parse(input: &[u8]) -> Result<Value, Error> {
    parse_with_config(input, ParserConfig::default())
}

/// Records the error in the per-thread "last error" cell (spec §4.7, §5)
/// before returning it, in addition to the ordinary `Result`.
pub fn parse_with_config(input: &[u8], config: ParserConfig) -> Result<Value, Error> {
    Parser::with_config(input, config)
        .and_then(|mut parser| parser.parse())
        .map_err(Error::record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_four_pair_example() {
        let value = parse(br#"{"name":"Test","value":123,"active":true,"data":null}"#).unwrap();
        let object = value.as_object().unwrap();
        let keys: Vec<_> = object.keys().collect();
        assert_eq!(keys, vec!["name", "value", "active", "data"]);
        assert_eq!(object.get("name"), Some(&Value::String("Test".into())));
        assert_eq!(object.get("value"), Some(&Value::Number(123.0)));
        assert_eq!(object.get("active"), Some(&Value::Bool(true)));
        assert_eq!(object.get("data"), Some(&Value::Null));
    }

    #[test]
    fn duplicate_key_keeps_last_value() {
        let value = parse(br#"{"a":1,"a":2}"#).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert_eq!(object.get("a"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn trailing_whitespace_is_fine_trailing_garbage_is_not() {
        assert!(parse(b"{\"a\":1} ").is_ok());
        let err = parse(b"{\"a\":1}garbage").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedToken);
    }

    #[test]
    fn nesting_beyond_the_limit_overflows() {
        let deep = "[".repeat(5) + &"]".repeat(5);
        let config = ParserConfig { max_depth: 3 };
        let err = parse_with_config(deep.as_bytes(), config).unwrap_err();
        assert_eq!(err.kind, ErrorKind::StackOverflow);
    }

    #[test]
    fn array_of_objects_round_trips_structurally() {
        let value = parse(br#"[{"id":0,"v":0},{"id":1,"v":10}]"#).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[1].as_object().unwrap().get("v"),
            Some(&Value::Number(10.0))
        );
    }
}
