use std::cell::RefCell;
use std::fmt::{self, Display, Formatter};

use crate::position::Position;

/// Stable error codes. Part of the external ABI: peripheral codecs may add
/// variants without breaking this crate, hence `#[non_exhaustive]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    InvalidSyntax,
    UnexpectedToken,
    UnterminatedString,
    InvalidNumber,
    LeadingZero,
    NumberOutOfRange,
    InvalidEscape,
    InvalidSurrogate,
    InvalidUtf8,
    InvalidWhitespace,
    UnexpectedEof,
    StackOverflow,
    OutOfMemory,
    InvalidType,
    KeyNotFound,
    IndexOutOfBounds,
    ConversionFailed,
    FileNotFound,
    FileReadError,
    FileWriteError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::InvalidSyntax => "INVALID_SYNTAX",
            ErrorKind::UnexpectedToken => "UNEXPECTED_TOKEN",
            ErrorKind::UnterminatedString => "UNTERMINATED_STRING",
            ErrorKind::InvalidNumber => "INVALID_NUMBER",
            ErrorKind::LeadingZero => "LEADING_ZERO",
            ErrorKind::NumberOutOfRange => "NUMBER_OUT_OF_RANGE",
            ErrorKind::InvalidEscape => "INVALID_ESCAPE",
            ErrorKind::InvalidSurrogate => "INVALID_SURROGATE",
            ErrorKind::InvalidUtf8 => "INVALID_UTF8",
            ErrorKind::InvalidWhitespace => "INVALID_WHITESPACE",
            ErrorKind::UnexpectedEof => "UNEXPECTED_EOF",
            ErrorKind::StackOverflow => "STACK_OVERFLOW",
            ErrorKind::OutOfMemory => "OUT_OF_MEMORY",
            ErrorKind::InvalidType => "INVALID_TYPE",
            ErrorKind::KeyNotFound => "KEY_NOT_FOUND",
            ErrorKind::IndexOutOfBounds => "INDEX_OUT_OF_BOUNDS",
            ErrorKind::ConversionFailed => "CONVERSION_FAILED",
            ErrorKind::FileNotFound => "FILE_NOT_FOUND",
            ErrorKind::FileReadError => "FILE_READ_ERROR",
            ErrorKind::FileWriteError => "FILE_WRITE_ERROR",
        };
        f.write_str(label)
    }
}

/// A diagnostic raised by any codec or tree-algebra operation.
///
/// `line`/`column` are 0 for errors with no meaningful source position
/// (e.g. `INVALID_TYPE` from a tree-algebra call).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: 0,
            column: 0,
        }
    }

    pub fn at(kind: ErrorKind, message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            message: message.into(),
            line,
            column,
        }
    }

    /// The error's source position as a [`Position`], for callers that want
    /// it as a single value rather than two fields.
    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Record this error in the per-thread "last error" cell and return it.
    ///
    /// A per-thread diagnostic channel rather than a process-wide one, so
    /// concurrent callers operating on independent trees stay correct.
    pub fn record(self) -> Self {
        LAST_ERROR.with(|cell| *cell.borrow_mut() = Some(self.clone()));
        self
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.line == 0 && self.column == 0 {
            write!(f, "{}: {}", self.kind, self.message)
        } else {
            write!(
                f,
                "{}: {} ({}:{})",
                self.kind, self.message, self.line, self.column
            )
        }
    }
}

impl std::error::Error for Error {}

thread_local! {
    static LAST_ERROR: RefCell<Option<Error>> = RefCell::new(None);
}

/// Read back the last error recorded on this thread via [`Error::record`].
///
/// Convenience accessor only — every fallible operation in this crate also
/// returns its error through a normal `Result`.
pub fn last_error() -> Option<Error> {
    LAST_ERROR.with(|cell| cell.borrow().clone())
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_without_position() {
        let err = Error::new(ErrorKind::InvalidType, "expected object");
        assert_eq!(format!("{err}"), "INVALID_TYPE: expected object");
    }

    #[test]
    fn display_with_position() {
        let err = Error::at(ErrorKind::UnexpectedToken, "extra data", 3, 5);
        assert_eq!(format!("{err}"), "UNEXPECTED_TOKEN: extra data (3:5)");
    }

    #[test]
    fn position_combines_line_and_column() {
        let err = Error::at(ErrorKind::InvalidNumber, "bad number", 7, 2);
        assert_eq!(err.position(), Position::new(7, 2));
    }

    #[test]
    fn last_error_round_trips_per_thread() {
        assert!(last_error().is_none());
        let err = Error::new(ErrorKind::KeyNotFound, "missing key").record();
        assert_eq!(last_error(), Some(err));
    }
}
