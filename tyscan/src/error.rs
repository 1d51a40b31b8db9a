//! The error taxonomy for schema-directed parsing (§7 of the design).
//!
//! Every structural error carries the `(line, column)` at which it was
//! detected. Conversion and type-level errors additionally carry the
//! offending lexeme or type description.

use charsrc::Position;

use crate::types::ExpectedType;

pub type Result<T> = std::result::Result<T, Error>;

/// All ways a parse can fail. None are recoverable: a parse that returns
/// `Err` has abandoned the document.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("empty document")]
    EmptyDocument,

    #[error("unexpected end of input at {0}")]
    UnexpectedEof(Position),

    #[error("unexpected character {found:?} at {position}, expected {expected}")]
    UnexpectedChar {
        found: char,
        expected: &'static str,
        position: Position,
    },

    #[error("invalid escape sequence '\\{0}' at {1}")]
    BadEscape(char, Position),

    #[error("invalid \\u hex escape at {0}")]
    BadHexEscape(Position),

    #[error("field '{wire_name}' is not declared on {expected:?} and projection is off (at {position})")]
    UndefinedField {
        wire_name: String,
        expected: ExpectedType,
        position: Position,
    },

    #[error("required field '{field_name}' is missing (object closed at {position})")]
    RequiredFieldMissing {
        field_name: String,
        position: Position,
    },

    #[error("closed array/tuple received more than {declared_size} elements and projection is off (at {position})")]
    ArrayTooLong {
        declared_size: usize,
        position: Position,
    },

    #[error("lexeme {lexeme:?} does not fit expected type {expected:?} (at {position})")]
    ConversionFailure {
        lexeme: String,
        expected: ExpectedType,
        position: Position,
    },

    #[error("expected type is not supported here: {reason} (at {position})")]
    UnsupportedType {
        reason: String,
        position: Position,
    },

    #[error("I/O failure: {0}")]
    IoFailure(#[from] charsrc::Error),

    #[error("trailing content after the root value at {0}")]
    TrailingContent(Position),

    #[error("parser context stack is empty, internal invariant violated at {0}")]
    InternalError(Position, &'static str),
}

impl Error {
    #[must_use]
    pub fn position(&self) -> Option<Position> {
        match self {
            Error::EmptyDocument => None,
            Error::UnexpectedEof(p)
            | Error::UnexpectedChar { position: p, .. }
            | Error::BadEscape(_, p)
            | Error::BadHexEscape(p)
            | Error::UndefinedField { position: p, .. }
            | Error::RequiredFieldMissing { position: p, .. }
            | Error::ArrayTooLong { position: p, .. }
            | Error::ConversionFailure { position: p, .. }
            | Error::UnsupportedType { position: p, .. }
            | Error::TrailingContent(p)
            | Error::InternalError(p, _) => Some(*p),
            Error::IoFailure(e) => Some(e.position),
        }
    }
}
