//! Support for reading source programs into tokens.

use std::io::ErrorKind;

use thiserror::Error;

mod token;

pub use token::{tokenize, SyntaxClass, Token};

/// Error type if tokenizing does not complete.
///
/// Tokenizing is fail-fast: the first character that cannot start (or continue) a token
/// stops the scan. Both kinds carry the 1-based position of the offending character.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexicalError {
    #[error("unexpected character {found:?} at line {line}, column {column}")]
    UnexpectedCharacter {
        found: char,
        line: usize,
        column: usize,
    },
    #[error("malformed number {text:?}: extra decimal point at line {line}, column {column}")]
    MalformedNumber {
        text: String,
        line: usize,
        column: usize,
    },
}

impl LexicalError {
    /// The (line, column) of the character that stopped the scan.
    pub fn position(&self) -> (usize, usize) {
        match self {
            LexicalError::UnexpectedCharacter { line, column, .. }
            | LexicalError::MalformedNumber { line, column, .. } => (*line, *column),
        }
    }
}

/// The main result type for this module.
pub type LexResult<T> = Result<T, LexicalError>;

impl From<LexicalError> for std::io::Error {
    fn from(value: LexicalError) -> Self {
        std::io::Error::new(ErrorKind::InvalidInput, value)
    }
}
