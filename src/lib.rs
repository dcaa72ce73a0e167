//! Syntax-directed translation of a small procedural language into quadruples.
//!
//! A program is a single `main` block of assignments, `if` and `while` statements:
//!
//! ```
//! let translation = quadc::compile("main(){x=1+2*3;}", Default::default()).unwrap();
//! let text: Vec<String> = translation.quads().iter().map(|q| q.to_string()).collect();
//! assert_eq!(text, ["(*, 2, 3, T1)", "(+, 1, T1, T2)", "(=, T2, , x)"]);
//! ```

use std::io::ErrorKind;

use thiserror::Error;

pub mod reader;

pub mod translate;

#[cfg(feature = "render")]
pub mod render;

#[cfg(feature = "web")]
pub mod web;

pub use reader::{tokenize, LexicalError, SyntaxClass, Token};
pub use translate::{translate, translate_with, TranslateError, TranslateOptions, Translation};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lexical(#[from] LexicalError),
    #[error(transparent)]
    Translate(#[from] TranslateError),
}

/// Tokenize and translate the source text.
pub fn compile(source: &str, options: TranslateOptions) -> Result<Translation, CompileError> {
    let tokens = tokenize(source)?;
    Ok(translate_with(&tokens, options)?)
}

impl From<CompileError> for std::io::Error {
    fn from(value: CompileError) -> Self {
        std::io::Error::new(ErrorKind::InvalidInput, value)
    }
}
