//! Single-pass translation of tokens into quadruples.
//!
//! The translator is a recursive-descent parser that emits code as it recognizes each
//! production. There is no syntax tree, and no second pass: forward jumps are emitted
//! with pending targets and threaded into chains (see [`quad`]), which are resolved as soon
//! as the address they wait on is known.
//!
//! Every statement yields the chain of jumps that should go to "whatever comes after it".
//! - A statement sequence resolves each statement's chain to the start of the next statement.
//! - An `if` resolves its true-jump to the body, and merges its false-jump with the body's chain.
//! - A `while` resolves its body's chain (and a closing jump) to the loop test,
//!   and yields only its false-jump.
//! - The chain left by the whole program goes to the exit address, one past the last quadruple.

use std::fmt;

use thiserror::Error;

use crate::reader::{SyntaxClass, Token};

mod parser;
pub mod quad;


use parser::Translator;
pub use quad::{ArithOp, Chain, Dest, Op, QuadIndex, QuadTable, Quadruple, RelOp, Target};

/// What the translator was looking for when it found something else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    Class(SyntaxClass),
    Statement,
    Factor,
    EndOfInput,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Class(class) => write!(f, "{class}"),
            Expected::Statement => write!(f, "an assignment, 'if' or 'while' statement"),
            Expected::Factor => write!(f, "an identifier, number or '('"),
            Expected::EndOfInput => write!(f, "end of input"),
        }
    }
}

/// What the translator found instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Found {
    Token(Token),
    End,
}

impl From<Option<&Token>> for Found {
    fn from(value: Option<&Token>) -> Self {
        match value {
            Some(token) => Found::Token(token.clone()),
            None => Found::End,
        }
    }
}

impl fmt::Display for Found {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Found::Token(token) => write!(
                f,
                "{:?} at line {}, column {}",
                token.value, token.line, token.column
            ),
            Found::End => write!(f, "end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("syntax error: expected {expected}, found {found}")]
    UnexpectedToken { expected: Expected, found: Found },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    #[error("condition needs a relational operator, found {found}")]
    InvalidRelationalOperator { found: Found },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Semantic(#[from] SemanticError),
    #[error("program needs more than {limit} quadruples")]
    CapacityExceeded { limit: usize },
    #[error("blocks and parentheses nest deeper than {limit} levels, at {found}")]
    NestingTooDeep { limit: usize, found: Found },
    #[error("internal error: quadruple {index} is not a pending jump")]
    BrokenChain { index: QuadIndex },
    #[error("internal error: jump at quadruple {index} was never resolved")]
    Unresolved { index: QuadIndex },
}

pub type TranslateResult<T> = Result<T, TranslateError>;

/// Default bound on nested blocks and parentheses.
pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslateOptions {
    /// Most quadruples a program may produce; unlimited if None.
    pub max_quads: Option<usize>,
    /// Most blocks and parenthesized expressions that may be open at once.
    /// `main`'s own block counts as one.
    pub max_depth: usize,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        TranslateOptions {
            max_quads: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// The output of a translation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    table: QuadTable,
    temporaries: usize,
}

impl Translation {
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn quads(&self) -> &[Quadruple] {
        self.table.as_slice()
    }

    pub fn get(&self, index: QuadIndex) -> Option<&Quadruple> {
        self.table.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuadIndex, &Quadruple)> + '_ {
        self.table.iter()
    }

    /// The address just past the last quadruple, where control leaves the program.
    pub fn exit(&self) -> QuadIndex {
        self.table.next_index()
    }

    /// How many temporaries (T1, T2, ...) were generated.
    pub fn temporaries(&self) -> usize {
        self.temporaries
    }
}

/// Translate a token sequence with the default (growable) table.
pub fn translate(tokens: &[Token]) -> TranslateResult<Translation> {
    translate_with(tokens, TranslateOptions::default())
}

pub fn translate_with(tokens: &[Token], options: TranslateOptions) -> TranslateResult<Translation> {
    let table = match options.max_quads {
        Some(limit) => QuadTable::with_limit(limit),
        None => QuadTable::new(),
    };
    let (table, temporaries) = Translator::new(tokens, table, options.max_depth).run()?;

    if let Some(index) = table.first_pending() {
        return Err(TranslateError::Unresolved { index });
    }
    tracing::debug!(
        "translated {} tokens into {} quadruples",
        tokens.len(),
        table.len()
    );
    Ok(Translation { table, temporaries })
}
