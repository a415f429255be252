//! Error types for the core pipeline.
//!
//! Parse and verification errors are ordinary values: the grader turns them
//! into per-step results instead of aborting a request. Only [`GradeError`]
//! rejects a whole submission.

use thiserror::Error;

/// Why a line could not be turned into an [`Equation`](crate::equation::Equation).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("not an equation: no '=' found")]
    NotAnEquation,

    #[error("empty expression")]
    Empty,

    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unknown identifier '{ch}' at position {pos}")]
    UnknownIdentifier { ch: char, pos: usize },

    #[error("unexpected {found} at position {pos}")]
    UnexpectedToken { found: String, pos: usize },

    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("missing closing parenthesis for '(' at position {pos}")]
    UnclosedParen { pos: usize },

    #[error("invalid number '{text}'")]
    InvalidNumber { text: String },
}

/// Problems with a configured variable alphabet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlphabetError {
    #[error("alphabet must contain at least one symbol")]
    Empty,

    #[error("invalid symbol '{0}': symbols must be single ASCII letters")]
    InvalidSymbol(String),
}

/// A substitution check that could not be decided.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("could not evaluate '{expr}' at any sample point")]
    Indeterminate { expr: String },
}

/// Preconditions that reject a grading request outright.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GradeError {
    #[error("could not understand the correct answer as an equation: {0}")]
    UnparseableAnswer(ParseError),

    #[error("could not determine the principal unknown of the problem")]
    NoPrincipalUnknown,

    #[error("could not parse equation: {0}")]
    UnparseableEquation(ParseError),

    #[error("variable '{0}' is not in the configured alphabet")]
    UnknownVariable(String),
}
