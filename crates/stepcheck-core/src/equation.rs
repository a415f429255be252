//! Equations and parsed student steps.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::alphabet::{Alphabet, Symbol};
use crate::error::ParseError;
use crate::expr::Expr;
use crate::normalize::normalize;
use crate::parser::parse_expression;

/// `lhs = rhs`, with both sides already simplified by the expression constructors.
#[derive(Debug, Clone, PartialEq)]
pub struct Equation {
    pub lhs: Expr,
    pub rhs: Expr,
}

impl Equation {
    pub fn new(lhs: Expr, rhs: Expr) -> Self {
        Self { lhs, rhs }
    }

    /// Free symbols of both sides, left side first, in order of appearance.
    pub fn free_symbols(&self) -> Vec<Symbol> {
        let mut out = Vec::new();
        self.lhs.collect_symbols(&mut out);
        self.rhs.collect_symbols(&mut out);
        out
    }

    /// `lhs - rhs`, zero exactly on the solution set.
    pub fn residual(&self) -> Expr {
        Expr::sub(self.lhs.clone(), self.rhs.clone())
    }

    pub fn substitute(&self, sym: Symbol, value: &Expr) -> Equation {
        Equation {
            lhs: self.lhs.substitute(sym, value),
            rhs: self.rhs.substitute(sym, value),
        }
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.lhs, self.rhs)
    }
}

/// A line that failed to parse, kept with its original text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseFailure {
    pub source: String,
    pub reason: String,
}

/// Outcome of parsing one line of student work.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedStep {
    Equation(Equation),
    Failure(ParseFailure),
}

impl ParsedStep {
    pub fn as_equation(&self) -> Option<&Equation> {
        match self {
            ParsedStep::Equation(eq) => Some(eq),
            ParsedStep::Failure(_) => None,
        }
    }
}

/// Parse one raw line into an equation.
///
/// The line is [normalized](normalize) first and split at its first `=`;
/// anything after a second `=` belongs to the right side and fails to parse
/// there.
pub fn try_parse_equation(raw: &str, alphabet: &Alphabet) -> Result<Equation, ParseError> {
    let normalized = normalize(raw);
    let (left, right) = normalized
        .split_once('=')
        .ok_or(ParseError::NotAnEquation)?;
    let lhs = parse_expression(left, alphabet)?;
    let rhs = parse_expression(right, alphabet)?;
    Ok(Equation { lhs, rhs })
}

/// Parse one raw line, folding any error into a [`ParsedStep::Failure`].
pub fn parse_equation(raw: &str, alphabet: &Alphabet) -> ParsedStep {
    match try_parse_equation(raw, alphabet) {
        Ok(eq) => ParsedStep::Equation(eq),
        Err(err) => {
            tracing::debug!(line = raw, error = %err, "step failed to parse");
            ParsedStep::Failure(ParseFailure {
                source: raw.to_string(),
                reason: err.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Symbol {
        Symbol::new('x').unwrap()
    }

    #[test]
    fn test_parse_simple_equation() {
        let eq = try_parse_equation("2x + 3 = 7", &Alphabet::default()).unwrap();
        assert_eq!(eq.rhs, Expr::int(7));
        assert_eq!(eq.free_symbols(), vec![x()]);
        assert_eq!(eq.to_string(), "2*x + 3 = 7");
    }

    #[test]
    fn test_caret_power() {
        let eq = try_parse_equation("x^2 = 4", &Alphabet::default()).unwrap();
        assert_eq!(eq.lhs, Expr::pow(Expr::Sym(x()), Expr::int(2)));
    }

    #[test]
    fn test_missing_equals() {
        assert_eq!(
            try_parse_equation("2x + 3", &Alphabet::default()),
            Err(ParseError::NotAnEquation)
        );
    }

    #[test]
    fn test_empty_side() {
        assert_eq!(
            try_parse_equation("= 5", &Alphabet::default()),
            Err(ParseError::Empty)
        );
        assert_eq!(
            try_parse_equation("x =", &Alphabet::default()),
            Err(ParseError::Empty)
        );
    }

    #[test]
    fn test_second_equals_fails() {
        assert!(matches!(
            try_parse_equation("x = 2 = 2", &Alphabet::default()),
            Err(ParseError::UnexpectedChar { ch: '=', .. })
        ));
    }

    #[test]
    fn test_failure_keeps_source() {
        match parse_equation("garbled", &Alphabet::default()) {
            ParsedStep::Failure(f) => {
                assert_eq!(f.source, "garbled");
                assert!(!f.reason.is_empty());
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_residual_and_substitute() {
        let eq = try_parse_equation("2x + 3 = 7", &Alphabet::default()).unwrap();
        let at_two = eq.substitute(x(), &Expr::int(2));
        assert_eq!(at_two.residual(), Expr::zero());
    }
}
