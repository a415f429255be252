//! Variable symbols and the closed alphabet they are drawn from.
//!
//! Only single letters are recognized as variables. The set is supplied by
//! configuration so it can be extended without touching the parser.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AlphabetError;

/// The symbols recognized when no alphabet is configured.
pub const DEFAULT_SYMBOLS: [char; 18] = [
    'x', 'y', 'z', 'a', 'b', 'c', 'v', 'u', 't', 'm', 'F', 'P', 'E', 'I', 'V', 'R', 'g', 's',
];

/// A single-letter variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(char);

impl Symbol {
    /// Create a symbol from an ASCII letter.
    pub fn new(ch: char) -> Result<Self, AlphabetError> {
        if ch.is_ascii_alphabetic() {
            Ok(Symbol(ch))
        } else {
            Err(AlphabetError::InvalidSymbol(ch.to_string()))
        }
    }

    pub fn as_char(self) -> char {
        self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered, duplicate-free set of recognized symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<Symbol>,
}

impl Alphabet {
    /// Build an alphabet from letters. Duplicates are dropped, order kept.
    pub fn new<I>(letters: I) -> Result<Self, AlphabetError>
    where
        I: IntoIterator<Item = char>,
    {
        let mut symbols: Vec<Symbol> = Vec::new();
        for ch in letters {
            let sym = Symbol::new(ch)?;
            if !symbols.contains(&sym) {
                symbols.push(sym);
            }
        }
        if symbols.is_empty() {
            return Err(AlphabetError::Empty);
        }
        Ok(Self { symbols })
    }

    /// Build an alphabet from configuration strings, each a single letter.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, AlphabetError> {
        let mut letters = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref().trim();
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => letters.push(ch),
                _ => return Err(AlphabetError::InvalidSymbol(name.to_string())),
            }
        }
        Self::new(letters)
    }

    pub fn lookup(&self, ch: char) -> Option<Symbol> {
        self.symbols.iter().copied().find(|s| s.as_char() == ch)
    }

    pub fn contains(&self, ch: char) -> bool {
        self.lookup(ch).is_some()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_SYMBOLS.iter().map(|&c| Symbol(c)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_alphabet() {
        let a = Alphabet::default();
        assert_eq!(a.symbols().len(), 18);
        assert!(a.contains('x'));
        assert!(a.contains('F'));
        assert!(!a.contains('w'));
        assert!(!a.contains('e'));
    }

    #[test]
    fn test_from_names() {
        let a = Alphabet::from_names(&["p", "q", "p"]).unwrap();
        assert_eq!(a.symbols().len(), 2);
        assert_eq!(a.lookup('q').map(Symbol::as_char), Some('q'));
    }

    #[test]
    fn test_rejects_multi_letter_names() {
        assert_eq!(
            Alphabet::from_names(&["theta"]),
            Err(AlphabetError::InvalidSymbol("theta".to_string()))
        );
    }

    #[test]
    fn test_rejects_empty_and_non_letters() {
        let none: [&str; 0] = [];
        assert_eq!(Alphabet::from_names(&none), Err(AlphabetError::Empty));
        assert!(Alphabet::new(['1']).is_err());
    }
}
