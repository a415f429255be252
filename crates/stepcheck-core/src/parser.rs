//! Expression parser with implicit multiplication, built from `nom`
//! combinators.
//!
//! Grammar (lowest to highest precedence):
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/') unary | implicit)*
//! unary  := ('+' | '-') unary | power
//! power  := atom ('**' unary)?
//! atom   := number | func '(' expr ')' | 'pi' | letter | '(' expr ')'
//! ```
//!
//! `**` is right associative and binds tighter than unary minus, so `-x**2`
//! is `-(x**2)`. An operand written directly after another one is
//! multiplied (`implicit`), which gives `2x` → `2*x`, `xy` → `x*y` and
//! `(x+1)(x-1)` → `(x+1)*(x-1)`; two numbers in a row are an error.
//! A run of letters is read one letter at a time unless it starts with a
//! function name followed by `(` or with `pi`; every single letter must
//! belong to the configured [`Alphabet`].
//!
//! Errors carry character positions within the parsed text.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, one_of, satisfy},
    combinator::{cut, map, not, opt, peek, recognize, value},
    error::{ErrorKind, ParseError as NomParseError},
    multi::fold_many0,
    sequence::{pair, preceded, terminated},
    Err as NomErr, IResult,
};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::pow;

use crate::alphabet::{Alphabet, Symbol};
use crate::error::ParseError;
use crate::expr::{Expr, Func};

/// Error threaded through the combinators.
///
/// `decided` is set once the final [`ParseError`] is known. Otherwise the
/// error is worked out from what sits at `at`.
#[derive(Debug)]
struct Syntax<'s> {
    at: &'s str,
    decided: Option<ParseError>,
}

impl<'s> Syntax<'s> {
    fn mismatch(at: &'s str) -> Self {
        Syntax { at, decided: None }
    }
}

impl<'s> NomParseError<&'s str> for Syntax<'s> {
    fn from_error_kind(input: &'s str, _kind: ErrorKind) -> Self {
        Syntax::mismatch(input)
    }

    fn append(_input: &'s str, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

type PResult<'s, T> = IResult<&'s str, T, Syntax<'s>>;

/// Parse a single expression over `alphabet`.
pub fn parse_expression(src: &str, alphabet: &Alphabet) -> Result<Expr, ParseError> {
    if src.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let grammar = Grammar { src, alphabet };
    let result = match terminated(|i| grammar.expr(i), ws)(src) {
        Ok(("", expr)) => Ok(expr),
        Ok((rest, _)) => Err(grammar.unexpected(rest)),
        Err(NomErr::Error(e) | NomErr::Failure(e)) => Err(grammar.resolve(e)),
        Err(NomErr::Incomplete(_)) => Err(ParseError::UnexpectedEnd),
    };
    result
}

struct Grammar<'s> {
    src: &'s str,
    alphabet: &'s Alphabet,
}

impl<'s> Grammar<'s> {
    fn expr(&self, input: &'s str) -> PResult<'s, Expr> {
        let (input, first) = self.term(input)?;
        fold_many0(
            pair(preceded(ws, additive), cut(|i: &'s str| self.term(i))),
            move || first.clone(),
            |acc, (op, rhs)| match op {
                '+' => Expr::add(vec![acc, rhs]),
                _ => Expr::sub(acc, rhs),
            },
        )(input)
    }

    fn term(&self, input: &'s str) -> PResult<'s, Expr> {
        let (input, first) = self.unary(input)?;
        fold_many0(
            alt((
                pair(preceded(ws, multiplicative), cut(|i: &'s str| self.unary(i))),
                map(|i: &'s str| self.implicit_factor(i), |f| ('*', f)),
            )),
            move || first.clone(),
            |acc, (op, rhs)| match op {
                '*' => Expr::mul(vec![acc, rhs]),
                _ => Expr::div(acc, rhs),
            },
        )(input)
    }

    /// An operand written right after another one, as in `2x` or `x(x+1)`.
    fn implicit_factor(&self, input: &'s str) -> PResult<'s, Expr> {
        let (rest, _) = ws(input)?;
        let starts_number = rest.starts_with(|c: char| c.is_ascii_digit() || c == '.');
        if starts_number && self.follows_number(input) {
            return Err(NomErr::Error(Syntax::mismatch(rest)));
        }
        self.power(rest)
    }

    fn unary(&self, input: &'s str) -> PResult<'s, Expr> {
        preceded(
            ws,
            alt((
                preceded(char('+'), cut(|i: &'s str| self.unary(i))),
                map(preceded(minus, cut(|i: &'s str| self.unary(i))), Expr::neg),
                |i: &'s str| self.power(i),
            )),
        )(input)
    }

    fn power(&self, input: &'s str) -> PResult<'s, Expr> {
        let (rest, base) = self.atom(input)?;
        let (rest, exp) = opt(preceded(
            pair(ws, tag("**")),
            cut(|i: &'s str| self.unary(i)),
        ))(rest)?;
        let expr = match exp {
            Some(exp) => Expr::pow(base, exp),
            None => base,
        };
        Ok((rest, expr))
    }

    fn atom(&self, input: &'s str) -> PResult<'s, Expr> {
        alt((
            map(number, Expr::Num),
            |i: &'s str| self.function(i),
            value(Expr::Pi, tag("pi")),
            map(|i: &'s str| self.letter(i), Expr::Sym),
            |i: &'s str| self.group(i),
        ))(input)
        .map_err(|e| match e {
            NomErr::Error(_) => NomErr::Error(Syntax::mismatch(input)),
            other => other,
        })
    }

    fn function(&self, input: &'s str) -> PResult<'s, Expr> {
        let (rest, f) = func_name(input)?;
        let (rest, _) = ws(rest)?;
        let (rest, arg) = self.group(rest)?;
        Ok((rest, Expr::func(f, arg)))
    }

    /// One letter of the alphabet. Any other letter is a hard error.
    fn letter(&self, input: &'s str) -> PResult<'s, Symbol> {
        let (rest, c) = satisfy(|c: char| c.is_alphabetic())(input)?;
        match self.alphabet.lookup(c) {
            Some(sym) => Ok((rest, sym)),
            None => Err(self.fail(
                input,
                ParseError::UnknownIdentifier {
                    ch: c,
                    pos: self.pos(input),
                },
            )),
        }
    }

    /// Parenthesized expression; an unmatched `(` is reported at its own position.
    fn group(&self, input: &'s str) -> PResult<'s, Expr> {
        let (rest, _) = char('(')(input)?;
        let (rest, inner) = cut(|i: &'s str| self.expr(i))(rest)?;
        let (rest, _) = ws(rest)?;
        if rest.is_empty() {
            return Err(self.fail(
                input,
                ParseError::UnclosedParen {
                    pos: self.pos(input),
                },
            ));
        }
        let (rest, _) = cut(char(')'))(rest)?;
        Ok((rest, inner))
    }

    /// Name of the token at the start of `input`, for error messages.
    fn token(&self, input: &'s str) -> PResult<'s, String> {
        alt((
            map(number, |n| format!("number {}", n)),
            map(func_name, |f| format!("function '{}'", f.name())),
            value("'pi'".to_string(), tag("pi")),
            map(|i: &'s str| self.letter(i), |s| format!("symbol '{}'", s)),
            value("'**'".to_string(), tag("**")),
            map(one_of("+-−*×·/()"), |c| {
                let shown = match c {
                    '−' => '-',
                    '×' | '·' => '*',
                    other => other,
                };
                format!("'{}'", shown)
            }),
        ))(input)
    }

    fn resolve(&self, err: Syntax<'s>) -> ParseError {
        match err.decided {
            Some(decided) => decided,
            None => self.unexpected(err.at),
        }
    }

    /// Describe whatever sits at `rest` where the grammar could not go on.
    fn unexpected(&self, rest: &'s str) -> ParseError {
        let rest = rest.trim_start();
        let pos = self.pos(rest);
        let Some(ch) = rest.chars().next() else {
            return ParseError::UnexpectedEnd;
        };
        match self.token(rest) {
            Ok((_, found)) => ParseError::UnexpectedToken { found, pos },
            Err(NomErr::Failure(Syntax {
                decided: Some(err), ..
            })) => err,
            Err(_) => ParseError::UnexpectedChar { ch, pos },
        }
    }

    fn fail(&self, at: &'s str, err: ParseError) -> NomErr<Syntax<'s>> {
        NomErr::Failure(Syntax {
            at,
            decided: Some(err),
        })
    }

    /// Character offset of `rest` within the source.
    fn pos(&self, rest: &str) -> usize {
        let consumed = self.src.len().saturating_sub(rest.len());
        self.src.get(..consumed).map_or(0, |s| s.chars().count())
    }

    /// Whether the last non-blank character before `rest` ends a number.
    fn follows_number(&self, rest: &str) -> bool {
        let consumed = self.src.len().saturating_sub(rest.len());
        self.src
            .get(..consumed)
            .and_then(|s| s.trim_end().chars().last())
            .is_some_and(|c| c.is_ascii_digit() || c == '.')
    }
}

fn ws(input: &str) -> PResult<'_, &str> {
    take_while(|c: char| c.is_whitespace())(input)
}

fn digits(input: &str) -> PResult<'_, &str> {
    take_while(|c: char| c.is_ascii_digit())(input)
}

fn minus(input: &str) -> PResult<'_, char> {
    value('-', alt((char('-'), char('−'))))(input)
}

fn additive(input: &str) -> PResult<'_, char> {
    alt((char('+'), minus))(input)
}

fn multiplicative(input: &str) -> PResult<'_, char> {
    alt((
        value('*', terminated(char('*'), not(char('*')))),
        value('*', alt((char('×'), char('·')))),
        char('/'),
    ))(input)
}

/// A function name, recognised only when a `(` follows.
fn func_name(input: &str) -> PResult<'_, Func> {
    for (name, func) in Func::NAMES {
        let called: PResult<'_, &str> = terminated(tag(name), peek(pair(ws, char('('))))(input);
        if let Ok((rest, _)) = called {
            return Ok((rest, func));
        }
    }
    Err(NomErr::Error(Syntax::mismatch(input)))
}

/// A decimal literal such as `12`, `2.5`, `.75` or `8.`.
fn number(input: &str) -> PResult<'_, BigRational> {
    let (rest, text) = recognize(pair(digits, opt(pair(char('.'), digits))))(input)?;
    if !text.chars().any(|c| c.is_ascii_digit()) {
        return Err(NomErr::Error(Syntax::mismatch(input)));
    }
    match parse_decimal(text) {
        Ok(n) => Ok((rest, n)),
        Err(err) => Err(NomErr::Failure(Syntax {
            at: input,
            decided: Some(err),
        })),
    }
}

/// Exact value of a decimal literal.
fn parse_decimal(text: &str) -> Result<BigRational, ParseError> {
    let invalid = || ParseError::InvalidNumber {
        text: text.to_string(),
    };
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text, ""));
    let digits = format!("{}{}", int_part, frac_part);
    if digits.is_empty() {
        return Err(invalid());
    }
    let numer: BigInt = digits.parse().map_err(|_| invalid())?;
    let denom = pow(BigInt::from(10), frac_part.len());
    Ok(BigRational::new(numer, denom))
}
