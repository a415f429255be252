//! Symbolic expression trees.
//!
//! Expressions are stored in a flattened form: a sum is a single
//! [`Expr::Add`] node with any number of terms and a product a single
//! [`Expr::Mul`] node, so like terms and like bases sit at the same level.
//! Subtraction is a sum with a negated term, division a product with a `-1`
//! power, and `sqrt(e)` is `e**(1/2)`.
//!
//! Every constructor ([`Expr::add`], [`Expr::mul`], [`Expr::pow`],
//! [`Expr::func`]) performs light, always-safe simplification:
//!
//! - nested sums and products are flattened;
//! - exact rational constants are folded;
//! - like terms (`2*x + 3*x`) and like bases (`x * x**2`) are collected;
//! - integer powers of rationals and perfect rational roots are evaluated;
//! - a rational coefficient is distributed over a sum (`2*(x + 1)`).
//!
//! Terms and factors keep their order of first appearance, so free symbols
//! come out in the order a reader sees them.

use std::f64::consts::PI;
use std::fmt;

use num_bigint::BigInt;
use num_complex::Complex64;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::alphabet::Symbol;

/// Largest integer exponent folded exactly for rational bases.
const MAX_EXACT_EXPONENT: u64 = 64;

/// Largest result size, in bits, produced by exact power folding.
const MAX_EXACT_BITS: u64 = 4096;

/// Unary functions understood by the parser and the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Func {
    Sqrt,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Exp,
    Ln,
    Abs,
}

impl Func {
    /// Recognized spellings, longest first so prefix matching is greedy.
    pub const NAMES: [(&'static str, Func); 11] = [
        ("asin", Func::Asin),
        ("acos", Func::Acos),
        ("atan", Func::Atan),
        ("sqrt", Func::Sqrt),
        ("sin", Func::Sin),
        ("cos", Func::Cos),
        ("tan", Func::Tan),
        ("exp", Func::Exp),
        ("log", Func::Ln),
        ("abs", Func::Abs),
        ("ln", Func::Ln),
    ];

    pub fn name(self) -> &'static str {
        match self {
            Func::Sqrt => "sqrt",
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tan => "tan",
            Func::Asin => "asin",
            Func::Acos => "acos",
            Func::Atan => "atan",
            Func::Exp => "exp",
            Func::Ln => "ln",
            Func::Abs => "abs",
        }
    }

    /// Evaluate on the principal branch.
    pub fn apply(self, z: Complex64) -> Complex64 {
        match self {
            Func::Sqrt => z.sqrt(),
            Func::Sin => z.sin(),
            Func::Cos => z.cos(),
            Func::Tan => z.tan(),
            Func::Asin => z.asin(),
            Func::Acos => z.acos(),
            Func::Atan => z.atan(),
            Func::Exp => z.exp(),
            Func::Ln => z.ln(),
            Func::Abs => Complex64::new(z.norm(), 0.0),
        }
    }

    /// The function undoing this one on its principal branch, if any.
    pub fn inverse(self) -> Option<Func> {
        match self {
            Func::Sin => Some(Func::Asin),
            Func::Cos => Some(Func::Acos),
            Func::Tan => Some(Func::Atan),
            Func::Asin => Some(Func::Sin),
            Func::Acos => Some(Func::Cos),
            Func::Atan => Some(Func::Tan),
            Func::Exp => Some(Func::Ln),
            Func::Ln => Some(Func::Exp),
            Func::Sqrt | Func::Abs => None,
        }
    }
}

/// A symbolic expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Exact rational constant.
    Num(BigRational),
    /// Approximate complex constant, produced by numeric root finding.
    Approx(Complex64),
    Sym(Symbol),
    Pi,
    Add(Vec<Expr>),
    Mul(Vec<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Func(Func, Box<Expr>),
}

pub(crate) fn rat(n: i64) -> BigRational {
    BigRational::from_integer(BigInt::from(n))
}

pub(crate) fn rat_to_f64(n: &BigRational) -> f64 {
    let numer = n.numer().to_f64().unwrap_or(f64::NAN);
    let denom = n.denom().to_f64().unwrap_or(f64::NAN);
    numer / denom
}

impl Expr {
    pub fn int(n: i64) -> Expr {
        Expr::Num(rat(n))
    }

    pub fn rational(numer: i64, denom: i64) -> Expr {
        Expr::Num(BigRational::new(BigInt::from(numer), BigInt::from(denom)))
    }

    pub fn zero() -> Expr {
        Expr::int(0)
    }

    pub fn one() -> Expr {
        Expr::int(1)
    }

    pub fn as_num(&self) -> Option<&BigRational> {
        match self {
            Expr::Num(n) => Some(n),
            _ => None,
        }
    }

    pub fn is_zero_num(&self) -> bool {
        matches!(self, Expr::Num(n) if n.is_zero())
    }

    pub fn is_one_num(&self) -> bool {
        matches!(self, Expr::Num(n) if n.is_one())
    }

    fn as_integer(&self) -> Option<i64> {
        match self {
            Expr::Num(n) if n.is_integer() => n.to_integer().to_i64(),
            _ => None,
        }
    }

    // ---------------------------------------------------------------
    // Constructors
    // ---------------------------------------------------------------

    /// Sum of `terms`, flattened with constants folded and like terms collected.
    pub fn add(terms: Vec<Expr>) -> Expr {
        let mut flat = Vec::with_capacity(terms.len());
        for t in terms {
            match t {
                Expr::Add(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }

        let mut constant = BigRational::zero();
        let mut approx: Option<Complex64> = None;
        let mut collected: Vec<(BigRational, Expr)> = Vec::new();

        for t in flat {
            match t {
                Expr::Num(n) => constant += n,
                Expr::Approx(z) => *approx.get_or_insert_with(Complex64::default) += z,
                other => {
                    let (coeff, rest) = other.split_coeff();
                    match collected.iter_mut().find(|(_, r)| *r == rest) {
                        Some(slot) => slot.0 += coeff,
                        None => collected.push((coeff, rest)),
                    }
                }
            }
        }

        let mut out: Vec<Expr> = collected
            .into_iter()
            .filter(|(c, _)| !c.is_zero())
            .map(|(c, rest)| Expr::scaled(c, rest))
            .collect();

        match approx {
            Some(z) => out.push(Expr::Approx(z + Complex64::new(rat_to_f64(&constant), 0.0))),
            None if !constant.is_zero() => out.push(Expr::Num(constant)),
            None => {}
        }

        Expr::from_terms(out)
    }

    /// Product of `factors`, flattened with the rational coefficient folded
    /// and like bases combined.
    pub fn mul(factors: Vec<Expr>) -> Expr {
        let mut flat = Vec::with_capacity(factors.len());
        for f in factors {
            match f {
                Expr::Mul(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }

        let mut coeff = BigRational::one();
        let mut approx: Option<Complex64> = None;
        let mut bases: Vec<(Expr, Expr)> = Vec::new();

        for f in flat {
            match f {
                Expr::Num(n) => coeff *= n,
                Expr::Approx(z) => *approx.get_or_insert_with(Complex64::one) *= z,
                other => {
                    let (base, exp) = other.into_base_exp();
                    match bases.iter_mut().find(|(b, _)| *b == base) {
                        Some(slot) => {
                            let prev = std::mem::replace(&mut slot.1, Expr::zero());
                            slot.1 = Expr::add(vec![prev, exp]);
                        }
                        None => bases.push((base, exp)),
                    }
                }
            }
        }

        let mut out: Vec<Expr> = Vec::with_capacity(bases.len() + 1);
        for (base, exp) in bases {
            let combined = match Expr::pow(base, exp) {
                Expr::Mul(inner) => inner,
                other => vec![other],
            };
            for factor in combined {
                match factor {
                    Expr::Num(n) => coeff *= n,
                    Expr::Approx(z) => *approx.get_or_insert_with(Complex64::one) *= z,
                    other => out.push(other),
                }
            }
        }

        if coeff.is_zero() && approx.is_none() {
            return Expr::zero();
        }

        match approx {
            Some(z) => out.insert(0, Expr::Approx(z * rat_to_f64(&coeff))),
            None if !coeff.is_one() => {
                // A rational coefficient times a single sum distributes.
                if out.len() == 1 {
                    if let Expr::Add(terms) = &out[0] {
                        let distributed = terms
                            .iter()
                            .map(|t| Expr::mul(vec![Expr::Num(coeff.clone()), t.clone()]))
                            .collect();
                        return Expr::add(distributed);
                    }
                }
                out.insert(0, Expr::Num(coeff));
            }
            None => {}
        }

        Expr::from_factors(out)
    }

    /// `base ** exp`.
    pub fn pow(base: Expr, exp: Expr) -> Expr {
        if exp.is_zero_num() || base.is_one_num() {
            return Expr::one();
        }
        if exp.is_one_num() {
            return base;
        }

        match (&base, &exp) {
            (Expr::Num(b), Expr::Num(e)) => {
                if let Some(v) = rational_pow(b, e) {
                    return Expr::Num(v);
                }
            }
            (Expr::Approx(_), Expr::Num(_) | Expr::Approx(_))
            | (Expr::Num(_), Expr::Approx(_)) => {
                return Expr::Approx(complex_pow(base.eval(&[]), &exp, &[]));
            }
            _ => {}
        }

        if exp.as_integer().is_some() {
            match base {
                // (b**e1)**k == b**(e1*k) for integer k on every branch.
                Expr::Pow(b, inner) => return Expr::pow(*b, Expr::mul(vec![*inner, exp])),
                Expr::Mul(factors) => {
                    return Expr::mul(
                        factors
                            .into_iter()
                            .map(|f| Expr::pow(f, exp.clone()))
                            .collect(),
                    )
                }
                other => return Expr::Pow(Box::new(other), Box::new(exp)),
            }
        }

        Expr::Pow(Box::new(base), Box::new(exp))
    }

    /// Apply a unary function, folding the trivial constant cases.
    pub fn func(f: Func, arg: Expr) -> Expr {
        if f == Func::Sqrt {
            return Expr::pow(arg, Expr::rational(1, 2));
        }
        if let Expr::Num(n) = &arg {
            match f {
                Func::Abs => return Expr::Num(n.abs()),
                Func::Exp | Func::Cos if n.is_zero() => return Expr::one(),
                Func::Sin | Func::Tan | Func::Asin | Func::Atan if n.is_zero() => {
                    return Expr::zero()
                }
                Func::Ln if n.is_one() => return Expr::zero(),
                _ => {}
            }
        }
        if let Expr::Approx(z) = arg {
            return Expr::Approx(f.apply(z));
        }
        Expr::Func(f, Box::new(arg))
    }

    pub fn neg(e: Expr) -> Expr {
        Expr::mul(vec![Expr::int(-1), e])
    }

    pub fn sub(a: Expr, b: Expr) -> Expr {
        Expr::add(vec![a, Expr::neg(b)])
    }

    pub fn div(a: Expr, b: Expr) -> Expr {
        Expr::mul(vec![a, Expr::pow(b, Expr::int(-1))])
    }

    fn from_terms(mut terms: Vec<Expr>) -> Expr {
        match terms.len() {
            0 => Expr::zero(),
            1 => terms.swap_remove(0),
            _ => Expr::Add(terms),
        }
    }

    fn from_factors(mut factors: Vec<Expr>) -> Expr {
        match factors.len() {
            0 => Expr::one(),
            1 => factors.swap_remove(0),
            _ => Expr::Mul(factors),
        }
    }

    /// `coeff * rest`, skipping the multiplication when `coeff` is one.
    fn scaled(coeff: BigRational, rest: Expr) -> Expr {
        if coeff.is_one() {
            rest
        } else {
            Expr::mul(vec![Expr::Num(coeff), rest])
        }
    }

    /// Split off the rational coefficient: `3*x*y` → `(3, x*y)`.
    fn split_coeff(self) -> (BigRational, Expr) {
        match self {
            Expr::Mul(factors) => {
                let mut iter = factors.into_iter();
                match iter.next() {
                    Some(Expr::Num(c)) => (c, Expr::from_factors(iter.collect())),
                    Some(first) => {
                        let mut all = vec![first];
                        all.extend(iter);
                        (BigRational::one(), Expr::Mul(all))
                    }
                    None => (BigRational::one(), Expr::one()),
                }
            }
            other => (BigRational::one(), other),
        }
    }

    fn into_base_exp(self) -> (Expr, Expr) {
        match self {
            Expr::Pow(b, e) => (*b, *e),
            other => (other, Expr::one()),
        }
    }

    // ---------------------------------------------------------------
    // Queries and rewriting
    // ---------------------------------------------------------------

    /// Free symbols in order of first appearance.
    pub fn free_symbols(&self) -> Vec<Symbol> {
        let mut out = Vec::new();
        self.collect_symbols(&mut out);
        out
    }

    pub(crate) fn collect_symbols(&self, out: &mut Vec<Symbol>) {
        match self {
            Expr::Sym(s) => {
                if !out.contains(s) {
                    out.push(*s);
                }
            }
            Expr::Num(_) | Expr::Approx(_) | Expr::Pi => {}
            Expr::Add(items) | Expr::Mul(items) => {
                for item in items {
                    item.collect_symbols(out);
                }
            }
            Expr::Pow(b, e) => {
                b.collect_symbols(out);
                e.collect_symbols(out);
            }
            Expr::Func(_, arg) => arg.collect_symbols(out),
        }
    }

    pub fn contains(&self, sym: Symbol) -> bool {
        match self {
            Expr::Sym(s) => *s == sym,
            Expr::Num(_) | Expr::Approx(_) | Expr::Pi => false,
            Expr::Add(items) | Expr::Mul(items) => items.iter().any(|i| i.contains(sym)),
            Expr::Pow(b, e) => b.contains(sym) || e.contains(sym),
            Expr::Func(_, arg) => arg.contains(sym),
        }
    }

    /// True when no symbol occurs anywhere in the expression.
    pub fn is_constant(&self) -> bool {
        self.free_symbols().is_empty()
    }

    /// Replace every occurrence of `sym` by `value`, re-simplifying on the way up.
    pub fn substitute(&self, sym: Symbol, value: &Expr) -> Expr {
        if !self.contains(sym) {
            return self.clone();
        }
        match self {
            Expr::Sym(_) => value.clone(),
            Expr::Add(items) => Expr::add(items.iter().map(|i| i.substitute(sym, value)).collect()),
            Expr::Mul(items) => Expr::mul(items.iter().map(|i| i.substitute(sym, value)).collect()),
            Expr::Pow(b, e) => Expr::pow(b.substitute(sym, value), e.substitute(sym, value)),
            Expr::Func(f, arg) => Expr::func(*f, arg.substitute(sym, value)),
            Expr::Num(_) | Expr::Approx(_) | Expr::Pi => self.clone(),
        }
    }

    /// Evaluate numerically on principal branches.
    ///
    /// Symbols missing from `env` evaluate to NaN, so the caller sees a
    /// non-finite result rather than a silent default.
    pub fn eval(&self, env: &[(Symbol, Complex64)]) -> Complex64 {
        match self {
            Expr::Num(n) => Complex64::new(rat_to_f64(n), 0.0),
            Expr::Approx(z) => *z,
            Expr::Sym(s) => env
                .iter()
                .find(|(k, _)| k == s)
                .map(|(_, v)| *v)
                .unwrap_or_else(|| Complex64::new(f64::NAN, f64::NAN)),
            Expr::Pi => Complex64::new(PI, 0.0),
            Expr::Add(items) => items.iter().map(|i| i.eval(env)).sum(),
            Expr::Mul(items) => items.iter().map(|i| i.eval(env)).product(),
            Expr::Pow(b, e) => complex_pow(b.eval(env), e, env),
            Expr::Func(f, arg) => f.apply(arg.eval(env)),
        }
    }

    fn is_negative_term(&self) -> bool {
        match self {
            Expr::Num(n) => n.is_negative(),
            Expr::Mul(factors) => matches!(factors.first(), Some(Expr::Num(n)) if n.is_negative()),
            _ => false,
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Add(_) => 1,
            Expr::Mul(_) => 2,
            Expr::Num(n) if n.is_negative() || !n.is_integer() => 2,
            Expr::Approx(z) if z.im != 0.0 || z.re < 0.0 => 1,
            Expr::Pow(_, e) => match e.as_num() {
                Some(n) if n.is_negative() => 2,
                _ => 3,
            },
            _ => 4,
        }
    }
}

/// Exact `b ** e` for rationals, when the result is rational and small.
fn rational_pow(b: &BigRational, e: &BigRational) -> Option<BigRational> {
    if e.is_integer() {
        let k = e.to_integer().to_i64()?;
        if k.unsigned_abs() > MAX_EXACT_EXPONENT {
            return None;
        }
        if b.is_zero() && k < 0 {
            return None;
        }
        let bits = b.numer().bits().max(b.denom().bits());
        if bits.saturating_mul(k.unsigned_abs()) > MAX_EXACT_BITS {
            return None;
        }
        let raised = num_traits::pow(b.clone(), k.unsigned_abs() as usize);
        return Some(if k < 0 { raised.recip() } else { raised });
    }

    // Rational exponent p/q: only perfect roots of non-negative bases fold.
    if b.is_negative() {
        return None;
    }
    let q = e.denom().to_u32().filter(|q| u64::from(*q) <= MAX_EXACT_EXPONENT)?;
    let numer_root = exact_root(b.numer(), q)?;
    let denom_root = exact_root(b.denom(), q)?;
    let root = BigRational::new(numer_root, denom_root);
    rational_pow(&root, &BigRational::from_integer(e.numer().clone()))
}

fn exact_root(n: &BigInt, q: u32) -> Option<BigInt> {
    let r = n.nth_root(q);
    if num_traits::pow(r.clone(), q as usize) == *n {
        Some(r)
    } else {
        None
    }
}

fn complex_pow(base: Complex64, exp: &Expr, env: &[(Symbol, Complex64)]) -> Complex64 {
    if let Some(k) = exp.as_integer().and_then(|k| i32::try_from(k).ok()) {
        return base.powi(k);
    }
    if let Some(n) = exp.as_num() {
        if *n == BigRational::new(BigInt::from(1), BigInt::from(2)) {
            return base.sqrt();
        }
    }
    let e = exp.eval(env);
    if base == Complex64::default() {
        return if e.re > 0.0 {
            Complex64::default()
        } else {
            Complex64::new(f64::NAN, f64::NAN)
        };
    }
    base.powc(e)
}

// -------------------------------------------------------------------
// Display
// -------------------------------------------------------------------

fn fmt_float(x: f64) -> String {
    if (x - x.round()).abs() < 1e-12 && x.abs() < 1e15 {
        format!("{}", x.round() as i64)
    } else {
        let s = format!("{:.6}", x);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

fn render_at(e: &Expr, min_prec: u8) -> String {
    if e.precedence() < min_prec {
        format!("({})", e)
    } else {
        e.to_string()
    }
}

fn render_sum(terms: &[Expr], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, term) in terms.iter().enumerate() {
        if i == 0 {
            write!(f, "{}", term)?;
        } else if term.is_negative_term() {
            write!(f, " - {}", render_at(&Expr::neg(term.clone()), 2))?;
        } else {
            write!(f, " + {}", term)?;
        }
    }
    Ok(())
}

fn render_product(factors: &[Expr], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut numer: Vec<String> = Vec::new();
    let mut denom: Vec<String> = Vec::new();
    let mut sign = "";
    let mut coeff_numer: Option<BigInt> = None;
    let mut coeff_denom: Option<BigInt> = None;

    for factor in factors {
        match factor {
            Expr::Num(c) => {
                if c.is_negative() {
                    sign = "-";
                }
                let n = c.numer().abs();
                if !n.is_one() {
                    coeff_numer = Some(n);
                }
                if !c.denom().is_one() {
                    coeff_denom = Some(c.denom().clone());
                }
            }
            Expr::Pow(b, e) if e.as_num().is_some_and(|n| n.is_negative()) => {
                let flipped = Expr::pow((**b).clone(), Expr::neg((**e).clone()));
                denom.push(render_at(&flipped, 3));
            }
            other => numer.push(render_at(other, 3)),
        }
    }

    if let Some(n) = coeff_numer {
        numer.insert(0, n.to_string());
    }
    if let Some(d) = coeff_denom {
        denom.insert(0, d.to_string());
    }

    let numer_str = if numer.is_empty() {
        "1".to_string()
    } else {
        numer.join("*")
    };

    match denom.len() {
        0 => write!(f, "{}{}", sign, numer_str),
        1 => write!(f, "{}{}/{}", sign, numer_str, denom[0]),
        _ => write!(f, "{}{}/({})", sign, numer_str, denom.join("*")),
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Num(n) => {
                if n.is_integer() {
                    write!(f, "{}", n.numer())
                } else {
                    write!(f, "{}/{}", n.numer(), n.denom())
                }
            }
            Expr::Approx(z) => {
                // Parts that round to zero at display precision are dropped.
                let re = fmt_float(z.re);
                let im = fmt_float(z.im.abs());
                let re_zero = re == "0" || re == "-0";
                let sign = if z.im < 0.0 { "-" } else { "+" };
                match (re_zero, im == "0") {
                    (true, true) => write!(f, "0"),
                    (false, true) => write!(f, "{}", re),
                    (true, false) if z.im < 0.0 => write!(f, "-{}*i", im),
                    (true, false) => write!(f, "{}*i", im),
                    (false, false) => write!(f, "{} {} {}*i", re, sign, im),
                }
            }
            Expr::Sym(s) => write!(f, "{}", s),
            Expr::Pi => write!(f, "pi"),
            Expr::Add(terms) => render_sum(terms, f),
            Expr::Mul(factors) => render_product(factors, f),
            Expr::Pow(b, e) => {
                if let Some(n) = e.as_num() {
                    if *n == BigRational::new(BigInt::from(1), BigInt::from(2)) {
                        return write!(f, "sqrt({})", b);
                    }
                    if n.is_negative() {
                        let flipped = Expr::pow((**b).clone(), Expr::Num(-n.clone()));
                        return write!(f, "1/{}", render_at(&flipped, 3));
                    }
                }
                write!(f, "{}**{}", render_at(b, 4), render_at(e, 4))
            }
            Expr::Func(func, arg) => write!(f, "{}({})", func.name(), arg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Expr {
        Expr::Sym(Symbol::new('x').unwrap())
    }

    fn y() -> Expr {
        Expr::Sym(Symbol::new('y').unwrap())
    }

    #[test]
    fn test_constant_folding() {
        let e = Expr::add(vec![Expr::int(2), Expr::int(3), Expr::rational(1, 2)]);
        assert_eq!(e, Expr::rational(11, 2));
        let p = Expr::mul(vec![Expr::int(4), Expr::rational(1, 2)]);
        assert_eq!(p, Expr::int(2));
    }

    #[test]
    fn test_like_terms_collected() {
        let e = Expr::add(vec![
            Expr::mul(vec![Expr::int(2), x()]),
            Expr::mul(vec![Expr::int(3), x()]),
        ]);
        assert_eq!(e, Expr::mul(vec![Expr::int(5), x()]));
        assert_eq!(Expr::sub(x(), x()), Expr::zero());
    }

    #[test]
    fn test_like_bases_combined() {
        let e = Expr::mul(vec![x(), Expr::pow(x(), Expr::int(2))]);
        assert_eq!(e, Expr::pow(x(), Expr::int(3)));
        assert_eq!(Expr::div(x(), x()), Expr::one());
    }

    #[test]
    fn test_exact_powers_and_roots() {
        assert_eq!(Expr::pow(Expr::int(2), Expr::int(10)), Expr::int(1024));
        assert_eq!(Expr::pow(Expr::int(2), Expr::int(-2)), Expr::rational(1, 4));
        assert_eq!(Expr::func(Func::Sqrt, Expr::int(16)), Expr::int(4));
        assert_eq!(
            Expr::func(Func::Sqrt, Expr::rational(9, 4)),
            Expr::rational(3, 2)
        );
        // Irrational roots stay symbolic.
        assert!(matches!(
            Expr::func(Func::Sqrt, Expr::int(2)),
            Expr::Pow(_, _)
        ));
    }

    #[test]
    fn test_huge_power_not_expanded() {
        let e = Expr::pow(Expr::int(10), Expr::int(1000));
        assert!(matches!(e, Expr::Pow(_, _)));
    }

    #[test]
    fn test_coefficient_distributes_over_sum() {
        let e = Expr::mul(vec![Expr::int(2), Expr::add(vec![x(), Expr::one()])]);
        assert_eq!(
            e,
            Expr::add(vec![Expr::mul(vec![Expr::int(2), x()]), Expr::int(2)])
        );
    }

    #[test]
    fn test_substitute_and_eval() {
        let e = Expr::add(vec![Expr::mul(vec![Expr::int(2), x()]), Expr::int(3)]);
        assert_eq!(e.substitute(Symbol::new('x').unwrap(), &Expr::int(2)), Expr::int(7));
        let v = e.eval(&[(Symbol::new('x').unwrap(), Complex64::new(0.5, 0.0))]);
        assert!((v.re - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_symbol_evaluates_to_nan() {
        assert!(!x().eval(&[]).is_finite());
    }

    #[test]
    fn test_free_symbols_in_order() {
        let e = Expr::add(vec![y(), Expr::mul(vec![x(), y()])]);
        let syms: Vec<char> = e.free_symbols().into_iter().map(Symbol::as_char).collect();
        assert_eq!(syms, vec!['y', 'x']);
    }

    #[test]
    fn test_display() {
        let e = Expr::add(vec![Expr::mul(vec![Expr::int(2), x()]), Expr::int(-4)]);
        assert_eq!(e.to_string(), "2*x - 4");
        assert_eq!(Expr::rational(5, 2).to_string(), "5/2");
        assert_eq!(Expr::div(x(), Expr::int(2)).to_string(), "x/2");
        assert_eq!(Expr::func(Func::Sqrt, Expr::int(2)).to_string(), "sqrt(2)");
        assert_eq!(Expr::pow(x(), Expr::int(2)).to_string(), "x**2");
        assert_eq!(Expr::neg(x()).to_string(), "-x");
        assert_eq!(Expr::div(Expr::one(), x()).to_string(), "1/x");
    }

    #[test]
    fn test_display_approx_drops_vanishing_parts() {
        let shown = |re: f64, im: f64| Expr::Approx(Complex64::new(re, im)).to_string();
        assert_eq!(shown(-1.414_213_56, 1e-17), "-1.414214");
        assert_eq!(shown(-1.414_213_56, -1e-9), "-1.414214");
        assert_eq!(shown(1e-16, 2.0), "2*i");
        assert_eq!(shown(-1e-9, -0.5), "-0.5*i");
        assert_eq!(shown(1.5, -2.0), "1.5 - 2*i");
        assert_eq!(shown(-1e-9, 0.0), "0");
    }
}
