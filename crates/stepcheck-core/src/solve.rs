//! Equation solver.
//!
//! [`solve`] finds the values of one variable that satisfy an
//! [`Equation`]. It never panics and never reports failure through an
//! error: an equation it cannot handle yields
//! [`SolveOutcome::Unsolvable`] with the reason.
//!
//! # Routes
//!
//! | Route | Handles | Method |
//! |-------|---------|--------|
//! | polynomial | `N(v)/D(v) = 0` with `N`, `D` polynomials | zero-root factoring, linear and quadratic formulas, rational-root search, Durand–Kerner |
//! | isolation | the variable occurs in one term at every level (`sqrt(x) = 3`, `2**x = 8`) | inverts the outer operation step by step |
//!
//! Polynomial roots at which `D` vanishes are discarded. Isolation
//! candidates are substituted back into the original equation and kept only
//! when they satisfy it.

use std::collections::HashSet;
use std::fmt;

use num_bigint::BigInt;
use num_complex::Complex64;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

use crate::alphabet::Symbol;
use crate::equation::Equation;
use crate::expr::{rat_to_f64, Expr, Func};
use crate::poly::{rational_form, Poly};
use crate::probe;

/// Divisor enumeration in the rational-root search stops above this bound.
const MAX_DIVISOR: u64 = 1_000_000;

/// Maximum nesting the isolation route will unwrap.
const MAX_ISOLATION_DEPTH: usize = 32;

const DK_MAX_ITERATIONS: usize = 500;
const DK_EPSILON: f64 = 1e-14;
const NEWTON_ITERATIONS: usize = 8;

/// Upper bound on rational-root candidates tried before falling back to
/// the numeric route.
const MAX_CANDIDATES: usize = 10_000;

/// Imaginary parts below this (relative) size are treated as zero.
const SNAP_EPSILON: f64 = 1e-10;

/// Largest denominator tried when recognising an exact exponent.
const MAX_EXPONENT_DENOM: i64 = 12;

/// Why no solution set could be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unsolvable {
    /// The equation has no solution for the variable.
    NoSolution,
    /// The equation holds for every value of the variable.
    Identity,
    /// The equation's form is outside what the solver handles.
    Unsupported,
    /// A required comparison could not be evaluated.
    Indeterminate,
}

impl Unsolvable {
    pub fn as_str(self) -> &'static str {
        match self {
            Unsolvable::NoSolution => "no_solution",
            Unsolvable::Identity => "identity",
            Unsolvable::Unsupported => "unsupported",
            Unsolvable::Indeterminate => "indeterminate",
        }
    }
}

impl fmt::Display for Unsolvable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered solutions of an equation for one variable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SolutionSet {
    values: Vec<Expr>,
}

impl SolutionSet {
    pub fn new(values: Vec<Expr>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Expr] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Display strings, in order.
    pub fn to_strings(&self) -> Vec<String> {
        self.values.iter().map(ToString::to_string).collect()
    }
}

/// Result of [`solve`].
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    Solved(SolutionSet),
    Unsolvable(Unsolvable),
}

impl SolveOutcome {
    /// The solutions, empty when unsolvable.
    pub fn solutions(&self) -> &[Expr] {
        match self {
            SolveOutcome::Solved(set) => set.values(),
            SolveOutcome::Unsolvable(_) => &[],
        }
    }

    /// `"solved"` or the unsolvable reason.
    pub fn label(&self) -> &'static str {
        match self {
            SolveOutcome::Solved(_) => "solved",
            SolveOutcome::Unsolvable(reason) => reason.as_str(),
        }
    }
}

/// Solve `eq` for `var`.
pub fn solve(eq: &Equation, var: Symbol) -> SolveOutcome {
    let residual = eq.residual();

    if !residual.contains(var) {
        return match probe::is_zero(&residual) {
            Ok(true) => SolveOutcome::Unsolvable(Unsolvable::Identity),
            Ok(false) => SolveOutcome::Unsolvable(Unsolvable::NoSolution),
            Err(_) => SolveOutcome::Unsolvable(Unsolvable::Indeterminate),
        };
    }

    let candidates = match rational_form(&residual, var) {
        Some(form) => {
            if form.num.is_zero() {
                return SolveOutcome::Unsolvable(Unsolvable::Identity);
            }
            match polynomial_roots(form.num) {
                Ok(roots) => roots
                    .into_iter()
                    .filter(|r| !probe::is_surely_zero(&form.den.eval_at(r)))
                    .collect(),
                Err(reason) => return SolveOutcome::Unsolvable(reason),
            }
        }
        None => match isolate(residual.clone(), Expr::zero(), var, MAX_ISOLATION_DEPTH) {
            Some(found) => found
                .into_iter()
                .filter(|c| matches!(probe::is_zero(&residual.substitute(var, c)), Ok(true)))
                .collect(),
            None => return SolveOutcome::Unsolvable(Unsolvable::Unsupported),
        },
    };

    let roots = sort_roots(dedupe(candidates));
    if roots.is_empty() {
        SolveOutcome::Unsolvable(Unsolvable::NoSolution)
    } else {
        tracing::debug!(variable = %var, roots = roots.len(), "equation solved");
        SolveOutcome::Solved(SolutionSet::new(roots))
    }
}

// -------------------------------------------------------------------
// Polynomial route
// -------------------------------------------------------------------

fn polynomial_roots(mut p: Poly) -> Result<Vec<Expr>, Unsolvable> {
    let mut roots = Vec::new();
    if p.strip_zero_roots() > 0 {
        roots.push(Expr::zero());
    }

    let c = p.coeffs().to_vec();
    match p.degree() {
        0 => {}
        1 => roots.push(linear_root(&c[0], &c[1])),
        2 => roots.extend(quadratic_roots(&c[0], &c[1], &c[2])),
        _ => match p.rational_coeffs() {
            Some(rc) => roots.extend(rational_poly_roots(rc)),
            None => return Err(Unsolvable::Unsupported),
        },
    }
    Ok(roots)
}

/// Root of `c0 + c1*v`.
fn linear_root(c0: &Expr, c1: &Expr) -> Expr {
    Expr::div(Expr::neg(c0.clone()), c1.clone())
}

/// Roots of `c0 + c1*v + c2*v**2`.
fn quadratic_roots(c0: &Expr, c1: &Expr, c2: &Expr) -> Vec<Expr> {
    let disc = Expr::sub(
        Expr::pow(c1.clone(), Expr::int(2)),
        Expr::mul(vec![Expr::int(4), c2.clone(), c0.clone()]),
    );
    let two_a = Expr::mul(vec![Expr::int(2), c2.clone()]);
    let minus_b = Expr::neg(c1.clone());

    if probe::is_surely_zero(&disc) {
        return vec![Expr::div(minus_b, two_a)];
    }
    let root = Expr::func(Func::Sqrt, disc);
    vec![
        Expr::div(Expr::sub(minus_b.clone(), root.clone()), two_a.clone()),
        Expr::div(Expr::add(vec![minus_b, root]), two_a),
    ]
}

/// Roots of a polynomial with rational coefficients and a non-zero constant term.
fn rational_poly_roots(coeffs: Vec<BigRational>) -> Vec<Expr> {
    let mut remaining = square_free(coeffs);
    let mut roots = Vec::new();

    if remaining.len() > 3 {
        for candidate in rational_candidates(&remaining) {
            if eval_rational(&remaining, &candidate).is_zero() {
                remaining = deflate(&remaining, &candidate);
                roots.push(Expr::Num(candidate));
            }
            if remaining.len() <= 3 {
                break;
            }
        }
    }

    let exprs: Vec<Expr> = remaining.iter().cloned().map(Expr::Num).collect();
    match exprs.len() {
        0 | 1 => {}
        2 => roots.push(linear_root(&exprs[0], &exprs[1])),
        3 => roots.extend(quadratic_roots(&exprs[0], &exprs[1], &exprs[2])),
        _ => {
            let floats: Vec<f64> = remaining.iter().map(rat_to_f64).collect();
            roots.extend(durand_kerner(&floats).into_iter().map(Expr::Approx));
        }
    }
    roots
}

/// Candidates `±p/q` of the rational root theorem, `p | a0` and `q | an`.
///
/// Empty when there would be more than [`MAX_CANDIDATES`] of them; the
/// caller then goes straight to the numeric route.
fn rational_candidates(coeffs: &[BigRational]) -> Vec<BigRational> {
    let (Some(first), Some(last)) = (coeffs.first(), coeffs.last()) else {
        return Vec::new();
    };
    let ints = clear_denominators(coeffs);
    let (Some(a0), Some(an)) = (ints.first(), ints.last()) else {
        return Vec::new();
    };
    if first.is_zero() || last.is_zero() {
        return Vec::new();
    }
    let (Some(ps), Some(qs)) = (divisors(a0), divisors(an)) else {
        return Vec::new();
    };
    if ps.len().saturating_mul(qs.len()).saturating_mul(2) > MAX_CANDIDATES {
        tracing::debug!(
            numerators = ps.len(),
            denominators = qs.len(),
            "rational-root search skipped"
        );
        return Vec::new();
    }

    let mut seen: HashSet<BigRational> = HashSet::new();
    let mut out: Vec<BigRational> = Vec::new();
    for p in &ps {
        for q in &qs {
            let r = BigRational::new(p.clone(), q.clone());
            for candidate in [r.clone(), -r] {
                if seen.insert(candidate.clone()) {
                    out.push(candidate);
                }
            }
        }
    }
    out
}

fn clear_denominators(coeffs: &[BigRational]) -> Vec<BigInt> {
    let lcm = coeffs
        .iter()
        .fold(BigInt::one(), |acc, c| num_integer::Integer::lcm(&acc, c.denom()));
    coeffs
        .iter()
        .map(|c| (c * BigRational::from_integer(lcm.clone())).to_integer())
        .collect()
}

/// Positive divisors of `|n|`, or `None` when `|n|` is too large to enumerate.
fn divisors(n: &BigInt) -> Option<Vec<BigInt>> {
    let n = n.abs().to_u64()?;
    if n == 0 || n > MAX_DIVISOR * MAX_DIVISOR {
        return None;
    }
    let mut small = Vec::new();
    let mut large = Vec::new();
    let mut i = 1u64;
    while i * i <= n {
        if n % i == 0 {
            small.push(BigInt::from(i));
            if i * i != n {
                large.push(BigInt::from(n / i));
            }
        }
        i += 1;
    }
    small.extend(large.into_iter().rev());
    Some(small)
}

fn eval_rational(coeffs: &[BigRational], at: &BigRational) -> BigRational {
    coeffs
        .iter()
        .rev()
        .fold(BigRational::zero(), |acc, c| acc * at + c)
}

/// Divide by `(v - r)`, assuming `r` is a root.
fn deflate(coeffs: &[BigRational], r: &BigRational) -> Vec<BigRational> {
    let n = coeffs.len() - 1;
    let mut q = vec![BigRational::zero(); n];
    q[n - 1] = coeffs[n].clone();
    for k in (1..n).rev() {
        q[k - 1] = &coeffs[k] + r * &q[k];
    }
    q
}

fn trim(mut p: Vec<BigRational>) -> Vec<BigRational> {
    while p.last().is_some_and(Zero::is_zero) {
        p.pop();
    }
    p
}

fn derivative(p: &[BigRational]) -> Vec<BigRational> {
    p.iter()
        .enumerate()
        .skip(1)
        .map(|(k, c)| c * BigRational::from_integer(BigInt::from(k)))
        .collect()
}

/// Quotient and remainder of `a / b`. A zero `b` leaves `a` as the remainder.
fn div_rem(a: &[BigRational], b: &[BigRational]) -> (Vec<BigRational>, Vec<BigRational>) {
    let b = trim(b.to_vec());
    let mut rem = trim(a.to_vec());
    let Some(lead) = b.last() else {
        return (Vec::new(), rem);
    };
    if rem.len() < b.len() {
        return (Vec::new(), rem);
    }

    let mut quot = vec![BigRational::zero(); rem.len() - b.len() + 1];
    while rem.len() >= b.len() {
        let shift = rem.len() - b.len();
        let factor = &rem[rem.len() - 1] / lead;
        for (i, c) in b.iter().enumerate() {
            rem[shift + i] -= &factor * c;
        }
        quot[shift] = factor;
        rem.pop();
        rem = trim(rem);
    }
    (quot, rem)
}

fn to_monic(p: Vec<BigRational>) -> Vec<BigRational> {
    match p.last().cloned() {
        Some(lead) => p.into_iter().map(|c| c / &lead).collect(),
        None => p,
    }
}

/// Monic greatest common divisor, by Euclid's algorithm over the rationals.
fn poly_gcd(a: &[BigRational], b: &[BigRational]) -> Vec<BigRational> {
    let mut a = trim(a.to_vec());
    let mut b = to_monic(trim(b.to_vec()));
    while !b.is_empty() {
        let (_, r) = div_rem(&a, &b);
        a = b;
        b = to_monic(r);
    }
    to_monic(a)
}

/// `p / gcd(p, p')`: the same roots, each with multiplicity one.
fn square_free(p: Vec<BigRational>) -> Vec<BigRational> {
    let g = poly_gcd(&p, &derivative(&p));
    if g.len() <= 1 {
        return p;
    }
    div_rem(&p, &g).0
}

/// All complex roots of `coeffs` (lowest degree first) by simultaneous iteration.
fn durand_kerner(coeffs: &[f64]) -> Vec<Complex64> {
    let n = coeffs.len() - 1;
    let lead = coeffs[n];
    let monic: Vec<Complex64> = coeffs
        .iter()
        .map(|c| Complex64::new(c / lead, 0.0))
        .collect();

    let seed = Complex64::new(0.4, 0.9);
    let mut z: Vec<Complex64> = (0..n).map(|k| seed.powu(k as u32)).collect();

    for _ in 0..DK_MAX_ITERATIONS {
        let mut max_step: f64 = 0.0;
        for i in 0..n {
            let p = monic
                .iter()
                .rev()
                .fold(Complex64::zero(), |acc, c| acc * z[i] + *c);
            let denom: Complex64 = (0..n)
                .filter(|&j| j != i)
                .map(|j| z[i] - z[j])
                .product();
            if denom.norm() == 0.0 {
                continue;
            }
            let step = p / denom;
            z[i] -= step;
            max_step = max_step.max(step.norm() / (1.0 + z[i].norm()));
        }
        if max_step < DK_EPSILON {
            break;
        }
    }

    z.into_iter()
        .map(|root| snap(newton_polish(&monic, root)))
        .collect()
}

/// A few Newton steps on a simple root found by Durand–Kerner.
fn newton_polish(coeffs: &[Complex64], mut z: Complex64) -> Complex64 {
    for _ in 0..NEWTON_ITERATIONS {
        let (p, dp) = coeffs
            .iter()
            .rev()
            .fold((Complex64::zero(), Complex64::zero()), |(p, dp), c| {
                (p * z + *c, dp * z + p)
            });
        if dp.norm() == 0.0 || !dp.is_finite() {
            break;
        }
        let step = p / dp;
        if !step.is_finite() {
            break;
        }
        z -= step;
        if step.norm() <= f64::EPSILON * z.norm().max(1.0) {
            break;
        }
    }
    z
}

fn snap(z: Complex64) -> Complex64 {
    if z.im.abs() < SNAP_EPSILON * z.re.abs().max(1.0) {
        Complex64::new(z.re, 0.0)
    } else {
        z
    }
}

// -------------------------------------------------------------------
// Isolation route
// -------------------------------------------------------------------

/// Candidates for `var` from `lhs = rhs`, or `None` when `var` cannot be isolated.
fn isolate(lhs: Expr, rhs: Expr, var: Symbol, depth: usize) -> Option<Vec<Expr>> {
    if lhs == Expr::Sym(var) {
        return Some(vec![rhs]);
    }
    if depth == 0 || !lhs.contains(var) {
        return None;
    }
    let next = depth - 1;

    match lhs {
        Expr::Add(terms) => {
            let (with, without) = split_by_var(terms, var)?;
            let rhs = Expr::sub(rhs, Expr::add(without));
            isolate(with, rhs, var, next)
        }
        Expr::Mul(factors) => {
            let (with, without) = split_by_var(factors, var)?;
            let rhs = Expr::div(rhs, Expr::mul(without));
            isolate(with, rhs, var, next)
        }
        Expr::Pow(base, exp) => {
            let (base, exp) = (*base, *exp);
            if !exp.contains(var) {
                let branches = invert_power(&exp, rhs);
                collect_branches(base, branches, var, next)
            } else if !base.contains(var) {
                isolate(exp, log_base(&base, &rhs), var, next)
            } else {
                None
            }
        }
        Expr::Func(f, arg) => {
            let arg = *arg;
            let branches = match f {
                Func::Abs => vec![rhs.clone(), Expr::neg(rhs)],
                Func::Sqrt => vec![Expr::pow(rhs, Expr::int(2))],
                other => vec![Expr::func(other.inverse()?, rhs)],
            };
            collect_branches(arg, branches, var, next)
        }
        _ => None,
    }
}

fn collect_branches(lhs: Expr, branches: Vec<Expr>, var: Symbol, depth: usize) -> Option<Vec<Expr>> {
    let mut out = Vec::new();
    for rhs in branches {
        out.extend(isolate(lhs.clone(), rhs, var, depth)?);
    }
    Some(out)
}

/// Split items into the single one mentioning `var` and the rest.
fn split_by_var(items: Vec<Expr>, var: Symbol) -> Option<(Expr, Vec<Expr>)> {
    let (with, without): (Vec<Expr>, Vec<Expr>) = items.into_iter().partition(|i| i.contains(var));
    match <[Expr; 1]>::try_from(with) {
        Ok([single]) => Some((single, without)),
        Err(_) => None,
    }
}

/// Values of `b` with `b**exp = rhs`.
fn invert_power(exp: &Expr, rhs: Expr) -> Vec<Expr> {
    let inv = Expr::pow(exp.clone(), Expr::int(-1));
    let integer = exp
        .as_num()
        .filter(|n| n.is_integer())
        .and_then(|n| n.to_integer().to_i64());

    match integer {
        Some(k) if k % 2 == 0 => {
            let root = Expr::pow(rhs, inv);
            vec![Expr::neg(root.clone()), root]
        }
        Some(_) if is_negative_constant(&rhs) => {
            // Real odd root of a negative number.
            vec![Expr::neg(Expr::pow(Expr::neg(rhs), inv))]
        }
        _ => vec![Expr::pow(rhs, inv)],
    }
}

fn is_negative_constant(e: &Expr) -> bool {
    if !e.is_constant() {
        return false;
    }
    let z = e.eval(&[]);
    z.im == 0.0 && z.re < 0.0
}

/// `log_base(rhs)`, exact when it is a small rational.
fn log_base(base: &Expr, rhs: &Expr) -> Expr {
    if let (Some(_), Some(_)) = (base.as_num(), rhs.as_num()) {
        let approx = rhs.eval(&[]).ln() / base.eval(&[]).ln();
        if approx.im == 0.0 && approx.re.is_finite() {
            for q in 1..=MAX_EXPONENT_DENOM {
                let p = (approx.re * q as f64).round();
                if p.abs() > 1e6 {
                    break;
                }
                let exp = Expr::rational(p as i64, q);
                if Expr::pow(base.clone(), exp.clone()) == *rhs {
                    return exp;
                }
            }
        }
    }
    Expr::div(
        Expr::func(Func::Ln, rhs.clone()),
        Expr::func(Func::Ln, base.clone()),
    )
}

// -------------------------------------------------------------------
// Post-processing
// -------------------------------------------------------------------

fn dedupe(candidates: Vec<Expr>) -> Vec<Expr> {
    let mut out: Vec<Expr> = Vec::with_capacity(candidates.len());
    for c in candidates {
        let seen = out
            .iter()
            .any(|kept| *kept == c || matches!(probe::equivalent(kept, &c), Ok(true)));
        if !seen {
            out.push(c);
        }
    }
    out
}

/// Order constant roots by real part, then imaginary part.
fn sort_roots(mut roots: Vec<Expr>) -> Vec<Expr> {
    if roots.iter().all(Expr::is_constant) {
        roots.sort_by(|a, b| {
            let (za, zb) = (a.eval(&[]), b.eval(&[]));
            za.re
                .total_cmp(&zb.re)
                .then_with(|| za.im.total_cmp(&zb.im))
        });
    }
    roots
}
