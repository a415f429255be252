//! Numeric identity testing.
//!
//! Deciding symbolic zero in general is undecidable, and the expression
//! constructors only perform light simplification. Equality of two
//! expressions is therefore decided in two stages:
//!
//! 1. exact: the simplified difference is the rational `0` (or another
//!    rational constant, which settles the answer the other way);
//! 2. numeric: both sides are evaluated in complex arithmetic at a fixed
//!    set of generic sample assignments for the remaining free symbols.
//!
//! Sample points where either side is non-finite (division by zero, a
//! logarithm of zero) are skipped. When every point is skipped the result
//! is [`VerifyError::Indeterminate`].
//!
//! The sample values are fixed constants, so results are reproducible.

use num_complex::Complex64;

use crate::alphabet::Symbol;
use crate::error::VerifyError;
use crate::expr::Expr;

/// Generic positive reals unlikely to be special points of student algebra.
const SAMPLE_VALUES: [f64; 8] = [
    0.577_215_664_9,
    1.202_056_903_2,
    0.915_965_594_2,
    1.618_033_988_7,
    2.685_452_001_1,
    0.739_085_133_2,
    1.324_717_957_2,
    0.261_497_212_8,
];

/// Number of assignments tried per comparison.
const POINTS: usize = 4;

/// Relative tolerance, scaled by the magnitude of the compared values.
const TOLERANCE: f64 = 1e-9;

/// True when `a` and `b` agree as functions of their free symbols.
pub fn equivalent(a: &Expr, b: &Expr) -> Result<bool, VerifyError> {
    let diff = Expr::sub(a.clone(), b.clone());
    if let Some(n) = diff.as_num() {
        return Ok(num_traits::Zero::is_zero(n));
    }

    let mut symbols = a.free_symbols();
    for s in b.free_symbols() {
        if !symbols.contains(&s) {
            symbols.push(s);
        }
    }

    let mut usable = 0;
    for point in 0..POINTS {
        let env = sample_env(&symbols, point);
        let va = a.eval(&env);
        let vb = b.eval(&env);
        if !is_finite(va) || !is_finite(vb) {
            continue;
        }
        usable += 1;
        let scale = 1.0_f64.max(va.norm()).max(vb.norm());
        if (va - vb).norm() > TOLERANCE * scale {
            return Ok(false);
        }
    }

    if usable == 0 {
        return Err(VerifyError::Indeterminate {
            expr: diff.to_string(),
        });
    }
    Ok(true)
}

/// True when `e` is identically zero.
pub fn is_zero(e: &Expr) -> Result<bool, VerifyError> {
    equivalent(e, &Expr::zero())
}

/// Best-effort zero test: undecidable counts as non-zero.
pub(crate) fn is_surely_zero(e: &Expr) -> bool {
    e.is_zero_num() || matches!(is_zero(e), Ok(true))
}

fn sample_env(symbols: &[Symbol], point: usize) -> Vec<(Symbol, Complex64)> {
    symbols
        .iter()
        .enumerate()
        .map(|(j, s)| {
            let v = SAMPLE_VALUES[(point * 3 + j) % SAMPLE_VALUES.len()];
            (*s, Complex64::new(v, 0.0))
        })
        .collect()
}

fn is_finite(z: Complex64) -> bool {
    z.re.is_finite() && z.im.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Func;

    fn x() -> Expr {
        Expr::Sym(Symbol::new('x').unwrap())
    }

    fn y() -> Expr {
        Expr::Sym(Symbol::new('y').unwrap())
    }

    #[test]
    fn test_exact_constants() {
        assert_eq!(equivalent(&Expr::int(4), &Expr::int(4)), Ok(true));
        assert_eq!(equivalent(&Expr::int(4), &Expr::int(5)), Ok(false));
    }

    #[test]
    fn test_expanded_square() {
        // (x + y)**2 == x**2 + 2xy + y**2
        let lhs = Expr::pow(Expr::add(vec![x(), y()]), Expr::int(2));
        let rhs = Expr::add(vec![
            Expr::pow(x(), Expr::int(2)),
            Expr::mul(vec![Expr::int(2), x(), y()]),
            Expr::pow(y(), Expr::int(2)),
        ]);
        assert_eq!(equivalent(&lhs, &rhs), Ok(true));
        assert_eq!(equivalent(&lhs, &Expr::pow(x(), Expr::int(2))), Ok(false));
    }

    #[test]
    fn test_irrational_constants() {
        // sqrt(2)**2 - 2 folds exactly; sqrt(8) vs 2*sqrt(2) needs numerics
        let sqrt8 = Expr::func(Func::Sqrt, Expr::int(8));
        let two_sqrt2 = Expr::mul(vec![Expr::int(2), Expr::func(Func::Sqrt, Expr::int(2))]);
        assert_eq!(equivalent(&sqrt8, &two_sqrt2), Ok(true));
    }

    #[test]
    fn test_indeterminate_when_never_finite() {
        // 1/0 is non-finite at every point
        let bad = Expr::pow(Expr::zero(), Expr::int(-1));
        assert!(matches!(
            equivalent(&bad, &Expr::one()),
            Err(VerifyError::Indeterminate { .. })
        ));
    }

    #[test]
    fn test_is_surely_zero() {
        assert!(is_surely_zero(&Expr::zero()));
        assert!(is_surely_zero(&Expr::sub(
            Expr::func(Func::Sqrt, Expr::int(8)),
            Expr::mul(vec![Expr::int(2), Expr::func(Func::Sqrt, Expr::int(2))]),
        )));
        assert!(!is_surely_zero(&x()));
    }
}
