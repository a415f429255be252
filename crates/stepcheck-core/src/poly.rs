//! Polynomials in one variable with symbolic coefficients.
//!
//! [`rational_form`] rewrites an expression as `N(v) / D(v)` where `N` and
//! `D` are polynomials in `v` whose coefficients do not mention `v`. This is
//! the representation the solver's polynomial route works on.

use num_rational::BigRational;

use crate::alphabet::Symbol;
use crate::expr::Expr;
use crate::probe;

/// Largest integer exponent expanded when building a polynomial.
pub const MAX_EXPANDED_POWER: u64 = 32;

/// Largest degree a polynomial may reach while being built.
const MAX_DEGREE: usize = 128;

/// Coefficients from lowest to highest degree.
#[derive(Debug, Clone, PartialEq)]
pub struct Poly {
    coeffs: Vec<Expr>,
}

impl Poly {
    pub fn constant(c: Expr) -> Self {
        Self { coeffs: vec![c] }
    }

    /// The polynomial `v`.
    pub fn identity() -> Self {
        Self {
            coeffs: vec![Expr::zero(), Expr::one()],
        }
    }

    pub fn from_coeffs(coeffs: Vec<Expr>) -> Self {
        let mut p = Self { coeffs };
        p.trim();
        p
    }

    pub fn coeffs(&self) -> &[Expr] {
        &self.coeffs
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    /// True for the zero polynomial.
    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(Expr::is_zero_num)
    }

    pub fn is_one(&self) -> bool {
        self.coeffs.len() == 1 && self.coeffs[0].is_one_num()
    }

    /// Drop leading coefficients that are identically zero.
    fn trim(&mut self) {
        while self.coeffs.len() > 1 {
            match self.coeffs.last() {
                Some(c) if probe::is_surely_zero(c) => {
                    self.coeffs.pop();
                }
                _ => break,
            }
        }
        if self.coeffs.is_empty() {
            self.coeffs.push(Expr::zero());
        }
    }

    pub fn add(&self, other: &Poly) -> Poly {
        let len = self.coeffs.len().max(other.coeffs.len());
        let coeffs = (0..len)
            .map(|i| {
                let a = self.coeffs.get(i).cloned().unwrap_or_else(Expr::zero);
                let b = other.coeffs.get(i).cloned().unwrap_or_else(Expr::zero);
                Expr::add(vec![a, b])
            })
            .collect();
        Poly::from_coeffs(coeffs)
    }

    pub fn mul(&self, other: &Poly) -> Poly {
        let mut coeffs = vec![Expr::zero(); self.coeffs.len() + other.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            if a.is_zero_num() {
                continue;
            }
            for (j, b) in other.coeffs.iter().enumerate() {
                if b.is_zero_num() {
                    continue;
                }
                let prev = std::mem::replace(&mut coeffs[i + j], Expr::zero());
                coeffs[i + j] = Expr::add(vec![prev, Expr::mul(vec![a.clone(), b.clone()])]);
            }
        }
        Poly::from_coeffs(coeffs)
    }

    pub fn pow(&self, k: u32) -> Poly {
        let mut acc = Poly::constant(Expr::one());
        for _ in 0..k {
            acc = acc.mul(self);
        }
        acc
    }

    /// Evaluate at `value` with Horner's scheme.
    pub fn eval_at(&self, value: &Expr) -> Expr {
        let mut acc = Expr::zero();
        for c in self.coeffs.iter().rev() {
            acc = Expr::add(vec![Expr::mul(vec![acc, value.clone()]), c.clone()]);
        }
        acc
    }

    /// Coefficients as exact rationals, when every one is a rational constant.
    pub fn rational_coeffs(&self) -> Option<Vec<BigRational>> {
        self.coeffs.iter().map(|c| c.as_num().cloned()).collect()
    }

    /// Remove the factor `v**k` with the largest `k` and return `k`.
    pub fn strip_zero_roots(&mut self) -> usize {
        let mut k = 0;
        while self.coeffs.len() > 1 && probe::is_surely_zero(&self.coeffs[0]) {
            self.coeffs.remove(0);
            k += 1;
        }
        k
    }
}

/// `num / den`.
#[derive(Debug, Clone, PartialEq)]
pub struct RationalForm {
    pub num: Poly,
    pub den: Poly,
}

impl RationalForm {
    fn constant(c: Expr) -> Self {
        Self {
            num: Poly::constant(c),
            den: Poly::constant(Expr::one()),
        }
    }

    fn add(self, other: RationalForm) -> RationalForm {
        if self.den == other.den {
            return RationalForm {
                num: self.num.add(&other.num),
                den: self.den,
            };
        }
        RationalForm {
            num: self.num.mul(&other.den).add(&other.num.mul(&self.den)),
            den: self.den.mul(&other.den),
        }
    }

    fn mul(self, other: RationalForm) -> RationalForm {
        RationalForm {
            num: self.num.mul(&other.num),
            den: self.den.mul(&other.den),
        }
    }

    fn within_bounds(&self) -> bool {
        self.num.degree() <= MAX_DEGREE && self.den.degree() <= MAX_DEGREE
    }
}

/// Rewrite `expr` as a ratio of polynomials in `var`.
///
/// Returns `None` when `var` occurs somewhere a polynomial cannot hold it:
/// under a function, in an exponent, or raised to a non-integer power or an
/// integer power above [`MAX_EXPANDED_POWER`].
pub fn rational_form(expr: &Expr, var: Symbol) -> Option<RationalForm> {
    if !expr.contains(var) {
        return Some(RationalForm::constant(expr.clone()));
    }
    let form = match expr {
        Expr::Sym(_) => RationalForm {
            num: Poly::identity(),
            den: Poly::constant(Expr::one()),
        },
        Expr::Add(terms) => {
            let mut acc = RationalForm::constant(Expr::zero());
            for t in terms {
                acc = acc.add(rational_form(t, var)?);
                if !acc.within_bounds() {
                    return None;
                }
            }
            acc
        }
        Expr::Mul(factors) => {
            let mut acc = RationalForm::constant(Expr::one());
            for f in factors {
                acc = acc.mul(rational_form(f, var)?);
                if !acc.within_bounds() {
                    return None;
                }
            }
            acc
        }
        Expr::Pow(base, exp) => {
            let k = exp
                .as_num()
                .filter(|n| n.is_integer())
                .and_then(|n| num_traits::ToPrimitive::to_i64(&n.to_integer()))
                .filter(|k| k.unsigned_abs() <= MAX_EXPANDED_POWER)?;
            let inner = rational_form(base, var)?;
            let n = k.unsigned_abs() as u32;
            if k >= 0 {
                RationalForm {
                    num: inner.num.pow(n),
                    den: inner.den.pow(n),
                }
            } else {
                RationalForm {
                    num: inner.den.pow(n),
                    den: inner.num.pow(n),
                }
            }
        }
        Expr::Func(_, _) | Expr::Num(_) | Expr::Approx(_) | Expr::Pi => return None,
    };
    form.within_bounds().then_some(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Func;

    fn x_sym() -> Symbol {
        Symbol::new('x').unwrap()
    }

    fn x() -> Expr {
        Expr::Sym(x_sym())
    }

    #[test]
    fn test_quadratic_coefficients() {
        // (x + 1)(x - 3) = x**2 - 2x - 3
        let e = Expr::mul(vec![
            Expr::add(vec![x(), Expr::one()]),
            Expr::sub(x(), Expr::int(3)),
        ]);
        let form = rational_form(&e, x_sym()).unwrap();
        assert!(form.den.is_one());
        assert_eq!(
            form.num.coeffs(),
            &[Expr::int(-3), Expr::int(-2), Expr::int(1)]
        );
    }

    #[test]
    fn test_reciprocal_moves_to_denominator() {
        // 1/x - 2
        let e = Expr::sub(Expr::div(Expr::one(), x()), Expr::int(2));
        let form = rational_form(&e, x_sym()).unwrap();
        assert_eq!(form.num.coeffs(), &[Expr::one(), Expr::int(-2)]);
        assert_eq!(form.den.coeffs(), &[Expr::zero(), Expr::one()]);
    }

    #[test]
    fn test_symbolic_coefficients() {
        let a = Expr::Sym(Symbol::new('a').unwrap());
        let e = Expr::add(vec![Expr::mul(vec![a.clone(), x()]), Expr::int(5)]);
        let form = rational_form(&e, x_sym()).unwrap();
        assert_eq!(form.num.degree(), 1);
        assert_eq!(form.num.coeffs()[1], a);
    }

    #[test]
    fn test_cancelling_leading_terms_trimmed() {
        let p = Poly::from_coeffs(vec![Expr::int(1), Expr::int(2), Expr::zero()]);
        assert_eq!(p.degree(), 1);
    }

    #[test]
    fn test_non_polynomial_rejected() {
        let e = Expr::func(Func::Sqrt, x());
        assert!(rational_form(&e, x_sym()).is_none());
        let e = Expr::func(Func::Sin, x());
        assert!(rational_form(&e, x_sym()).is_none());
        let e = Expr::pow(Expr::int(2), x());
        assert!(rational_form(&e, x_sym()).is_none());
    }

    #[test]
    fn test_strip_zero_roots_and_eval() {
        let mut p = Poly::from_coeffs(vec![Expr::zero(), Expr::zero(), Expr::int(-4), Expr::one()]);
        assert_eq!(p.strip_zero_roots(), 2);
        assert_eq!(p.eval_at(&Expr::int(4)), Expr::zero());
    }
}
