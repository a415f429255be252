//! Step consistency checking.
//!
//! A step is consistent when substituting the reference solutions for the
//! principal unknown makes its two sides equal. With several reference
//! solutions the [`RootPolicy`] decides whether all of them or just one must
//! satisfy the step.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::alphabet::Symbol;
use crate::equation::{Equation, ParsedStep};
use crate::error::VerifyError;
use crate::expr::Expr;
use crate::probe;

/// How many reference solutions a step has to satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootPolicy {
    /// Every solution must satisfy the step.
    #[default]
    All,
    /// At least one solution must satisfy the step.
    Any,
}

impl RootPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            RootPolicy::All => "all",
            RootPolicy::Any => "any",
        }
    }
}

impl fmt::Display for RootPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RootPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(RootPolicy::All),
            "any" => Ok(RootPolicy::Any),
            other => Err(format!(
                "unknown root policy '{}': expected 'all' or 'any'",
                other
            )),
        }
    }
}

/// Classification of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepReason {
    Consistent,
    Inconsistent,
    /// No reference solution exists, so the step is accepted.
    Unverifiable,
    Unparseable,
    VerificationFailed,
}

impl StepReason {
    pub fn is_valid(self) -> bool {
        matches!(self, StepReason::Consistent | StepReason::Unverifiable)
    }

    pub fn code(self) -> &'static str {
        match self {
            StepReason::Consistent => "consistent",
            StepReason::Inconsistent => "inconsistent",
            StepReason::Unverifiable => "unverifiable",
            StepReason::Unparseable => "unparseable",
            StepReason::VerificationFailed => "verification_failed",
        }
    }

    /// Human-readable reason text.
    pub fn message(self) -> &'static str {
        match self {
            StepReason::Consistent => "step is consistent with the reference solution",
            StepReason::Inconsistent => "step is inconsistent with the reference solution",
            StepReason::Unverifiable => "step accepted: no reference solution to compare against",
            StepReason::Unparseable => "could not parse this step as an equation",
            StepReason::VerificationFailed => "could not verify this step",
        }
    }
}

/// Does `value` for `var` make both sides of `eq` equal?
pub fn satisfies(eq: &Equation, var: Symbol, value: &Expr) -> Result<bool, VerifyError> {
    let at = eq.substitute(var, value);
    probe::equivalent(&at.lhs, &at.rhs)
}

/// Classify one parsed step against the reference solutions.
pub fn check_step(
    step: &ParsedStep,
    var: Symbol,
    solutions: &[Expr],
    policy: RootPolicy,
) -> StepReason {
    let eq = match step {
        ParsedStep::Equation(eq) => eq,
        ParsedStep::Failure(_) => return StepReason::Unparseable,
    };
    if solutions.is_empty() {
        return StepReason::Unverifiable;
    }

    match policy {
        RootPolicy::All => {
            for value in solutions {
                match satisfies(eq, var, value) {
                    Ok(true) => {}
                    Ok(false) => return StepReason::Inconsistent,
                    Err(err) => {
                        tracing::debug!(step = %eq, error = %err, "verification failed");
                        return StepReason::VerificationFailed;
                    }
                }
            }
            StepReason::Consistent
        }
        RootPolicy::Any => {
            let mut undecided = false;
            for value in solutions {
                match satisfies(eq, var, value) {
                    Ok(true) => return StepReason::Consistent,
                    Ok(false) => {}
                    Err(_) => undecided = true,
                }
            }
            if undecided {
                StepReason::VerificationFailed
            } else {
                StepReason::Inconsistent
            }
        }
    }
}

/// Whether the last submitted step agrees with the reference solutions.
///
/// Applied regardless of how the step itself was classified. False when
/// there is no step, it did not parse, or there are no reference solutions.
pub fn final_step_correct(
    last: Option<&ParsedStep>,
    var: Symbol,
    solutions: &[Expr],
    policy: RootPolicy,
) -> bool {
    match last {
        Some(step @ ParsedStep::Equation(_)) if !solutions.is_empty() => {
            check_step(step, var, solutions, policy) == StepReason::Consistent
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;
    use crate::equation::parse_equation;

    fn x() -> Symbol {
        Symbol::new('x').unwrap()
    }

    fn step(src: &str) -> ParsedStep {
        parse_equation(src, &Alphabet::default())
    }

    #[test]
    fn test_consistent_and_inconsistent() {
        let sols = [Expr::int(2)];
        assert_eq!(
            check_step(&step("2x = 4"), x(), &sols, RootPolicy::All),
            StepReason::Consistent
        );
        assert_eq!(
            check_step(&step("2x = 5"), x(), &sols, RootPolicy::All),
            StepReason::Inconsistent
        );
    }

    #[test]
    fn test_step_without_unknown() {
        // "4 = 4" holds whatever x is
        let sols = [Expr::int(2)];
        assert_eq!(
            check_step(&step("4 = 4"), x(), &sols, RootPolicy::All),
            StepReason::Consistent
        );
    }

    #[test]
    fn test_unparseable_short_circuits() {
        assert_eq!(
            check_step(&step("nonsense"), x(), &[], RootPolicy::All),
            StepReason::Unparseable
        );
    }

    #[test]
    fn test_no_reference_accepts() {
        let reason = check_step(&step("x = 9"), x(), &[], RootPolicy::All);
        assert_eq!(reason, StepReason::Unverifiable);
        assert!(reason.is_valid());
    }

    #[test]
    fn test_policy_on_two_roots() {
        let sols = [Expr::int(-2), Expr::int(2)];
        assert_eq!(
            check_step(&step("x = 2"), x(), &sols, RootPolicy::All),
            StepReason::Inconsistent
        );
        assert_eq!(
            check_step(&step("x = 2"), x(), &sols, RootPolicy::Any),
            StepReason::Consistent
        );
        assert_eq!(
            check_step(&step("x^2 = 4"), x(), &sols, RootPolicy::All),
            StepReason::Consistent
        );
    }

    #[test]
    fn test_verification_failure() {
        // substituting x = 0 gives 1/0 on the left
        let sols = [Expr::zero()];
        assert_eq!(
            check_step(&step("1/x = 1"), x(), &sols, RootPolicy::All),
            StepReason::VerificationFailed
        );
    }

    #[test]
    fn test_final_step() {
        let sols = [Expr::int(2)];
        assert!(final_step_correct(Some(&step("x = 2")), x(), &sols, RootPolicy::All));
        assert!(!final_step_correct(Some(&step("x = 3")), x(), &sols, RootPolicy::All));
        assert!(!final_step_correct(Some(&step("junk")), x(), &sols, RootPolicy::All));
        assert!(!final_step_correct(Some(&step("x = 2")), x(), &[], RootPolicy::All));
        assert!(!final_step_correct(None, x(), &sols, RootPolicy::All));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("ANY".parse::<RootPolicy>(), Ok(RootPolicy::Any));
        assert_eq!("all".parse::<RootPolicy>(), Ok(RootPolicy::All));
        assert!("most".parse::<RootPolicy>().is_err());
        assert_eq!(RootPolicy::default(), RootPolicy::All);
    }
}
