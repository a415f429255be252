//! The grading pipeline.
//!
//! [`Grader`] wires the stages together for one request:
//!
//! 1. parse the correct answer (reject on failure);
//! 2. parse every step once;
//! 3. resolve the principal unknown over the steps, then the answer
//!    (reject when there is none);
//! 4. solve the answer for the unknown;
//! 5. check each step and record the first invalid one;
//! 6. check the last step against the solutions;
//! 7. aggregate the score.
//!
//! A `Grader` holds only read-only configuration, so one instance can be
//! shared across threads behind an `Arc`.

use crate::alphabet::Alphabet;
use crate::check::{check_step, final_step_correct, RootPolicy};
use crate::equation::{parse_equation, try_parse_equation, ParsedStep};
use crate::error::GradeError;
use crate::models::{
    GradeOutcome, GradeRejection, GradeRequest, GradingReport, SolveSummary, StepResult,
};
use crate::resolve::resolve_principal;
use crate::score::aggregate;
use crate::solve::solve;

#[derive(Debug, Clone, Default)]
pub struct Grader {
    alphabet: Alphabet,
    policy: RootPolicy,
}

impl Grader {
    pub fn new(alphabet: Alphabet, policy: RootPolicy) -> Self {
        Self { alphabet, policy }
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn policy(&self) -> RootPolicy {
        self.policy
    }

    /// Parse one line over the configured alphabet.
    pub fn parse(&self, line: &str) -> ParsedStep {
        parse_equation(line, &self.alphabet)
    }

    /// Grade with the configured root policy.
    pub fn grade<S: AsRef<str>>(
        &self,
        question: &str,
        correct_answer: &str,
        steps: &[S],
    ) -> GradeOutcome {
        self.grade_with_policy(question, correct_answer, steps, self.policy)
    }

    pub fn grade_request(&self, req: &GradeRequest) -> GradeOutcome {
        self.grade_with_policy(
            &req.question,
            &req.correct_answer,
            &req.student_steps,
            req.policy.unwrap_or(self.policy),
        )
    }

    pub fn grade_with_policy<S: AsRef<str>>(
        &self,
        question: &str,
        correct_answer: &str,
        steps: &[S],
        policy: RootPolicy,
    ) -> GradeOutcome {
        match self.try_grade(question, correct_answer, steps, policy) {
            Ok(report) => GradeOutcome::Report(report),
            Err(err) => {
                tracing::debug!(error = %err, "grading request rejected");
                GradeOutcome::Rejected(GradeRejection::new(err.to_string()))
            }
        }
    }

    /// Grade, returning the precondition failure as an error.
    pub fn try_grade<S: AsRef<str>>(
        &self,
        question: &str,
        correct_answer: &str,
        steps: &[S],
        policy: RootPolicy,
    ) -> Result<GradingReport, GradeError> {
        let answer = try_parse_equation(correct_answer, &self.alphabet)
            .map_err(GradeError::UnparseableAnswer)?;
        let parsed: Vec<ParsedStep> = steps.iter().map(|s| self.parse(s.as_ref())).collect();

        let variable = resolve_principal(&parsed)
            .or_else(|| answer.free_symbols().first().copied())
            .ok_or(GradeError::NoPrincipalUnknown)?;

        let outcome = solve(&answer, variable);
        let solutions = outcome.solutions();
        tracing::debug!(
            variable = %variable,
            outcome = outcome.label(),
            solutions = solutions.len(),
            "reference solved"
        );

        let results: Vec<StepResult> = parsed
            .iter()
            .zip(steps)
            .enumerate()
            .map(|(index, (step, raw))| {
                StepResult::new(index, raw.as_ref(), check_step(step, variable, solutions, policy))
            })
            .collect();

        let first_wrong_step_index = results.iter().position(|r| !r.is_valid);
        let final_correct = final_step_correct(parsed.last(), variable, solutions, policy);
        let score = aggregate(&results, final_correct);

        Ok(GradingReport {
            success: true,
            question: question.to_string(),
            correct_answer: correct_answer.to_string(),
            variable: variable.to_string(),
            solutions: solutions.iter().map(ToString::to_string).collect(),
            steps: results,
            first_wrong_step_index,
            final_correct,
            score,
        })
    }

    /// Solve one equation, for `variable` or for its principal unknown.
    pub fn solve(&self, equation: &str, variable: Option<char>) -> Result<SolveSummary, GradeError> {
        let eq = try_parse_equation(equation, &self.alphabet)
            .map_err(GradeError::UnparseableEquation)?;
        let var = match variable {
            Some(c) => self
                .alphabet
                .lookup(c)
                .ok_or_else(|| GradeError::UnknownVariable(c.to_string()))?,
            None => eq
                .free_symbols()
                .first()
                .copied()
                .ok_or(GradeError::NoPrincipalUnknown)?,
        };

        let outcome = solve(&eq, var);
        Ok(SolveSummary {
            variable: var.to_string(),
            outcome: outcome.label().to_string(),
            solutions: outcome.solutions().iter().map(ToString::to_string).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::StepReason;
    use crate::models::GradeOutcome;

    fn report(outcome: GradeOutcome) -> GradingReport {
        match outcome {
            GradeOutcome::Report(r) => r,
            GradeOutcome::Rejected(r) => panic!("rejected: {}", r.error),
        }
    }

    #[test]
    fn test_unsolvable_reference_accepts_parsed_steps() {
        let g = Grader::default();
        let r = report(g.grade("", "x + 1 = x + 2", &["x = 5", "oops"]));
        assert!(r.solutions.is_empty());
        assert_eq!(r.steps[0].code, StepReason::Unverifiable);
        assert!(r.steps[0].is_valid);
        assert_eq!(r.steps[1].code, StepReason::Unparseable);
        assert_eq!(r.first_wrong_step_index, Some(1));
        assert!(!r.final_correct);
        assert_eq!(r.score, 40.0);
    }

    #[test]
    fn test_principal_unknown_from_steps_first() {
        let g = Grader::default();
        let r = report(g.grade("", "y = 3", &["x = 1"]));
        // x is not in the answer, so the reference has no solution for it
        assert_eq!(r.variable, "x");
        assert!(r.solutions.is_empty());
    }

    #[test]
    fn test_rejects_numeric_identity() {
        let g = Grader::default();
        let outcome = g.grade::<&str>("", "1 + 1 = 2", &[]);
        match outcome {
            GradeOutcome::Rejected(r) => {
                assert!(!r.success);
                assert!(r.error.contains("principal unknown"));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_request_policy_overrides() {
        let g = Grader::default();
        let mut req = GradeRequest {
            question: "q".into(),
            correct_answer: "x^2 = 4".into(),
            student_steps: vec!["x = 2".into()],
            policy: None,
        };
        assert!(!report(g.grade_request(&req)).steps[0].is_valid);
        req.policy = Some(RootPolicy::Any);
        let r = report(g.grade_request(&req));
        assert!(r.steps[0].is_valid);
        assert!(r.final_correct);
        assert_eq!(r.score, 100.0);
    }

    #[test]
    fn test_solve_summary() {
        let g = Grader::default();
        let s = g.solve("x^2 - 5x + 6 = 0", None).unwrap();
        assert_eq!(s.variable, "x");
        assert_eq!(s.outcome, "solved");
        assert_eq!(s.solutions, vec!["2", "3"]);

        let s = g.solve("a x = 6", Some('a')).unwrap();
        assert_eq!(s.solutions, vec!["6/x"]);

        assert_eq!(
            g.solve("x = 1", Some('w')),
            Err(GradeError::UnknownVariable("w".into()))
        );
        assert!(matches!(
            g.solve("x + 1", None),
            Err(GradeError::UnparseableEquation(_))
        ));
    }
}
