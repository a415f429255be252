//! Data models for grading requests and reports.
//!
//! These are the plain-data shapes that cross the core boundary. Their
//! JSON form is the wire contract of the HTTP API and of `--json` CLI
//! output.

use serde::{Deserialize, Serialize};

use crate::check::{RootPolicy, StepReason};

/// A grading request as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRequest {
    /// Display-only question text.
    #[serde(default)]
    pub question: String,
    /// The reference answer, one equation.
    pub correct_answer: String,
    /// The student's steps in submission order.
    #[serde(default)]
    pub student_steps: Vec<String>,
    /// Overrides the grader's configured policy when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<RootPolicy>,
}

/// The verdict for one submitted step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// Zero-based position in the submission.
    pub index: usize,
    /// The step exactly as submitted.
    pub step: String,
    pub is_valid: bool,
    /// Machine-readable classification.
    pub code: StepReason,
    /// Human-readable explanation.
    pub reason: String,
}

impl StepResult {
    pub fn new(index: usize, step: impl Into<String>, reason: StepReason) -> Self {
        Self {
            index,
            step: step.into(),
            is_valid: reason.is_valid(),
            code: reason,
            reason: reason.message().to_string(),
        }
    }
}

/// A complete grading report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingReport {
    /// Always `true` for a report.
    pub success: bool,
    pub question: String,
    pub correct_answer: String,
    /// The principal unknown.
    pub variable: String,
    /// Reference solutions as display strings.
    pub solutions: Vec<String>,
    pub steps: Vec<StepResult>,
    pub first_wrong_step_index: Option<usize>,
    pub final_correct: bool,
    /// Score in `[0, 100]`, rounded to two decimals.
    pub score: f64,
}

/// A request rejected before any step was checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeRejection {
    /// Always `false` for a rejection.
    pub success: bool,
    pub error: String,
}

impl GradeRejection {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Either a full report or a rejection; serializes without a tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GradeOutcome {
    Report(GradingReport),
    Rejected(GradeRejection),
}

impl GradeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, GradeOutcome::Report(_))
    }

    pub fn report(&self) -> Option<&GradingReport> {
        match self {
            GradeOutcome::Report(r) => Some(r),
            GradeOutcome::Rejected(_) => None,
        }
    }
}

/// Result of solving a single equation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveSummary {
    pub variable: String,
    /// `solved`, or why the equation could not be solved.
    pub outcome: String,
    pub solutions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let req: GradeRequest = serde_json::from_str(r#"{"correct_answer":"x = 2"}"#).unwrap();
        assert_eq!(req.question, "");
        assert!(req.student_steps.is_empty());
        assert_eq!(req.policy, None);

        let req: GradeRequest =
            serde_json::from_str(r#"{"correct_answer":"x = 2","policy":"any"}"#).unwrap();
        assert_eq!(req.policy, Some(RootPolicy::Any));
    }

    #[test]
    fn test_step_result_fields() {
        let r = StepResult::new(1, "2x = 5", StepReason::Inconsistent);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["index"], 1);
        assert_eq!(json["is_valid"], false);
        assert_eq!(json["code"], "inconsistent");
        assert_eq!(
            json["reason"],
            "step is inconsistent with the reference solution"
        );
    }

    #[test]
    fn test_rejection_shape() {
        let outcome = GradeOutcome::Rejected(GradeRejection::new("bad answer"));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "error": "bad answer"}));
        assert!(json.get("steps").is_none());
    }

    #[test]
    fn test_report_null_first_wrong() {
        let outcome = GradeOutcome::Report(GradingReport {
            success: true,
            question: String::new(),
            correct_answer: "x = 1".into(),
            variable: "x".into(),
            solutions: vec!["1".into()],
            steps: vec![],
            first_wrong_step_index: None,
            final_correct: false,
            score: 0.0,
        });
        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json["first_wrong_step_index"].is_null());

        let back: GradeOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(back, outcome);
    }
}
