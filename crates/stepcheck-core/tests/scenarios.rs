//! End-to-end grading scenarios and properties of the grading pipeline.

use proptest::prelude::*;

use stepcheck_core::check::{RootPolicy, StepReason};
use stepcheck_core::grader::Grader;
use stepcheck_core::models::{GradeOutcome, GradingReport};
use stepcheck_core::normalize::normalize;

fn report(outcome: GradeOutcome) -> GradingReport {
    match outcome {
        GradeOutcome::Report(r) => r,
        GradeOutcome::Rejected(r) => panic!("unexpected rejection: {}", r.error),
    }
}

#[test]
fn test_all_steps_valid() {
    let r = report(Grader::default().grade(
        "Solve 2x + 3 = 7",
        "x = 2",
        &["2x + 3 = 7", "2x = 4", "x = 2"],
    ));
    assert!(r.success);
    assert_eq!(r.variable, "x");
    assert_eq!(r.solutions, vec!["2"]);
    assert!(r.steps.iter().all(|s| s.is_valid));
    assert_eq!(r.first_wrong_step_index, None);
    assert!(r.final_correct);
    assert_eq!(r.score, 100.0);
}

#[test]
fn test_middle_step_wrong() {
    let r = report(Grader::default().grade(
        "",
        "x = 2",
        &["2x + 3 = 7", "2x = 5", "x = 2"],
    ));
    assert!(!r.steps[1].is_valid);
    assert_eq!(r.steps[1].code, StepReason::Inconsistent);
    assert_eq!(r.first_wrong_step_index, Some(1));
    assert!(r.final_correct);
    assert_eq!(r.score, 73.33);
}

#[test]
fn test_garbled_step() {
    let r = report(Grader::default().grade("", "x = 2", &["garbled text"]));
    assert!(!r.steps[0].is_valid);
    assert_eq!(r.steps[0].code, StepReason::Unparseable);
    assert!(r.steps[0].reason.contains("could not parse"));
    assert_eq!(r.first_wrong_step_index, Some(0));
    assert!(!r.final_correct);
    assert_eq!(r.score, 0.0);
}

#[test]
fn test_answer_without_equals_rejected() {
    let outcome = Grader::default().grade("", "banana", &["x = 1"]);
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("correct answer"));
    assert!(json.get("steps").is_none());
}

#[test]
fn test_two_roots_policy() {
    let grader = Grader::default();
    let all = report(grader.grade("", "x**2 = 4", &["x = 2"]));
    assert_eq!(all.solutions, vec!["-2", "2"]);
    assert!(!all.steps[0].is_valid);
    assert!(!all.final_correct);

    let any = report(grader.grade_with_policy("", "x**2 = 4", &["x = 2"], RootPolicy::Any));
    assert!(any.steps[0].is_valid);
    assert!(any.final_correct);
}

#[test]
fn test_first_wrong_index_not_overwritten() {
    let r = report(Grader::default().grade(
        "",
        "x = 3",
        &["x + 1 = 4", "x = 5", "x = 7", "x = 3"],
    ));
    assert_eq!(r.first_wrong_step_index, Some(1));
    assert!(!r.steps[2].is_valid);
}

#[test]
fn test_indices_dense_and_steps_echoed() {
    let steps = ["3(x - 1) = 6", "3x - 3 = 6", "3x = 9", "x = 3"];
    let r = report(Grader::default().grade("", "x = 3", &steps));
    for (i, s) in r.steps.iter().enumerate() {
        assert_eq!(s.index, i);
        assert_eq!(s.step, steps[i]);
        assert!(s.is_valid, "step {} should be valid", i);
    }
}

#[test]
fn test_fractional_and_quadratic_work() {
    let r = report(Grader::default().grade(
        "",
        "x^2 - 5x + 6 = 0",
        &["(x - 2)(x - 3) = 0", "x^2 - 5x = -6"],
    ));
    assert_eq!(r.solutions, vec!["2", "3"]);
    assert!(r.steps.iter().all(|s| s.is_valid));

    let r = report(Grader::default().grade("", "x/2 + 1/3 = 1", &["x/2 = 2/3", "x = 4/3"]));
    assert_eq!(r.solutions, vec!["4/3"]);
    assert_eq!(r.score, 100.0);
}

#[test]
fn test_repeated_root_target() {
    let r = report(Grader::default().grade(
        "",
        "x^4 - 4x^2 + 4 = 0",
        &["(x^2 - 2)^2 = 0", "x^2 = 2"],
    ));
    assert_eq!(r.solutions.len(), 2);
    assert!(r.solutions.iter().all(|s| !s.contains('i')));
    assert!(r.steps.iter().all(|s| s.is_valid));
    assert!(r.final_correct);
    assert_eq!(r.score, 100.0);
}

#[test]
fn test_extreme_exponent_is_graded() {
    let r = report(Grader::default().grade("", "x = 2", &["x = 2**-9223372036854775808"]));
    assert_eq!(r.steps.len(), 1);
    assert!(!r.steps[0].is_valid);
}

#[test]
fn test_other_letters_treated_as_parameters() {
    // v = u + a t solved for v; steps rearranging it stay consistent
    let r = report(Grader::default().grade(
        "",
        "v = u + a t",
        &["v - u = a t", "v = a t + u"],
    ));
    assert_eq!(r.variable, "v");
    assert!(r.steps.iter().all(|s| s.is_valid));
}

fn step_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("x = 2".to_string()),
        Just("x = 3".to_string()),
        Just("2x = 4".to_string()),
        Just("2x + 3 = 7".to_string()),
        Just("x + 1 = 2".to_string()),
        Just("not an equation".to_string()),
        Just("x^2 = 4".to_string()),
        "[x0-9 =+*/^()-]{0,12}",
    ]
}

proptest! {
    #[test]
    fn prop_normalize_idempotent(s in ".*") {
        let once = normalize(&s);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn prop_score_bounded(steps in prop::collection::vec(step_strategy(), 0..6)) {
        let r = report(Grader::default().grade("", "x = 2", &steps));
        prop_assert!(r.score >= 0.0 && r.score <= 100.0);
        prop_assert_eq!(r.steps.len(), steps.len());
    }

    #[test]
    fn prop_deterministic(steps in prop::collection::vec(step_strategy(), 0..6)) {
        let grader = Grader::default();
        let a = serde_json::to_string(&grader.grade("q", "x = 2", &steps)).unwrap();
        let b = serde_json::to_string(&grader.grade("q", "x = 2", &steps)).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_fixing_a_step_never_lowers_score(
        steps in prop::collection::vec(step_strategy(), 1..6),
        pick in any::<prop::sample::Index>(),
    ) {
        let grader = Grader::default();
        let before = report(grader.grade("", "x = 2", &steps));
        let i = pick.index(steps.len());
        prop_assume!(!before.steps[i].is_valid);
        prop_assume!(i + 1 != steps.len());

        let mut fixed = steps.clone();
        fixed[i] = "2x = 4".to_string();
        let after = report(grader.grade("", "x = 2", &fixed));
        prop_assert!(after.score >= before.score);
    }
}

#[test]
fn test_zero_steps() {
    let r = report(Grader::default().grade::<&str>("", "x = 2", &[]));
    assert_eq!(r.score, 0.0);
    assert_eq!(r.first_wrong_step_index, None);
    assert!(!r.final_correct);
    assert!(r.steps.is_empty());
}
