//! Partial-credit scoring.
//!
//! `score = round((valid / total) * 80 + (final_correct ? 20 : 0), 2)`,
//! and `0` when there are no steps.

use crate::models::StepResult;

/// Points for stepwise validity.
pub const STEP_WEIGHT: f64 = 80.0;

/// Points for a correct final step.
pub const FINAL_BONUS: f64 = 20.0;

/// Fold step results into a score in `[0, 100]`.
pub fn aggregate(steps: &[StepResult], final_correct: bool) -> f64 {
    if steps.is_empty() {
        return 0.0;
    }
    let valid = steps.iter().filter(|s| s.is_valid).count();
    let base = valid as f64 / steps.len() as f64 * STEP_WEIGHT;
    let bonus = if final_correct { FINAL_BONUS } else { 0.0 };
    round2(base + bonus)
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::StepReason;

    fn result(index: usize, reason: StepReason) -> StepResult {
        StepResult::new(index, format!("step {}", index), reason)
    }

    #[test]
    fn test_no_steps() {
        assert_eq!(aggregate(&[], true), 0.0);
    }

    #[test]
    fn test_all_valid_with_bonus() {
        let steps: Vec<_> = (0..3).map(|i| result(i, StepReason::Consistent)).collect();
        assert_eq!(aggregate(&steps, true), 100.0);
        assert_eq!(aggregate(&steps, false), 80.0);
    }

    #[test]
    fn test_rounding() {
        let steps = vec![
            result(0, StepReason::Consistent),
            result(1, StepReason::Inconsistent),
            result(2, StepReason::Consistent),
        ];
        assert_eq!(aggregate(&steps, true), 73.33);
    }

    #[test]
    fn test_unverifiable_counts_as_valid() {
        let steps = vec![
            result(0, StepReason::Unverifiable),
            result(1, StepReason::Unparseable),
        ];
        assert_eq!(aggregate(&steps, false), 40.0);
    }
}
