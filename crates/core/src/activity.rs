//! Folding a single practice attempt into a module's accumulators.

use serde::Deserialize;

use crate::advancement::ModuleStanding;
use crate::error::CoreError;
use crate::modules::{LearningModule, ScoringKind};
use crate::types::Timestamp;

pub const MIN_ACTIVITY_SCORE: f64 = 0.0;
pub const MAX_ACTIVITY_SCORE: f64 = 100.0;

/// Result of one practice attempt reported by a content module.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ActivityOutcome {
    /// Whether the attempt was answered correctly.
    #[serde(default)]
    pub correct: bool,
    /// Graded score (0-100). Required for writing and phonetics, ignored
    /// elsewhere.
    pub score: Option<f64>,
}

/// Check an outcome against the module's scoring rules.
pub fn validate_outcome(module: LearningModule, outcome: &ActivityOutcome) -> Result<(), CoreError> {
    if let Some(score) = outcome.score {
        if !score.is_finite() || !(MIN_ACTIVITY_SCORE..=MAX_ACTIVITY_SCORE).contains(&score) {
            return Err(CoreError::Validation(format!(
                "score must be between {MIN_ACTIVITY_SCORE} and {MAX_ACTIVITY_SCORE}, got {score}"
            )));
        }
    }
    if module.scoring_kind() == ScoringKind::GradedAverage && outcome.score.is_none() {
        return Err(CoreError::Validation(format!(
            "{module} activity requires a graded score"
        )));
    }
    Ok(())
}

/// Apply one attempt to `current`, returning the updated standing.
///
/// The outcome must already have passed [`validate_outcome`].
pub fn apply_activity(
    current: &ModuleStanding,
    outcome: &ActivityOutcome,
    at: Timestamp,
) -> ModuleStanding {
    let total_attempts = current.total_attempts + 1;
    let correct_attempts = current.correct_attempts + i32::from(outcome.correct);

    let score = match current.module.scoring_kind() {
        ScoringKind::Accuracy => Some(accuracy(correct_attempts, total_attempts)),
        ScoringKind::GradedAverage => {
            let submitted = outcome.score.unwrap_or(0.0);
            let mean = match current.score {
                Some(previous) if current.total_attempts > 0 => {
                    incremental_mean(previous, submitted, total_attempts)
                }
                _ => submitted,
            };
            Some(mean.clamp(MIN_ACTIVITY_SCORE, MAX_ACTIVITY_SCORE))
        }
        ScoringKind::Engagement => None,
    };

    ModuleStanding {
        module: current.module,
        score,
        total_attempts,
        correct_attempts,
        last_activity_at: Some(at),
    }
}

/// Percentage of correct attempts, unrounded.
fn accuracy(correct: i32, total: i32) -> f64 {
    f64::from(correct) / f64::from(total) * 100.0
}

/// Online mean: `old + (new - old) / count`.
fn incremental_mean(old_avg: f64, new_value: f64, new_count: i32) -> f64 {
    old_avg + (new_value - old_avg) / f64::from(new_count)
}
