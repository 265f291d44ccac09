//! Level advancement policy.
//!
//! Pure evaluation of whether a learner may advance to the next CEFR level,
//! plus the fixed formulas applied when they do (weighted score, XP award).
//! No database dependencies: callers load module standings and pass them in.
//!
//! The same [`AdvancementPolicy::evaluate`] call backs both the read-only
//! progress summary and the advancement transaction, which re-runs it under
//! a row lock instead of trusting the cached `can_advance` flag.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cefr::CefrLevel;
use crate::error::CoreError;
use crate::modules::LearningModule;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Minimum score (percent) each scored module must reach.
pub const DEFAULT_SCORE_THRESHOLD: f64 = 85.0;

/// Minimum attempts each scored module must have.
pub const DEFAULT_MIN_ATTEMPTS: i32 = 10;

/// Minimum conversation messages sent at the current level.
pub const DEFAULT_MIN_CONVERSATION_MESSAGES: i32 = 20;

/// XP awarded for completing A1, A2, B1, B2 and C1 respectively.
///
/// C2 is terminal and has no award.
pub const DEFAULT_XP_AWARDS: [i64; 5] = [100, 150, 200, 300, 400];

/// Each scored module contributes a quarter of the weighted score.
pub const DEFAULT_MODULE_WEIGHT: f64 = 0.25;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Current accumulators for one module, as loaded from storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleStanding {
    pub module: LearningModule,
    pub score: Option<f64>,
    pub total_attempts: i32,
    pub correct_attempts: i32,
    pub last_activity_at: Option<Timestamp>,
}

impl ModuleStanding {
    /// The zero state of a module nobody has practised yet.
    pub fn untouched(module: LearningModule) -> Self {
        Self {
            module,
            score: None,
            total_attempts: 0,
            correct_attempts: 0,
            last_activity_at: None,
        }
    }
}

/// Look up the standing for `module`, if a record exists.
pub fn find_standing(
    standings: &[ModuleStanding],
    module: LearningModule,
) -> Option<&ModuleStanding> {
    standings.iter().find(|s| s.module == module)
}

/// Conversation engagement is the attempt count of the conversation module.
pub fn conversation_messages(standings: &[ModuleStanding]) -> i32 {
    find_standing(standings, LearningModule::Conversation)
        .map(|s| s.total_attempts)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// A single advancement requirement the learner does not meet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum UnmetCondition {
    /// The module has no score yet (never practised, or reset).
    NoScore { module: LearningModule },
    ScoreBelowThreshold {
        module: LearningModule,
        score: f64,
        threshold: f64,
    },
    InsufficientAttempts {
        module: LearningModule,
        attempts: i32,
        required: i32,
    },
    InsufficientMessages { messages: i32, required: i32 },
}

impl fmt::Display for UnmetCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoScore { module } => write!(f, "{module}: no score recorded"),
            Self::ScoreBelowThreshold {
                module,
                score,
                threshold,
            } => write!(
                f,
                "{module}: score below threshold ({score:.1} < {threshold:.1})"
            ),
            Self::InsufficientAttempts {
                module,
                attempts,
                required,
            } => write!(
                f,
                "{module}: insufficient attempts ({attempts} < {required})"
            ),
            Self::InsufficientMessages { messages, required } => write!(
                f,
                "conversation: insufficient messages ({messages} < {required})"
            ),
        }
    }
}

/// Outcome of evaluating the policy against a learner's standings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvancementVerdict {
    pub eligible: bool,
    pub unmet: Vec<UnmetCondition>,
}

impl AdvancementVerdict {
    /// One human-readable line per unmet condition, in evaluation order.
    pub fn unmet_messages(&self) -> Vec<String> {
        self.unmet.iter().map(ToString::to_string).collect()
    }

    /// Convert an ineligible verdict into the error the caller surfaces.
    pub fn into_error(self) -> CoreError {
        CoreError::NotEligible(self.unmet_messages())
    }
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Per-module weights used for the archived weighted score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModuleWeights {
    pub vocabulary: f64,
    pub grammar: f64,
    pub writing: f64,
    pub phonetics: f64,
}

impl Default for ModuleWeights {
    fn default() -> Self {
        Self {
            vocabulary: DEFAULT_MODULE_WEIGHT,
            grammar: DEFAULT_MODULE_WEIGHT,
            writing: DEFAULT_MODULE_WEIGHT,
            phonetics: DEFAULT_MODULE_WEIGHT,
        }
    }
}

impl ModuleWeights {
    /// Weight for a scored module; conversation carries no weight.
    pub fn weight_for(&self, module: LearningModule) -> f64 {
        match module {
            LearningModule::Vocabulary => self.vocabulary,
            LearningModule::Grammar => self.grammar,
            LearningModule::Writing => self.writing,
            LearningModule::Phonetics => self.phonetics,
            LearningModule::Conversation => 0.0,
        }
    }

    fn sum(&self) -> f64 {
        self.vocabulary + self.grammar + self.writing + self.phonetics
    }
}

/// Thresholds and rewards governing level advancement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancementPolicy {
    pub score_threshold: f64,
    pub min_attempts: i32,
    pub min_conversation_messages: i32,
    /// XP for completing A1..C1, indexed by level order.
    pub xp_awards: [i64; 5],
    pub weights: ModuleWeights,
}

impl Default for AdvancementPolicy {
    fn default() -> Self {
        Self {
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            min_attempts: DEFAULT_MIN_ATTEMPTS,
            min_conversation_messages: DEFAULT_MIN_CONVERSATION_MESSAGES,
            xp_awards: DEFAULT_XP_AWARDS,
            weights: ModuleWeights::default(),
        }
    }
}

impl AdvancementPolicy {
    /// Reject configurations that would make the gate meaningless.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.score_threshold.is_finite() || !(0.0..=100.0).contains(&self.score_threshold) {
            return Err(CoreError::Validation(format!(
                "score threshold must be between 0 and 100, got {}",
                self.score_threshold
            )));
        }
        if self.min_attempts < 0 || self.min_conversation_messages < 0 {
            return Err(CoreError::Validation(
                "attempt and message thresholds must not be negative".to_string(),
            ));
        }
        if self.xp_awards.iter().any(|xp| *xp < 0) {
            return Err(CoreError::Validation(
                "XP awards must not be negative".to_string(),
            ));
        }
        let weights = [
            self.weights.vocabulary,
            self.weights.grammar,
            self.weights.writing,
            self.weights.phonetics,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(CoreError::Validation(
                "module weights must be finite and non-negative".to_string(),
            ));
        }
        if (self.weights.sum() - 1.0).abs() > 1e-9 {
            return Err(CoreError::Validation(format!(
                "module weights must sum to 1.0, got {}",
                self.weights.sum()
            )));
        }
        Ok(())
    }

    /// Whether a single scored module meets the score requirement.
    pub fn meets_score(&self, standing: Option<&ModuleStanding>) -> bool {
        standing
            .and_then(|s| s.score)
            .is_some_and(|score| score >= self.score_threshold)
    }

    /// Whether a single scored module meets the attempts requirement.
    pub fn meets_attempts(&self, standing: Option<&ModuleStanding>) -> bool {
        standing.map(|s| s.total_attempts).unwrap_or(0) >= self.min_attempts
    }

    /// Evaluate every advancement condition.
    ///
    /// All conditions must hold; every failing one is reported, scored
    /// modules first (score before attempts), conversation last.
    pub fn evaluate(&self, standings: &[ModuleStanding]) -> AdvancementVerdict {
        let mut unmet = Vec::new();

        for module in LearningModule::SCORED {
            let standing = find_standing(standings, module);

            match standing.and_then(|s| s.score) {
                None => unmet.push(UnmetCondition::NoScore { module }),
                Some(score) if score < self.score_threshold => {
                    unmet.push(UnmetCondition::ScoreBelowThreshold {
                        module,
                        score,
                        threshold: self.score_threshold,
                    })
                }
                Some(_) => {}
            }

            if !self.meets_attempts(standing) {
                unmet.push(UnmetCondition::InsufficientAttempts {
                    module,
                    attempts: standing.map(|s| s.total_attempts).unwrap_or(0),
                    required: self.min_attempts,
                });
            }
        }

        let messages = conversation_messages(standings);
        if messages < self.min_conversation_messages {
            unmet.push(UnmetCondition::InsufficientMessages {
                messages,
                required: self.min_conversation_messages,
            });
        }

        AdvancementVerdict {
            eligible: unmet.is_empty(),
            unmet,
        }
    }

    /// Weighted score archived with a completed level.
    ///
    /// Sum of `weight * score` over the scored modules; a module without a
    /// score contributes zero. Rounded to two decimals.
    pub fn weighted_score(&self, standings: &[ModuleStanding]) -> f64 {
        let total: f64 = LearningModule::SCORED
            .iter()
            .map(|module| {
                let score = find_standing(standings, *module)
                    .and_then(|s| s.score)
                    .unwrap_or(0.0);
                self.weights.weight_for(*module) * score
            })
            .sum();
        (total * 100.0).round() / 100.0
    }

    /// XP awarded for completing `level`; `None` for the terminal level.
    pub fn xp_award(&self, level: CefrLevel) -> Option<i64> {
        match level {
            CefrLevel::A1 => Some(self.xp_awards[0]),
            CefrLevel::A2 => Some(self.xp_awards[1]),
            CefrLevel::B1 => Some(self.xp_awards[2]),
            CefrLevel::B2 => Some(self.xp_awards[3]),
            CefrLevel::C1 => Some(self.xp_awards[4]),
            CefrLevel::C2 => None,
        }
    }
}

/// Message shown to a learner who just advanced.
pub fn celebration_message(completed: CefrLevel, reached: CefrLevel, xp: i64) -> String {
    if reached.is_max() {
        format!(
            "You completed {completed} and reached {reached}, the highest level. +{xp} XP!"
        )
    } else {
        format!("You completed {completed} and advanced to {reached}. +{xp} XP!")
    }
}
