//! Read-only progress reports built from pre-loaded learner state.
//!
//! [`build_progress_summary`] and [`ModuleDetail::from_standing`] are pure:
//! the caller loads the learner and module records and supplies "now", so
//! two calls with identical inputs always yield identical reports.

use serde::Serialize;

use crate::advancement::{
    conversation_messages, find_standing, AdvancementPolicy, ModuleStanding,
};
use crate::cefr::CefrLevel;
use crate::clock::whole_days_between;
use crate::modules::LearningModule;
use crate::types::{DbId, Timestamp};

/// Message returned for a module the learner has never practised.
pub const NO_ACTIVITY_MESSAGE: &str = "No activity in this module yet";

/// The learner fields a progress summary needs.
#[derive(Debug, Clone, PartialEq)]
pub struct LearnerSnapshot {
    pub id: DbId,
    pub target_language: Option<String>,
    pub level: CefrLevel,
    pub level_started_at: Option<Timestamp>,
    pub total_xp: i64,
}

/// Breakdown of one scored module, with the thresholds it is judged against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleProgressView {
    pub module: LearningModule,
    pub score: Option<f64>,
    pub total_attempts: i32,
    pub correct_attempts: i32,
    pub last_activity_at: Option<Timestamp>,
    pub score_threshold: f64,
    pub attempts_threshold: i32,
    pub meets_threshold: bool,
    pub meets_minimum_attempts: bool,
    /// Progress towards this module's gate, 0-100.
    pub progress_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationEngagement {
    pub total_messages: i32,
    pub required_messages: i32,
    pub meets_threshold: bool,
    pub progress_pct: f64,
}

/// Snapshot of a learner's standing at their current level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub user_id: DbId,
    pub target_language: Option<String>,
    pub current_level: CefrLevel,
    /// `None` once the learner is at the highest level.
    pub next_level: Option<CefrLevel>,
    pub can_advance: bool,
    pub advancement_reason: String,
    pub unmet_conditions: Vec<String>,
    /// Mean progress across all five gates, 0-100.
    pub overall_progress: f64,
    pub modules: Vec<ModuleProgressView>,
    pub conversation_engagement: ConversationEngagement,
    /// Whole days at the current level; `None` if the start was never set.
    pub time_at_current_level: Option<i64>,
    pub level_started_at: Option<Timestamp>,
    pub total_xp: i64,
}

/// Current state of a single module, including the never-practised case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleDetail {
    pub module: LearningModule,
    pub current_score: Option<f64>,
    pub total_attempts: i32,
    pub correct_attempts: i32,
    pub last_activity_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ModuleDetail {
    pub fn from_standing(module: LearningModule, standing: Option<&ModuleStanding>) -> Self {
        match standing {
            Some(s) => Self {
                module,
                current_score: s.score,
                total_attempts: s.total_attempts,
                correct_attempts: s.correct_attempts,
                last_activity_at: s.last_activity_at,
                message: None,
            },
            None => Self {
                module,
                current_score: None,
                total_attempts: 0,
                correct_attempts: 0,
                last_activity_at: None,
                message: Some(NO_ACTIVITY_MESSAGE.to_string()),
            },
        }
    }
}

/// Fraction of `required` reached, capped at 1. A zero requirement counts as met.
fn ratio(value: f64, required: f64) -> f64 {
    if required <= 0.0 {
        return 1.0;
    }
    (value / required).clamp(0.0, 1.0)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn module_view(policy: &AdvancementPolicy, module: LearningModule, standings: &[ModuleStanding]) -> ModuleProgressView {
    let standing = find_standing(standings, module);
    let score = standing.and_then(|s| s.score);
    let total_attempts = standing.map(|s| s.total_attempts).unwrap_or(0);

    // Half the gate is the score, half the attempt count.
    let progress = 50.0 * ratio(score.unwrap_or(0.0), policy.score_threshold)
        + 50.0 * ratio(f64::from(total_attempts), f64::from(policy.min_attempts));

    ModuleProgressView {
        module,
        score,
        total_attempts,
        correct_attempts: standing.map(|s| s.correct_attempts).unwrap_or(0),
        last_activity_at: standing.and_then(|s| s.last_activity_at),
        score_threshold: policy.score_threshold,
        attempts_threshold: policy.min_attempts,
        meets_threshold: policy.meets_score(standing),
        meets_minimum_attempts: policy.meets_attempts(standing),
        progress_pct: round1(progress),
    }
}

/// Assemble the progress summary for a learner.
pub fn build_progress_summary(
    learner: &LearnerSnapshot,
    standings: &[ModuleStanding],
    policy: &AdvancementPolicy,
    now: Timestamp,
) -> ProgressSummary {
    let verdict = policy.evaluate(standings);
    let next_level = learner.level.next();
    let can_advance = verdict.eligible && next_level.is_some();

    let modules: Vec<ModuleProgressView> = LearningModule::SCORED
        .iter()
        .map(|module| module_view(policy, *module, standings))
        .collect();

    let total_messages = conversation_messages(standings);
    let conversation_engagement = ConversationEngagement {
        total_messages,
        required_messages: policy.min_conversation_messages,
        meets_threshold: total_messages >= policy.min_conversation_messages,
        progress_pct: round1(
            100.0
                * ratio(
                    f64::from(total_messages),
                    f64::from(policy.min_conversation_messages),
                ),
        ),
    };

    let gate_count = (modules.len() + 1) as f64;
    let overall_progress = round1(
        (modules.iter().map(|m| m.progress_pct).sum::<f64>() + conversation_engagement.progress_pct)
            / gate_count,
    );

    let unmet_conditions = verdict.unmet_messages();
    let advancement_reason = match next_level {
        None => format!("{} is the highest level", learner.level),
        Some(next) if can_advance => format!("Ready to advance to {next}!"),
        Some(_) => format!("Keep practicing: {}", unmet_conditions.join("; ")),
    };

    ProgressSummary {
        user_id: learner.id,
        target_language: learner.target_language.clone(),
        current_level: learner.level,
        next_level,
        can_advance,
        advancement_reason,
        unmet_conditions,
        overall_progress,
        modules,
        conversation_engagement,
        time_at_current_level: learner
            .level_started_at
            .map(|start| whole_days_between(Some(start), now)),
        level_started_at: learner.level_started_at,
        total_xp: learner.total_xp,
    }
}
