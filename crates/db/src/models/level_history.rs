//! Archived level completion model.

use lingua_core::advancement::{find_standing, ModuleStanding};
use lingua_core::cefr::CefrLevel;
use lingua_core::modules::LearningModule;
use lingua_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `level_history` table. Written once, never updated.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct LevelHistory {
    pub id: DbId,
    pub user_id: DbId,
    pub level: String,
    pub vocabulary_score: Option<f64>,
    pub grammar_score: Option<f64>,
    pub writing_score: Option<f64>,
    pub phonetics_score: Option<f64>,
    pub vocabulary_attempts: i32,
    pub grammar_attempts: i32,
    pub writing_attempts: i32,
    pub phonetics_attempts: i32,
    pub conversation_messages: i32,
    pub started_at: Timestamp,
    pub completed_at: Timestamp,
    pub days_at_level: i32,
    pub weighted_score: f64,
    pub xp_awarded: i64,
    pub created_at: Timestamp,
}

/// Insert DTO, assembled by the advancement transaction.
#[derive(Debug, Clone)]
pub struct CreateLevelHistory {
    pub user_id: DbId,
    pub level: CefrLevel,
    pub vocabulary: Option<ModuleStanding>,
    pub grammar: Option<ModuleStanding>,
    pub writing: Option<ModuleStanding>,
    pub phonetics: Option<ModuleStanding>,
    pub conversation_messages: i32,
    pub started_at: Timestamp,
    pub completed_at: Timestamp,
    pub days_at_level: i32,
    pub weighted_score: f64,
    pub xp_awarded: i64,
}

impl CreateLevelHistory {
    /// Pick the four scored modules out of a learner's standings.
    #[allow(clippy::too_many_arguments)]
    pub fn from_standings(
        user_id: DbId,
        level: CefrLevel,
        standings: &[ModuleStanding],
        conversation_messages: i32,
        started_at: Timestamp,
        completed_at: Timestamp,
        days_at_level: i32,
        weighted_score: f64,
        xp_awarded: i64,
    ) -> Self {
        let pick = |module| find_standing(standings, module).cloned();
        Self {
            user_id,
            level,
            vocabulary: pick(LearningModule::Vocabulary),
            grammar: pick(LearningModule::Grammar),
            writing: pick(LearningModule::Writing),
            phonetics: pick(LearningModule::Phonetics),
            conversation_messages,
            started_at,
            completed_at,
            days_at_level,
            weighted_score,
            xp_awarded,
        }
    }
}
