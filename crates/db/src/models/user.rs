//! Learner entity model and DTOs.

use lingua_core::cefr::CefrLevel;
use lingua_core::error::CoreError;
use lingua_core::progress::LearnerSnapshot;
use lingua_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full row from the `users` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub external_id: Option<String>,
    pub target_language: Option<String>,
    /// Canonical CEFR text (`"A1"` .. `"C2"`).
    pub level: String,
    pub level_started_at: Option<Timestamp>,
    /// Cached result of the last policy evaluation. Display hint only.
    pub can_advance: bool,
    pub advancement_notified_at: Option<Timestamp>,
    pub total_xp: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    pub fn cefr_level(&self) -> Result<CefrLevel, CoreError> {
        CefrLevel::from_str_value(&self.level)
    }

    /// The fields the progress summary builder reads.
    pub fn snapshot(&self) -> Result<LearnerSnapshot, CoreError> {
        Ok(LearnerSnapshot {
            id: self.id,
            target_language: self.target_language.clone(),
            level: self.cefr_level()?,
            level_started_at: self.level_started_at,
            total_xp: self.total_xp,
        })
    }
}

/// DTO for registering a learner.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateUser {
    pub external_id: Option<String>,
    pub target_language: Option<String>,
    /// Starting level; defaults to A1.
    pub level: Option<CefrLevel>,
}
