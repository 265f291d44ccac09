//! Per-module progress accumulator model.

use lingua_core::advancement::ModuleStanding;
use lingua_core::error::CoreError;
use lingua_core::modules::LearningModule;
use lingua_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `module_progress` table. One per (user, module).
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ModuleProgress {
    pub id: DbId,
    pub user_id: DbId,
    pub module: String,
    pub score: Option<f64>,
    pub total_attempts: i32,
    pub correct_attempts: i32,
    pub last_activity_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ModuleProgress {
    pub fn learning_module(&self) -> Result<LearningModule, CoreError> {
        LearningModule::from_str_value(&self.module)
    }

    pub fn standing(&self) -> Result<ModuleStanding, CoreError> {
        Ok(ModuleStanding {
            module: self.learning_module()?,
            score: self.score,
            total_attempts: self.total_attempts,
            correct_attempts: self.correct_attempts,
            last_activity_at: self.last_activity_at,
        })
    }
}
