//! Repository for the append-only `level_history` table.

use lingua_core::advancement::ModuleStanding;
use lingua_core::types::DbId;
use sqlx::PgPool;

use crate::models::level_history::{CreateLevelHistory, LevelHistory};
use crate::repositories::PgTx;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, level, \
    vocabulary_score, grammar_score, writing_score, phonetics_score, \
    vocabulary_attempts, grammar_attempts, writing_attempts, phonetics_attempts, \
    conversation_messages, started_at, completed_at, days_at_level, weighted_score, \
    xp_awarded, created_at";

/// Provides archival inserts and chronological reads of level completions.
pub struct LevelHistoryRepo;

impl LevelHistoryRepo {
    /// Archive a completed level. Only called from the advancement transaction.
    pub async fn create(
        tx: &mut PgTx<'_>,
        input: &CreateLevelHistory,
    ) -> Result<LevelHistory, sqlx::Error> {
        let query = format!(
            "INSERT INTO level_history
                (user_id, level,
                 vocabulary_score, grammar_score, writing_score, phonetics_score,
                 vocabulary_attempts, grammar_attempts, writing_attempts, phonetics_attempts,
                 conversation_messages, started_at, completed_at, days_at_level,
                 weighted_score, xp_awarded)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LevelHistory>(&query)
            .bind(input.user_id)
            .bind(input.level.as_str())
            .bind(score(&input.vocabulary))
            .bind(score(&input.grammar))
            .bind(score(&input.writing))
            .bind(score(&input.phonetics))
            .bind(attempts(&input.vocabulary))
            .bind(attempts(&input.grammar))
            .bind(attempts(&input.writing))
            .bind(attempts(&input.phonetics))
            .bind(input.conversation_messages)
            .bind(input.started_at)
            .bind(input.completed_at)
            .bind(input.days_at_level)
            .bind(input.weighted_score)
            .bind(input.xp_awarded)
            .fetch_one(&mut **tx)
            .await
    }

    /// All completions for a learner, oldest first.
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<LevelHistory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM level_history
             WHERE user_id = $1
             ORDER BY completed_at ASC, id ASC"
        );
        sqlx::query_as::<_, LevelHistory>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}

fn score(standing: &Option<ModuleStanding>) -> Option<f64> {
    standing.as_ref().and_then(|s| s.score)
}

fn attempts(standing: &Option<ModuleStanding>) -> i32 {
    standing.as_ref().map(|s| s.total_attempts).unwrap_or(0)
}
