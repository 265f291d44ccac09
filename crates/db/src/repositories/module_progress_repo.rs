//! Repository for the `module_progress` table.

use lingua_core::activity::{apply_activity, ActivityOutcome};
use lingua_core::advancement::{find_standing, AdvancementPolicy, ModuleStanding};
use lingua_core::modules::LearningModule;
use lingua_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::PgPool;

use crate::models::decode_err;
use crate::models::module_progress::ModuleProgress;
use crate::models::user::User;
use crate::repositories::user_repo::COLUMNS as USER_COLUMNS;
use crate::repositories::{PgTx, UserRepo};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, module, score, total_attempts, correct_attempts, \
                       last_activity_at, created_at, updated_at";

/// Result of folding one attempt into a learner's progress.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityRecorded {
    pub progress: ModuleProgress,
    /// Refreshed eligibility cache after the attempt.
    pub can_advance: bool,
}

/// Provides reads, lazy creation and in-place resets of module progress.
pub struct ModuleProgressRepo;

impl ModuleProgressRepo {
    /// List every module record for a learner, ordered by ID.
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<ModuleProgress>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM module_progress WHERE user_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, ModuleProgress>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Find the record for one module, if the learner has practised it.
    pub async fn find_by_user_and_module(
        pool: &PgPool,
        user_id: DbId,
        module: LearningModule,
    ) -> Result<Option<ModuleProgress>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM module_progress WHERE user_id = $1 AND module = $2"
        );
        sqlx::query_as::<_, ModuleProgress>(&query)
            .bind(user_id)
            .bind(module.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Load a learner's standings as domain values.
    pub async fn standings(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<ModuleStanding>, sqlx::Error> {
        let rows = Self::list_by_user(pool, user_id).await?;
        to_standings(&rows)
    }

    /// Load a learner together with their standings from one snapshot.
    ///
    /// Both reads share a repeatable-read transaction, so a concurrently
    /// committing advancement is seen either entirely or not at all.
    /// Returns `None` if the learner does not exist.
    pub async fn load_learner_state(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<(User, Vec<ModuleStanding>)>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let Some(user) = sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let query = format!(
            "SELECT {COLUMNS} FROM module_progress WHERE user_id = $1 ORDER BY id"
        );
        let rows = sqlx::query_as::<_, ModuleProgress>(&query)
            .bind(user_id)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some((user, to_standings(&rows)?)))
    }

    /// Load and lock a learner's standings inside a transaction.
    pub async fn standings_for_update(
        tx: &mut PgTx<'_>,
        user_id: DbId,
    ) -> Result<Vec<ModuleStanding>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM module_progress WHERE user_id = $1 ORDER BY id FOR UPDATE"
        );
        let rows = sqlx::query_as::<_, ModuleProgress>(&query)
            .bind(user_id)
            .fetch_all(&mut **tx)
            .await?;
        to_standings(&rows)
    }

    /// Write a standing, creating the record on first activity.
    pub async fn upsert(
        tx: &mut PgTx<'_>,
        user_id: DbId,
        standing: &ModuleStanding,
    ) -> Result<ModuleProgress, sqlx::Error> {
        let query = format!(
            "INSERT INTO module_progress
                (user_id, module, score, total_attempts, correct_attempts, last_activity_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (user_id, module) DO UPDATE SET
                score = EXCLUDED.score,
                total_attempts = EXCLUDED.total_attempts,
                correct_attempts = EXCLUDED.correct_attempts,
                last_activity_at = EXCLUDED.last_activity_at
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ModuleProgress>(&query)
            .bind(user_id)
            .bind(standing.module.as_str())
            .bind(standing.score)
            .bind(standing.total_attempts)
            .bind(standing.correct_attempts)
            .bind(standing.last_activity_at)
            .fetch_one(&mut **tx)
            .await
    }

    /// Reset the scored modules to their zero state in place.
    ///
    /// The conversation record keeps accumulating across levels. Returns the
    /// number of records reset.
    pub async fn reset_scored(tx: &mut PgTx<'_>, user_id: DbId) -> Result<u64, sqlx::Error> {
        let scored: Vec<&str> = LearningModule::SCORED.iter().map(|m| m.as_str()).collect();
        let result = sqlx::query(
            "UPDATE module_progress SET score = NULL, total_attempts = 0, correct_attempts = 0 \
             WHERE user_id = $1 AND module = ANY($2)",
        )
        .bind(user_id)
        .bind(&scored)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    /// Record one practice attempt and refresh the learner's eligibility cache.
    ///
    /// Runs in a single transaction holding the learner's row lock, so it
    /// cannot interleave with an advancement. Returns `None` if the learner
    /// does not exist.
    pub async fn record_activity(
        pool: &PgPool,
        user_id: DbId,
        module: LearningModule,
        outcome: &ActivityOutcome,
        policy: &AdvancementPolicy,
        now: Timestamp,
    ) -> Result<Option<ActivityRecorded>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(user) = UserRepo::lock_for_update(&mut tx, user_id).await? else {
            return Ok(None);
        };

        let mut standings = Self::standings_for_update(&mut tx, user_id).await?;
        let current = find_standing(&standings, module)
            .cloned()
            .unwrap_or_else(|| ModuleStanding::untouched(module));
        let updated = apply_activity(&current, outcome, now);
        let progress = Self::upsert(&mut tx, user_id, &updated).await?;

        standings.retain(|s| s.module != module);
        standings.push(updated);
        let can_advance = eligible_to_advance(&user, policy, &standings)?;
        UserRepo::set_can_advance(&mut tx, user_id, can_advance, now).await?;

        tx.commit().await?;

        tracing::debug!(
            user_id,
            module = %module,
            total_attempts = progress.total_attempts,
            can_advance,
            "Recorded module activity",
        );

        Ok(Some(ActivityRecorded {
            progress,
            can_advance,
        }))
    }
}

fn to_standings(rows: &[ModuleProgress]) -> Result<Vec<ModuleStanding>, sqlx::Error> {
    rows.iter()
        .map(|row| row.standing().map_err(decode_err))
        .collect()
}

/// Policy verdict combined with the level ceiling.
fn eligible_to_advance(
    user: &User,
    policy: &AdvancementPolicy,
    standings: &[ModuleStanding],
) -> Result<bool, sqlx::Error> {
    let level = user.cefr_level().map_err(decode_err)?;
    Ok(level.next().is_some() && policy.evaluate(standings).eligible)
}
