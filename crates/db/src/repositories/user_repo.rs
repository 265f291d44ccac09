//! Repository for the `users` table.

use lingua_core::cefr::CefrLevel;
use lingua_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::user::{CreateUser, User};
use crate::repositories::PgTx;

/// Column list shared across queries to avoid repetition.
pub(crate) const COLUMNS: &str = "id, external_id, target_language, level, level_started_at, \
                       can_advance, advancement_notified_at, total_xp, created_at, updated_at";

/// Provides learner creation, lookup and the row-level writes used by the
/// progress transactions.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new learner whose current level starts at `now`.
    pub async fn create(
        pool: &PgPool,
        input: &CreateUser,
        now: Timestamp,
    ) -> Result<User, sqlx::Error> {
        let level = input.level.unwrap_or(CefrLevel::A1);
        let query = format!(
            "INSERT INTO users (external_id, target_language, level, level_started_at)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.external_id)
            .bind(&input.target_language)
            .bind(level.as_str())
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Find a learner by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Return `true` if a learner with this ID exists.
    pub async fn exists(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Load a learner and hold a row lock until the transaction ends.
    ///
    /// Every write path that changes progress takes this lock first, so
    /// concurrent advancement and activity recording for one learner are
    /// serialised.
    pub async fn lock_for_update(
        tx: &mut PgTx<'_>,
        id: DbId,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Refresh the cached eligibility flag.
    ///
    /// `advancement_notified_at` is stamped the first time the learner is
    /// seen as eligible and left alone afterwards.
    pub async fn set_can_advance(
        tx: &mut PgTx<'_>,
        id: DbId,
        can_advance: bool,
        now: Timestamp,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                can_advance = $2,
                advancement_notified_at = CASE
                    WHEN $2 THEN COALESCE(advancement_notified_at, $3)
                    ELSE advancement_notified_at
                END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(can_advance)
            .bind(now)
            .fetch_one(&mut **tx)
            .await
    }

    /// Move the learner to `new_level`, restart the level clock, clear the
    /// eligibility cache and add `xp` to the running total.
    pub async fn apply_advancement(
        tx: &mut PgTx<'_>,
        id: DbId,
        new_level: CefrLevel,
        now: Timestamp,
        xp: i64,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                level = $2,
                level_started_at = $3,
                can_advance = FALSE,
                advancement_notified_at = NULL,
                total_xp = total_xp + $4
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(new_level.as_str())
            .bind(now)
            .bind(xp)
            .fetch_one(&mut **tx)
            .await
    }
}
