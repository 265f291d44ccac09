//! The level advancement transaction.
//!
//! Archive, reset, promote and award happen in one PostgreSQL transaction
//! that starts by locking the learner row. Eligibility is re-evaluated
//! under that lock from the module records themselves; the cached
//! `can_advance` flag is never consulted.

use lingua_core::advancement::{conversation_messages, AdvancementPolicy, AdvancementVerdict};
use lingua_core::cefr::CefrLevel;
use lingua_core::clock::whole_days_between;
use lingua_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::PgPool;

use crate::models::decode_err;
use crate::models::level_history::{CreateLevelHistory, LevelHistory};
use crate::repositories::{LevelHistoryRepo, ModuleProgressRepo, UserRepo};

/// A committed advancement.
#[derive(Debug, Clone, Serialize)]
pub struct Advancement {
    pub previous_level: CefrLevel,
    pub new_level: CefrLevel,
    pub xp_awarded: i64,
    pub total_xp: i64,
    pub history: LevelHistory,
}

/// Every way an advancement attempt can end.
///
/// Only [`AdvanceOutcome::Advanced`] commits; every other variant rolls the
/// transaction back untouched.
#[derive(Debug, Clone)]
pub enum AdvanceOutcome {
    UserNotFound,
    AtMaxLevel(CefrLevel),
    Ineligible(AdvancementVerdict),
    Advanced(Box<Advancement>),
}

/// Runs the level advancement transaction.
pub struct AdvancementRepo;

impl AdvancementRepo {
    /// Advance a learner to the next CEFR level if they qualify.
    ///
    /// Concurrent calls for the same learner queue on the row lock; the
    /// second one sees the reset modules and comes back `Ineligible`, so XP
    /// is never awarded twice for one level.
    pub async fn advance(
        pool: &PgPool,
        user_id: DbId,
        policy: &AdvancementPolicy,
        now: Timestamp,
    ) -> Result<AdvanceOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(user) = UserRepo::lock_for_update(&mut tx, user_id).await? else {
            return Ok(AdvanceOutcome::UserNotFound);
        };

        let level = user.cefr_level().map_err(decode_err)?;
        let (Some(new_level), Some(xp)) = (level.next(), policy.xp_award(level)) else {
            return Ok(AdvanceOutcome::AtMaxLevel(level));
        };

        let standings = ModuleProgressRepo::standings_for_update(&mut tx, user_id).await?;
        let verdict = policy.evaluate(&standings);
        if !verdict.eligible {
            return Ok(AdvanceOutcome::Ineligible(verdict));
        }

        // A learner created before level tracking has no start; the level
        // is then archived as started and completed at the same instant.
        let started_at = user.level_started_at.unwrap_or(now);
        let days_at_level =
            i32::try_from(whole_days_between(user.level_started_at, now)).unwrap_or(i32::MAX);

        let history = LevelHistoryRepo::create(
            &mut tx,
            &CreateLevelHistory::from_standings(
                user_id,
                level,
                &standings,
                conversation_messages(&standings),
                started_at,
                now,
                days_at_level,
                policy.weighted_score(&standings),
                xp,
            ),
        )
        .await?;

        ModuleProgressRepo::reset_scored(&mut tx, user_id).await?;
        let updated = UserRepo::apply_advancement(&mut tx, user_id, new_level, now, xp).await?;

        tx.commit().await?;

        Ok(AdvanceOutcome::Advanced(Box::new(Advancement {
            previous_level: level,
            new_level,
            xp_awarded: xp,
            total_xp: updated.total_xp,
            history,
        })))
    }
}
