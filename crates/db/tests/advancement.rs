//! Integration tests for the level advancement transaction.
//!
//! Exercises `AdvancementRepo::advance` against a real database:
//! - Eligible learner is archived, reset, promoted and awarded XP atomically
//! - Ineligible and max-level learners are left untouched
//! - A statement failing mid-transaction rolls back every earlier write
//! - A second advancement right after the first is refused
//! - Concurrent advancements for one learner award XP once
//! - History comes back oldest first

use assert_matches::assert_matches;
use chrono::{Duration, TimeZone, Utc};
use lingua_core::advancement::{AdvancementPolicy, ModuleStanding};
use lingua_core::cefr::CefrLevel;
use lingua_core::modules::LearningModule;
use lingua_core::types::{DbId, Timestamp};
use lingua_db::models::level_history::CreateLevelHistory;
use lingua_db::models::user::{CreateUser, User};
use lingua_db::repositories::{
    AdvanceOutcome, AdvancementRepo, LevelHistoryRepo, ModuleProgressRepo, UserRepo,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn started() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 1, 5, 10, 0, 0).unwrap()
}

fn advanced_at() -> Timestamp {
    started() + Duration::days(30) + Duration::hours(5)
}

async fn new_learner(pool: &PgPool, level: CefrLevel) -> User {
    let input = CreateUser {
        external_id: None,
        target_language: Some("fr".to_string()),
        level: Some(level),
    };
    UserRepo::create(pool, &input, started()).await.unwrap()
}

fn standing(module: LearningModule, score: Option<f64>, attempts: i32) -> ModuleStanding {
    ModuleStanding {
        module,
        score,
        total_attempts: attempts,
        correct_attempts: attempts,
        last_activity_at: Some(started() + Duration::days(1)),
    }
}

/// vocabulary 90/12, grammar 88/15, writing 86/10, phonetics 95/20, 25 messages.
fn ready_standings() -> Vec<ModuleStanding> {
    vec![
        standing(LearningModule::Vocabulary, Some(90.0), 12),
        standing(LearningModule::Grammar, Some(88.0), 15),
        standing(LearningModule::Writing, Some(86.0), 10),
        standing(LearningModule::Phonetics, Some(95.0), 20),
        standing(LearningModule::Conversation, None, 25),
    ]
}

async fn seed(pool: &PgPool, user_id: DbId, standings: &[ModuleStanding]) {
    let mut tx = pool.begin().await.unwrap();
    for s in standings {
        ModuleProgressRepo::upsert(&mut tx, user_id, s).await.unwrap();
    }
    tx.commit().await.unwrap();
}

// ---------------------------------------------------------------------------
// Eligible learner
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn eligible_a1_learner_advances_to_a2(pool: PgPool) {
    let user = new_learner(&pool, CefrLevel::A1).await;
    seed(&pool, user.id, &ready_standings()).await;
    let policy = AdvancementPolicy::default();

    let outcome = AdvancementRepo::advance(&pool, user.id, &policy, advanced_at())
        .await
        .unwrap();
    let advancement = assert_matches!(outcome, AdvanceOutcome::Advanced(a) => a);

    assert_eq!(advancement.previous_level, CefrLevel::A1);
    assert_eq!(advancement.new_level, CefrLevel::A2);
    assert_eq!(advancement.xp_awarded, 100);
    assert_eq!(advancement.total_xp, 100);

    let history = &advancement.history;
    assert_eq!(history.level, "A1");
    assert_eq!(history.vocabulary_score, Some(90.0));
    assert_eq!(history.grammar_score, Some(88.0));
    assert_eq!(history.writing_score, Some(86.0));
    assert_eq!(history.phonetics_score, Some(95.0));
    assert_eq!(history.vocabulary_attempts, 12);
    assert_eq!(history.phonetics_attempts, 20);
    assert_eq!(history.conversation_messages, 25);
    assert_eq!(history.started_at, started());
    assert_eq!(history.completed_at, advanced_at());
    assert_eq!(history.days_at_level, 30);
    assert_eq!(history.weighted_score, 89.75);
    assert_eq!(history.xp_awarded, 100);

    let after = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(after.level, "A2");
    assert_eq!(after.level_started_at, Some(advanced_at()));
    assert_eq!(after.total_xp, 100);
    assert!(!after.can_advance);
    assert_eq!(after.advancement_notified_at, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn advancement_resets_scored_modules_but_not_conversation(pool: PgPool) {
    let user = new_learner(&pool, CefrLevel::A1).await;
    seed(&pool, user.id, &ready_standings()).await;

    AdvancementRepo::advance(&pool, user.id, &AdvancementPolicy::default(), advanced_at())
        .await
        .unwrap();

    let rows = ModuleProgressRepo::list_by_user(&pool, user.id).await.unwrap();
    assert_eq!(rows.len(), 5, "records are reset in place, never deleted");
    for row in rows {
        if row.module == "conversation" {
            assert_eq!(row.total_attempts, 25);
        } else {
            assert_eq!(row.score, None, "{} score", row.module);
            assert_eq!(row.total_attempts, 0, "{} attempts", row.module);
            assert_eq!(row.correct_attempts, 0, "{} correct", row.module);
        }
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn ignores_stale_can_advance_flag(pool: PgPool) {
    let user = new_learner(&pool, CefrLevel::A1).await;
    sqlx::query("UPDATE users SET can_advance = TRUE WHERE id = $1")
        .bind(user.id)
        .execute(&pool)
        .await
        .unwrap();

    let outcome = AdvancementRepo::advance(
        &pool,
        user.id,
        &AdvancementPolicy::default(),
        advanced_at(),
    )
    .await
    .unwrap();
    assert_matches!(outcome, AdvanceOutcome::Ineligible(_));
}

// ---------------------------------------------------------------------------
// Refusals leave state untouched
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn ineligible_learner_is_not_mutated(pool: PgPool) {
    let user = new_learner(&pool, CefrLevel::A1).await;
    let mut standings = ready_standings();
    standings[3] = standing(LearningModule::Phonetics, Some(95.0), 9);
    seed(&pool, user.id, &standings).await;

    let user_before = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    let modules_before = ModuleProgressRepo::list_by_user(&pool, user.id).await.unwrap();

    let outcome = AdvancementRepo::advance(
        &pool,
        user.id,
        &AdvancementPolicy::default(),
        advanced_at(),
    )
    .await
    .unwrap();

    let verdict = assert_matches!(outcome, AdvanceOutcome::Ineligible(v) => v);
    assert_eq!(
        verdict.unmet_messages(),
        vec!["phonetics: insufficient attempts (9 < 10)".to_string()]
    );

    let user_after = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    let modules_after = ModuleProgressRepo::list_by_user(&pool, user.id).await.unwrap();
    assert_eq!(user_before, user_after);
    assert_eq!(modules_before, modules_after);
    assert!(LevelHistoryRepo::list_by_user(&pool, user.id)
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_archive_insert_rolls_back_everything(pool: PgPool) {
    let user = new_learner(&pool, CefrLevel::A1).await;
    let standings = ready_standings();
    seed(&pool, user.id, &standings).await;

    // An A1 record already exists, so the archive insert violates
    // uq_level_history_user_level.
    let mut tx = pool.begin().await.unwrap();
    LevelHistoryRepo::create(
        &mut tx,
        &CreateLevelHistory::from_standings(
            user.id,
            CefrLevel::A1,
            &standings,
            25,
            started(),
            started(),
            0,
            0.0,
            0,
        ),
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    let user_before = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    let modules_before = ModuleProgressRepo::list_by_user(&pool, user.id).await.unwrap();

    let err = AdvancementRepo::advance(
        &pool,
        user.id,
        &AdvancementPolicy::default(),
        advanced_at(),
    )
    .await
    .unwrap_err();
    assert_matches!(err, sqlx::Error::Database(db) if db.constraint() == Some("uq_level_history_user_level"));

    let user_after = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(user_after, user_before);
    assert_eq!(user_after.level, "A1");
    assert_eq!(user_after.total_xp, 0);
    assert_eq!(user_after.level_started_at, Some(started()));

    let modules_after = ModuleProgressRepo::list_by_user(&pool, user.id).await.unwrap();
    assert_eq!(modules_after.len(), 5);
    assert_eq!(modules_after, modules_before);
    assert_eq!(
        LevelHistoryRepo::list_by_user(&pool, user.id).await.unwrap().len(),
        1
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_promotion_rolls_back_archive_and_reset(pool: PgPool) {
    let user = new_learner(&pool, CefrLevel::A1).await;
    seed(&pool, user.id, &ready_standings()).await;
    let modules_before = ModuleProgressRepo::list_by_user(&pool, user.id).await.unwrap();

    // A negative award drives total_xp below zero in the last statement,
    // after the history row is written and the modules are reset.
    let policy = AdvancementPolicy {
        xp_awards: [-1_000, 150, 200, 300, 400],
        ..AdvancementPolicy::default()
    };
    let err = AdvancementRepo::advance(&pool, user.id, &policy, advanced_at())
        .await
        .unwrap_err();
    assert_matches!(err, sqlx::Error::Database(db) if db.constraint() == Some("ck_users_total_xp"));

    let after = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(after, user);
    assert_eq!(
        ModuleProgressRepo::list_by_user(&pool, user.id).await.unwrap(),
        modules_before
    );
    assert!(LevelHistoryRepo::list_by_user(&pool, user.id)
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn max_level_learner_is_refused_regardless_of_scores(pool: PgPool) {
    let user = new_learner(&pool, CefrLevel::C2).await;
    seed(&pool, user.id, &ready_standings()).await;
    let modules_before = ModuleProgressRepo::list_by_user(&pool, user.id).await.unwrap();

    let outcome = AdvancementRepo::advance(
        &pool,
        user.id,
        &AdvancementPolicy::default(),
        advanced_at(),
    )
    .await
    .unwrap();
    assert_matches!(outcome, AdvanceOutcome::AtMaxLevel(CefrLevel::C2));

    let after = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(after, user);
    assert_eq!(
        ModuleProgressRepo::list_by_user(&pool, user.id).await.unwrap(),
        modules_before
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_learner_is_reported(pool: PgPool) {
    let outcome = AdvancementRepo::advance(
        &pool,
        999_999,
        &AdvancementPolicy::default(),
        advanced_at(),
    )
    .await
    .unwrap();
    assert_matches!(outcome, AdvanceOutcome::UserNotFound);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn second_advancement_without_new_practice_is_refused(pool: PgPool) {
    let user = new_learner(&pool, CefrLevel::A1).await;
    seed(&pool, user.id, &ready_standings()).await;
    let policy = AdvancementPolicy::default();

    AdvancementRepo::advance(&pool, user.id, &policy, advanced_at())
        .await
        .unwrap();
    let again = AdvancementRepo::advance(&pool, user.id, &policy, advanced_at())
        .await
        .unwrap();
    assert_matches!(again, AdvanceOutcome::Ineligible(_));

    let after = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(after.level, "A2");
    assert_eq!(after.total_xp, 100);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_advancements_award_xp_once(pool: PgPool) {
    let user = new_learner(&pool, CefrLevel::A1).await;
    seed(&pool, user.id, &ready_standings()).await;
    let policy = AdvancementPolicy::default();

    let (first, second) = tokio::join!(
        AdvancementRepo::advance(&pool, user.id, &policy, advanced_at()),
        AdvancementRepo::advance(&pool, user.id, &policy, advanced_at()),
    );
    let outcomes = [first.unwrap(), second.unwrap()];
    let advanced = outcomes
        .iter()
        .filter(|o| matches!(o, AdvanceOutcome::Advanced(_)))
        .count();
    assert_eq!(advanced, 1);

    let after = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(after.level, "A2");
    assert_eq!(after.total_xp, 100);
    assert_eq!(
        LevelHistoryRepo::list_by_user(&pool, user.id).await.unwrap().len(),
        1
    );
}

// ---------------------------------------------------------------------------
// History ordering
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn history_lists_completions_oldest_first(pool: PgPool) {
    let user = new_learner(&pool, CefrLevel::A1).await;
    let policy = AdvancementPolicy::default();

    assert!(LevelHistoryRepo::list_by_user(&pool, user.id)
        .await
        .unwrap()
        .is_empty());

    seed(&pool, user.id, &ready_standings()).await;
    AdvancementRepo::advance(&pool, user.id, &policy, advanced_at())
        .await
        .unwrap();

    let second_at = advanced_at() + Duration::days(45);
    seed(&pool, user.id, &ready_standings()).await;
    let outcome = AdvancementRepo::advance(&pool, user.id, &policy, second_at)
        .await
        .unwrap();
    let advancement = assert_matches!(outcome, AdvanceOutcome::Advanced(a) => a);
    assert_eq!(advancement.new_level, CefrLevel::B1);
    assert_eq!(advancement.xp_awarded, 150);
    assert_eq!(advancement.total_xp, 250);
    // The second level started when the first one was completed.
    assert_eq!(advancement.history.started_at, advanced_at());
    assert_eq!(advancement.history.days_at_level, 45);

    let history = LevelHistoryRepo::list_by_user(&pool, user.id).await.unwrap();
    let levels: Vec<&str> = history.iter().map(|h| h.level.as_str()).collect();
    assert_eq!(levels, vec!["A1", "A2"]);
    assert!(history[0].completed_at < history[1].completed_at);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn history_rows_are_append_only(pool: PgPool) {
    let user = new_learner(&pool, CefrLevel::A1).await;
    seed(&pool, user.id, &ready_standings()).await;
    AdvancementRepo::advance(&pool, user.id, &AdvancementPolicy::default(), advanced_at())
        .await
        .unwrap();

    let result = sqlx::query("UPDATE level_history SET weighted_score = 0 WHERE user_id = $1")
        .bind(user.id)
        .execute(&pool)
        .await;
    assert!(result.is_err());
}
