//! Handlers for learning progress and CEFR level advancement.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use lingua_core::activity::{validate_outcome, ActivityOutcome};
use lingua_core::advancement::celebration_message;
use lingua_core::cefr::CefrLevel;
use lingua_core::error::CoreError;
use lingua_core::modules::LearningModule;
use lingua_core::progress::{build_progress_summary, ModuleDetail};
use lingua_core::types::DbId;
use lingua_db::models::level_history::LevelHistory;
use lingua_db::repositories::{
    AdvanceOutcome, AdvancementRepo, LevelHistoryRepo, ModuleProgressRepo, UserRepo,
};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

/// Result of a successful level advancement.
#[derive(Debug, Serialize)]
pub struct AdvancementResponse {
    pub old_level: CefrLevel,
    pub new_level: CefrLevel,
    pub xp_earned: i64,
    pub total_xp: i64,
    /// Scores of the completed level, keyed by module name.
    pub module_scores: BTreeMap<&'static str, Option<f64>>,
    pub weighted_score: f64,
    pub days_at_level: i32,
    pub celebration_message: String,
    pub history: LevelHistory,
}

fn module_scores(history: &LevelHistory) -> BTreeMap<&'static str, Option<f64>> {
    BTreeMap::from([
        (LearningModule::Vocabulary.as_str(), history.vocabulary_score),
        (LearningModule::Grammar.as_str(), history.grammar_score),
        (LearningModule::Writing.as_str(), history.writing_score),
        (LearningModule::Phonetics.as_str(), history.phonetics_score),
    ])
}

fn user_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "User", id })
}

/// A stored row that no longer decodes into the domain is a server fault,
/// not a client error.
fn corrupt_record(err: CoreError) -> AppError {
    AppError::Core(CoreError::Internal(format!("Stored record is invalid: {err}")))
}

/// Parse a module path segment, rejecting unknown names before any
/// storage access.
fn parse_module(raw: &str) -> AppResult<LearningModule> {
    LearningModule::from_str_value(raw).map_err(|e| match e {
        CoreError::Validation(msg) => AppError::BadRequest(msg),
        other => AppError::Core(other),
    })
}

// ---------------------------------------------------------------------------
// Progress endpoints
// ---------------------------------------------------------------------------

/// GET /api/v1/learners/{id}/progress/summary
///
/// Read-only snapshot of the learner's standing against the advancement
/// policy. Never writes, not even the cached `can_advance` flag.
pub async fn get_summary(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let (user, standings) = ModuleProgressRepo::load_learner_state(&state.pool, id)
        .await?
        .ok_or_else(|| user_not_found(id))?;

    let summary = build_progress_summary(
        &user.snapshot().map_err(corrupt_record)?,
        &standings,
        &state.policy,
        state.clock.now(),
    );

    Ok(Json(DataResponse { data: summary }))
}

/// POST /api/v1/learners/{id}/progress/advance
///
/// Advance the learner one CEFR level if every condition holds.
pub async fn advance_level(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let outcome = AdvancementRepo::advance(&state.pool, id, &state.policy, state.clock.now())
        .await?;

    let advancement = match outcome {
        AdvanceOutcome::UserNotFound => return Err(user_not_found(id)),
        AdvanceOutcome::AtMaxLevel(level) => {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Already at maximum level ({level})"
            ))));
        }
        AdvanceOutcome::Ineligible(verdict) => {
            tracing::debug!(
                user_id = id,
                unmet = verdict.unmet.len(),
                "Advancement refused",
            );
            return Err(AppError::Core(verdict.into_error()));
        }
        AdvanceOutcome::Advanced(advancement) => *advancement,
    };

    tracing::info!(
        user_id = id,
        level = %advancement.new_level,
        previous_level = %advancement.previous_level,
        xp_awarded = advancement.xp_awarded,
        "Learner advanced",
    );

    let response = AdvancementResponse {
        old_level: advancement.previous_level,
        new_level: advancement.new_level,
        xp_earned: advancement.xp_awarded,
        total_xp: advancement.total_xp,
        module_scores: module_scores(&advancement.history),
        weighted_score: advancement.history.weighted_score,
        days_at_level: advancement.history.days_at_level,
        celebration_message: celebration_message(
            advancement.previous_level,
            advancement.new_level,
            advancement.xp_awarded,
        ),
        history: advancement.history,
    };

    Ok(Json(DataResponse { data: response }))
}

/// GET /api/v1/learners/{id}/progress/history
///
/// Completed levels, oldest first.
pub async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !UserRepo::exists(&state.pool, id).await? {
        return Err(user_not_found(id));
    }
    let history = LevelHistoryRepo::list_by_user(&state.pool, id).await?;

    Ok(Json(DataResponse { data: history }))
}

/// GET /api/v1/learners/{id}/progress/modules/{module}
pub async fn get_module_progress(
    State(state): State<AppState>,
    Path((id, module)): Path<(DbId, String)>,
) -> AppResult<impl IntoResponse> {
    let module = parse_module(&module)?;

    if !UserRepo::exists(&state.pool, id).await? {
        return Err(user_not_found(id));
    }
    let standing = ModuleProgressRepo::find_by_user_and_module(&state.pool, id, module)
        .await?
        .map(|row| row.standing())
        .transpose()
        .map_err(corrupt_record)?;

    Ok(Json(DataResponse {
        data: ModuleDetail::from_standing(module, standing.as_ref()),
    }))
}

/// POST /api/v1/learners/{id}/progress/modules/{module}/activity
///
/// Record one practice attempt and refresh the cached eligibility flag.
pub async fn record_activity(
    State(state): State<AppState>,
    Path((id, module)): Path<(DbId, String)>,
    Json(outcome): Json<ActivityOutcome>,
) -> AppResult<impl IntoResponse> {
    let module = parse_module(&module)?;
    validate_outcome(module, &outcome)?;

    let recorded = ModuleProgressRepo::record_activity(
        &state.pool,
        id,
        module,
        &outcome,
        &state.policy,
        state.clock.now(),
    )
    .await?
    .ok_or_else(|| user_not_found(id))?;

    Ok(Json(DataResponse { data: recorded }))
}
