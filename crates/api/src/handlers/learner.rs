//! Handlers for learner registration and lookup.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use lingua_core::error::CoreError;
use lingua_core::types::DbId;
use lingua_db::models::user::CreateUser;
use lingua_db::repositories::UserRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/learners
///
/// Register a learner. The level clock starts now; the starting level
/// defaults to A1.
pub async fn create_learner(
    State(state): State<AppState>,
    Json(input): Json<CreateUser>,
) -> AppResult<impl IntoResponse> {
    if input
        .target_language
        .as_deref()
        .is_some_and(|lang| lang.trim().is_empty())
    {
        return Err(AppError::BadRequest(
            "target_language must not be empty".to_string(),
        ));
    }

    let user = UserRepo::create(&state.pool, &input, state.clock.now()).await?;
    tracing::info!(user_id = user.id, level = %user.level, "Learner registered");

    Ok((StatusCode::CREATED, Json(DataResponse { data: user })))
}

/// GET /api/v1/learners/{id}
pub async fn get_learner(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;

    Ok(Json(DataResponse { data: user }))
}
