//! Route definitions for learning progress and level advancement.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::progress;
use crate::state::AppState;

/// Routes mounted at `/learners/{id}/progress`.
///
/// ```text
/// GET    /summary                    -> get_summary
/// POST   /advance                    -> advance_level
/// GET    /history                    -> get_history
/// GET    /modules/{module}           -> get_module_progress
/// POST   /modules/{module}/activity  -> record_activity
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/summary", get(progress::get_summary))
        .route("/advance", post(progress::advance_level))
        .route("/history", get(progress::get_history))
        .route("/modules/{module}", get(progress::get_module_progress))
        .route("/modules/{module}/activity", post(progress::record_activity))
}
