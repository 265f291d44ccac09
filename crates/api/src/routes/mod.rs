pub mod health;
pub mod learner;
pub mod progress;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /learners                                          create
/// /learners/{id}                                     get
/// /learners/{id}/progress/summary                    progress summary
/// /learners/{id}/progress/advance                    level advancement
/// /learners/{id}/progress/history                    completed levels
/// /learners/{id}/progress/modules/{module}           module detail
/// /learners/{id}/progress/modules/{module}/activity  record activity
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest(
        "/learners",
        learner::router().nest("/{id}/progress", progress::router()),
    )
}
