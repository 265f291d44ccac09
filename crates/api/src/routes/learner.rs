//! Route definitions for learner registration.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::learner;
use crate::state::AppState;

/// Routes mounted at `/learners`.
///
/// ```text
/// POST   /       -> create_learner
/// GET    /{id}   -> get_learner
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(learner::create_learner))
        .route("/{id}", get(learner::get_learner))
}
