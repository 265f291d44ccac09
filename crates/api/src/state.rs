use std::sync::Arc;

use lingua_core::advancement::AdvancementPolicy;
use lingua_core::clock::Clock;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: lingua_db::DbPool,
    /// Advancement policy handed to the engine on every call.
    pub policy: Arc<AdvancementPolicy>,
    /// Source of "now" for level timing and advancement instants.
    pub clock: Arc<dyn Clock>,
}
