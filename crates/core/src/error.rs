use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// The learner does not yet satisfy every advancement condition.
    /// Carries one human-readable line per unmet condition.
    #[error("Not eligible to advance: {}", .0.join("; "))]
    NotEligible(Vec<String>),

    #[error("Internal error: {0}")]
    Internal(String),
}
