//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row, plus the input DTOs used by its repository. Text
//! columns holding enumerated values (CEFR level, module name) are
//! converted to their `lingua_core` types through accessor methods.

pub mod level_history;
pub mod module_progress;
pub mod user;

/// Wrap a domain conversion failure as a row decode error.
///
/// Check constraints keep these columns valid, so hitting this means the
/// schema and the domain enums have drifted apart.
pub(crate) fn decode_err(err: lingua_core::error::CoreError) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(err))
}
