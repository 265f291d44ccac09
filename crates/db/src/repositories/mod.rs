//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Steps that must run inside a
//! caller's unit of work take a [`PgTx`] instead.

pub mod advancement_repo;
pub mod level_history_repo;
pub mod module_progress_repo;
pub mod user_repo;

pub use advancement_repo::{AdvanceOutcome, Advancement, AdvancementRepo};
pub use level_history_repo::LevelHistoryRepo;
pub use module_progress_repo::{ActivityRecorded, ModuleProgressRepo};
pub use user_repo::UserRepo;

/// An open PostgreSQL transaction.
pub type PgTx<'c> = sqlx::Transaction<'c, sqlx::Postgres>;
