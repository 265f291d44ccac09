//! Injectable current-time source.

use chrono::Utc;

use crate::types::Timestamp;

/// Supplies "now" to time-dependent logic (days at level, advancement
/// instants) so it can be pinned in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

/// Whole days elapsed from `since` to `now`.
///
/// Returns 0 when `since` is unset or lies in the future.
pub fn whole_days_between(since: Option<Timestamp>, now: Timestamp) -> i64 {
    since
        .map(|start| (now - start).num_days().max(0))
        .unwrap_or(0)
}
