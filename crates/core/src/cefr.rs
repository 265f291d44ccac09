//! CEFR proficiency levels and their fixed ordering.
//!
//! Levels are stored as their canonical text form (`"A1"` .. `"C2"`) and
//! converted at the repository boundary with [`CefrLevel::from_str_value`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const LEVEL_A1: &str = "A1";
pub const LEVEL_A2: &str = "A2";
pub const LEVEL_B1: &str = "B1";
pub const LEVEL_B2: &str = "B2";
pub const LEVEL_C1: &str = "C1";
pub const LEVEL_C2: &str = "C2";

/// All level strings in ascending order.
pub const VALID_LEVELS: &[&str] = &[LEVEL_A1, LEVEL_A2, LEVEL_B1, LEVEL_B2, LEVEL_C1, LEVEL_C2];

/// A Common European Framework of Reference proficiency tier.
///
/// The derived `Ord` follows declaration order, so `A1 < A2 < ... < C2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    /// Every level in ascending order.
    pub const ALL: [CefrLevel; 6] = [
        CefrLevel::A1,
        CefrLevel::A2,
        CefrLevel::B1,
        CefrLevel::B2,
        CefrLevel::C1,
        CefrLevel::C2,
    ];

    /// The highest level; learners here cannot advance further.
    pub const MAX: CefrLevel = CefrLevel::C2;

    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            LEVEL_A1 => Ok(Self::A1),
            LEVEL_A2 => Ok(Self::A2),
            LEVEL_B1 => Ok(Self::B1),
            LEVEL_B2 => Ok(Self::B2),
            LEVEL_C1 => Ok(Self::C1),
            LEVEL_C2 => Ok(Self::C2),
            _ => Err(CoreError::Validation(format!(
                "Invalid CEFR level '{s}'. Must be one of: {}",
                VALID_LEVELS.join(", ")
            ))),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A1 => LEVEL_A1,
            Self::A2 => LEVEL_A2,
            Self::B1 => LEVEL_B1,
            Self::B2 => LEVEL_B2,
            Self::C1 => LEVEL_C1,
            Self::C2 => LEVEL_C2,
        }
    }

    /// The level directly above this one, or `None` at [`CefrLevel::MAX`].
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::A1 => Some(Self::A2),
            Self::A2 => Some(Self::B1),
            Self::B1 => Some(Self::B2),
            Self::B2 => Some(Self::C1),
            Self::C1 => Some(Self::C2),
            Self::C2 => None,
        }
    }

    pub fn is_max(&self) -> bool {
        *self == Self::MAX
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
