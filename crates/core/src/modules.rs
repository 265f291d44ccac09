//! The closed set of learning modules a learner can practise in.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const MODULE_VOCABULARY: &str = "vocabulary";
pub const MODULE_GRAMMAR: &str = "grammar";
pub const MODULE_WRITING: &str = "writing";
pub const MODULE_PHONETICS: &str = "phonetics";
pub const MODULE_CONVERSATION: &str = "conversation";

/// All valid module names.
pub const VALID_MODULES: &[&str] = &[
    MODULE_VOCABULARY,
    MODULE_GRAMMAR,
    MODULE_WRITING,
    MODULE_PHONETICS,
    MODULE_CONVERSATION,
];

/// How a module turns activity into its `score`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringKind {
    /// Score is the percentage of correct attempts.
    Accuracy,
    /// Score is the running mean of graded submissions (0-100).
    GradedAverage,
    /// No score; every attempt counts as one message.
    Engagement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningModule {
    Vocabulary,
    Grammar,
    Writing,
    Phonetics,
    Conversation,
}

impl LearningModule {
    /// Every module, scored ones first.
    pub const ALL: [LearningModule; 5] = [
        LearningModule::Vocabulary,
        LearningModule::Grammar,
        LearningModule::Writing,
        LearningModule::Phonetics,
        LearningModule::Conversation,
    ];

    /// Modules whose score and attempt count gate advancement.
    pub const SCORED: [LearningModule; 4] = [
        LearningModule::Vocabulary,
        LearningModule::Grammar,
        LearningModule::Writing,
        LearningModule::Phonetics,
    ];

    /// Parse a module name received from a client or read from the database.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            MODULE_VOCABULARY => Ok(Self::Vocabulary),
            MODULE_GRAMMAR => Ok(Self::Grammar),
            MODULE_WRITING => Ok(Self::Writing),
            MODULE_PHONETICS => Ok(Self::Phonetics),
            MODULE_CONVERSATION => Ok(Self::Conversation),
            _ => Err(CoreError::Validation(format!(
                "Invalid module '{s}'. Must be one of: {}",
                VALID_MODULES.join(", ")
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vocabulary => MODULE_VOCABULARY,
            Self::Grammar => MODULE_GRAMMAR,
            Self::Writing => MODULE_WRITING,
            Self::Phonetics => MODULE_PHONETICS,
            Self::Conversation => MODULE_CONVERSATION,
        }
    }

    pub fn is_scored(&self) -> bool {
        !matches!(self, Self::Conversation)
    }

    pub fn scoring_kind(&self) -> ScoringKind {
        match self {
            Self::Vocabulary | Self::Grammar => ScoringKind::Accuracy,
            Self::Writing | Self::Phonetics => ScoringKind::GradedAverage,
            Self::Conversation => ScoringKind::Engagement,
        }
    }
}

impl fmt::Display for LearningModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
