use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Local, recoverable input problems. Surfaced as a status message, never persisted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("select at least one table to practice")]
    EmptyOperands,

    #[error("question count must be > 0")]
    ZeroQuestionCount,

    #[error("Please enter an answer ❗")]
    EmptyAnswer,

    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Difficulty tier, which only controls the multiplier range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Multipliers 1 through 10.
    #[default]
    Normal,
    /// Multipliers 5 through 10.
    Hard,
}

impl Difficulty {
    /// Inclusive range multipliers are drawn from.
    #[must_use]
    pub fn multiplier_range(self) -> RangeInclusive<u32> {
        match self {
            Difficulty::Normal => 1..=10,
            Difficulty::Hard => 5..=10,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            other => Err(ValidationError::UnknownDifficulty(other.to_owned())),
        }
    }
}

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// What the learner asked to practice.
///
/// Operands are kept sorted and deduplicated, so the remainder of an uneven split
/// always lands on the largest operand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    operands: BTreeSet<i32>,
    difficulty: Difficulty,
    question_count: u32,
}

impl SessionConfig {
    /// Builds a config without validating it; see [`SessionConfig::validate`].
    #[must_use]
    pub fn new(
        operands: impl IntoIterator<Item = i32>,
        difficulty: Difficulty,
        question_count: u32,
    ) -> Self {
        Self {
            operands: operands.into_iter().collect(),
            difficulty,
            question_count,
        }
    }

    /// Checks the config can produce a session.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyOperands` if no operand is selected.
    /// Returns `ValidationError::ZeroQuestionCount` if the question count is zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.operands.is_empty() {
            return Err(ValidationError::EmptyOperands);
        }
        if self.question_count == 0 {
            return Err(ValidationError::ZeroQuestionCount);
        }
        Ok(())
    }

    #[must_use]
    pub fn operands(&self) -> &BTreeSet<i32> {
        &self.operands
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn question_count(&self) -> u32 {
        self.question_count
    }
}
