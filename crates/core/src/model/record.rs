use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Difficulty, ProgressEntry, Score, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RecordError {
    #[error("total questions ({total}) does not match answer counts ({sum})")]
    CountMismatch { total: u32, sum: u32 },

    #[error("progress has {actual} entries, expected {expected}")]
    ProgressLength { expected: u32, actual: usize },

    #[error("progress marks {actual} correct answers, score says {expected}")]
    CorrectMismatch { expected: u32, actual: usize },

    #[error("progress entry {index} was never answered")]
    Unanswered { index: usize },
}

/// Finished, immutable summary of one practice session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    user: Option<UserId>,
    difficulty: Difficulty,
    operands: Vec<i32>,
    correct: u32,
    incorrect: u32,
    total_questions: u32,
    progress: Vec<ProgressEntry>,
    timestamp: DateTime<Utc>,
}

impl SessionRecord {
    /// Assemble the record for a session the reducer just completed.
    ///
    /// The reducer guarantees score and progress agree, so nothing is re-checked here.
    pub(crate) fn completed(
        score: Score,
        progress: Vec<ProgressEntry>,
        difficulty: Difficulty,
        operands: Vec<i32>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            user: None,
            difficulty,
            operands,
            correct: score.correct,
            incorrect: score.incorrect,
            total_questions: u32::try_from(progress.len()).unwrap_or(u32::MAX),
            progress,
            timestamp,
        }
    }

    /// Rehydrate a record from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `RecordError` if totals, progress length, or correctness flags do not align.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        user: Option<UserId>,
        difficulty: Difficulty,
        operands: Vec<i32>,
        correct: u32,
        incorrect: u32,
        total_questions: u32,
        progress: Vec<ProgressEntry>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, RecordError> {
        let sum = correct.saturating_add(incorrect);
        if sum != total_questions {
            return Err(RecordError::CountMismatch {
                total: total_questions,
                sum,
            });
        }
        if progress.len() != total_questions as usize {
            return Err(RecordError::ProgressLength {
                expected: total_questions,
                actual: progress.len(),
            });
        }
        if let Some(entry) = progress.iter().find(|e| !e.is_answered()) {
            return Err(RecordError::Unanswered { index: entry.index });
        }
        let marked = progress.iter().filter(|e| e.is_correct).count();
        if marked != correct as usize {
            return Err(RecordError::CorrectMismatch {
                expected: correct,
                actual: marked,
            });
        }

        Ok(Self {
            user,
            difficulty,
            operands,
            correct,
            incorrect,
            total_questions,
            progress,
            timestamp,
        })
    }

    /// Attach the learner identity before persistence.
    #[must_use]
    pub fn with_user(mut self, user: UserId) -> Self {
        self.user = Some(user);
        self
    }

    #[must_use]
    pub fn user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn operands(&self) -> &[i32] {
        &self.operands
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn incorrect(&self) -> u32 {
        self.incorrect
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn progress(&self) -> &[ProgressEntry] {
        &self.progress
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
