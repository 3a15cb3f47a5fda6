use serde::{Deserialize, Serialize};

/// Running tally of answered questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub correct: u32,
    pub incorrect: u32,
}

impl Score {
    /// Returns the tally after one more answer.
    #[must_use]
    pub fn record(self, is_correct: bool) -> Self {
        if is_correct {
            Self {
                correct: self.correct.saturating_add(1),
                ..self
            }
        } else {
            Self {
                incorrect: self.incorrect.saturating_add(1),
                ..self
            }
        }
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.correct.saturating_add(self.incorrect)
    }
}

/// Audit row for one pool position.
///
/// Created empty when the session starts and filled exactly once when the
/// question at `index` is answered. `user_answer` stays `None` for
/// non-numeric input, which is still an answered (incorrect) entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub index: usize,
    pub operand: i32,
    pub multiplier: u32,
    pub is_correct: bool,
    pub user_answer: Option<i64>,
    pub answered: bool,
}

impl ProgressEntry {
    #[must_use]
    pub fn empty(index: usize, operand: i32, multiplier: u32) -> Self {
        Self {
            index,
            operand,
            multiplier,
            is_correct: false,
            user_answer: None,
            answered: false,
        }
    }

    /// Row label, `Q1` for the first question.
    #[must_use]
    pub fn label(&self) -> String {
        format!("Q{}", self.index + 1)
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.answered
    }
}
