//! Answer checking and the per-question audit entry.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::model::{ProgressEntry, Question, ValidationError};

/// Messages shown after a correct answer; one is picked at random.
pub const ENCOURAGEMENTS: [&str; 5] = [
    "Great Job! 🎉",
    "Keep Going 💪",
    "You’re on Fire 🔥",
    "Amazing! 🌟",
    "Superb 👏",
];

/// Message shown after an incorrect answer.
pub const INCORRECT_MESSAGE: &str = "Incorrect ❌";

/// Outcome of checking one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredAnswer {
    pub is_correct: bool,
    pub entry: ProgressEntry,
}

/// Parses a raw answer.
///
/// Blank input is a validation failure. Anything else that is not an integer
/// parses to `None`, which can never match a product.
///
/// # Errors
///
/// Returns `ValidationError::EmptyAnswer` if `raw` is blank.
pub fn parse_answer(raw: &str) -> Result<Option<i64>, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyAnswer);
    }
    Ok(trimmed.parse::<i64>().ok())
}

/// Checks `raw` against `question` sitting at pool position `index`.
///
/// # Errors
///
/// Returns `ValidationError::EmptyAnswer` if `raw` is blank.
pub fn score_answer(
    question: &Question,
    index: usize,
    raw: &str,
) -> Result<ScoredAnswer, ValidationError> {
    let user_answer = parse_answer(raw)?;
    let is_correct = user_answer == Some(question.answer());

    Ok(ScoredAnswer {
        is_correct,
        entry: ProgressEntry {
            index,
            operand: question.operand,
            multiplier: question.multiplier,
            is_correct,
            user_answer,
            answered: true,
        },
    })
}

/// Status line for an answer. Cosmetic only.
pub fn feedback_message<R: Rng + ?Sized>(is_correct: bool, rng: &mut R) -> &'static str {
    if is_correct {
        ENCOURAGEMENTS.choose(rng).copied().unwrap_or(ENCOURAGEMENTS[0])
    } else {
        INCORRECT_MESSAGE
    }
}
