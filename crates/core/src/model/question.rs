use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;

/// A single `operand × multiplier` prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Question {
    pub operand: i32,
    pub multiplier: u32,
}

impl Question {
    #[must_use]
    pub fn new(operand: i32, multiplier: u32) -> Self {
        Self {
            operand,
            multiplier,
        }
    }

    /// The expected product. 32-bit factors cannot overflow 64 bits.
    #[must_use]
    pub fn answer(&self) -> i64 {
        i64::from(self.operand) * i64::from(self.multiplier)
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} × {}", self.operand, self.multiplier)
    }
}

/// Ordered, fixed sequence of questions for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionPool(Vec<Question>);

impl QuestionPool {
    #[must_use]
    pub fn new(questions: Vec<Question>) -> Self {
        Self(questions)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.0.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Question] {
        &self.0
    }
}

impl Index<usize> for QuestionPool {
    type Output = Question;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl From<Vec<Question>> for QuestionPool {
    fn from(value: Vec<Question>) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_is_product() {
        assert_eq!(Question::new(12, 7).answer(), 84);
        assert_eq!(Question::new(i32::MAX, 10).answer(), i64::from(i32::MAX) * 10);
    }

    #[test]
    fn displays_as_multiplication() {
        assert_eq!(Question::new(11, 5).to_string(), "11 × 5");
    }
}
