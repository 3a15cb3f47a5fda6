use chrono::{DateTime, Utc};
use rand::Rng;
use thiserror::Error;

use crate::generator;
use crate::model::{
    ProgressEntry, Question, QuestionPool, Score, SessionConfig, SessionRecord, ValidationError,
};
use crate::scoring;

//
// ─── PHASE / ACTION / EVENT ────────────────────────────────────────────────────
//

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// Waiting for an answer to the question at `index`.
    InProgress { index: usize },
    /// Question `index` was answered; waiting for the delayed advance.
    Feedback { index: usize },
    Complete,
}

/// Inputs to [`SessionState::reduce`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Start(SessionConfig),
    Submit(String),
    /// Delayed follow-up of a `Feedback` phase, tagged with the session it belongs to.
    Advance(PendingAdvance),
    Restart,
}

/// Handle for the advance a driver must dispatch after the feedback delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingAdvance {
    pub epoch: u64,
    pub from: usize,
}

/// Result of checking one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub is_correct: bool,
    pub expected: i64,
    pub message: &'static str,
}

/// What a transition produced, for the driver to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started { epoch: u64, total: usize },
    Rejected(ValidationError),
    Answered {
        verdict: Verdict,
        advance: PendingAdvance,
    },
    Advanced { index: usize },
    /// Emitted once per session, on the transition into `Complete`.
    Completed {
        verdict: Verdict,
        record: SessionRecord,
    },
    Ignored,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantError {
    #[error("progress has {progress} entries but pool has {pool}")]
    ProgressLength { progress: usize, pool: usize },

    #[error("score total {score} does not match {answered} answered questions")]
    ScoreMismatch { score: u32, answered: usize },

    #[error("progress entry {index} answered state is out of order")]
    ProgressOrder { index: usize },

    #[error("phase index {index} is outside a pool of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("question {index} ({question}) is outside the configured operands or range")]
    QuestionOutOfBounds { index: usize, question: Question },

    #[error("a pool exists without a config")]
    MissingConfig,
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Owned state of one practice run.
///
/// Every transition goes through [`SessionState::reduce`], which consumes the
/// state and returns the next one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    config: Option<SessionConfig>,
    pool: QuestionPool,
    phase: Phase,
    score: Score,
    progress: Vec<ProgressEntry>,
    epoch: u64,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    #[must_use]
    pub fn pool(&self) -> &QuestionPool {
        &self.pool
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn score(&self) -> Score {
        self.score
    }

    #[must_use]
    pub fn progress(&self) -> &[ProgressEntry] {
        &self.progress
    }

    /// Generation counter, bumped on every start or restart.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    /// Number of answered questions. The question in flight is not counted.
    #[must_use]
    pub fn current_index(&self) -> usize {
        match self.phase {
            Phase::Idle => 0,
            Phase::InProgress { index } => index,
            Phase::Feedback { index } => index + 1,
            Phase::Complete => self.pool.len(),
        }
    }

    /// The question awaiting an answer, if any.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            Phase::InProgress { index } => self.pool.get(index),
            _ => None,
        }
    }

    /// Applies one action and returns the next state with what happened.
    pub fn reduce<R: Rng + ?Sized>(
        self,
        action: Action,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> (Self, Event) {
        let (next, event) = match action {
            Action::Start(config) => self.start(config, rng),
            Action::Submit(raw) => self.submit(&raw, rng, now),
            Action::Advance(pending) => self.advance(pending),
            Action::Restart => self.restart(rng),
        };
        debug_assert!(
            next.check_invariants().is_ok(),
            "{:?}",
            next.check_invariants()
        );
        (next, event)
    }

    fn start<R: Rng + ?Sized>(self, config: SessionConfig, rng: &mut R) -> (Self, Event) {
        let epoch = self.epoch.wrapping_add(1);
        if let Err(err) = config.validate() {
            let idle = Self {
                epoch,
                ..Self::default()
            };
            return (idle, Event::Rejected(err));
        }

        let pool = generator::generate(&config, rng);
        if pool.is_empty() {
            // Unreachable for a validated config; keep the state Idle rather than Complete.
            let idle = Self {
                epoch,
                ..Self::default()
            };
            return (idle, Event::Rejected(ValidationError::ZeroQuestionCount));
        }

        let progress = pool
            .iter()
            .enumerate()
            .map(|(idx, q)| ProgressEntry::empty(idx, q.operand, q.multiplier))
            .collect();
        let total = pool.len();
        let next = Self {
            config: Some(config),
            pool,
            phase: Phase::InProgress { index: 0 },
            score: Score::default(),
            progress,
            epoch,
        };
        (next, Event::Started { epoch, total })
    }

    fn restart<R: Rng + ?Sized>(self, rng: &mut R) -> (Self, Event) {
        match (self.phase, self.config.clone()) {
            (Phase::Idle, _) | (_, None) => (self, Event::Ignored),
            (_, Some(config)) => self.start(config, rng),
        }
    }

    fn submit<R: Rng + ?Sized>(
        mut self,
        raw: &str,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> (Self, Event) {
        let Phase::InProgress { index } = self.phase else {
            return (self, Event::Ignored);
        };
        let Some(question) = self.pool.get(index).copied() else {
            return (self, Event::Ignored);
        };

        let scored = match scoring::score_answer(&question, index, raw) {
            Ok(scored) => scored,
            Err(err) => return (self, Event::Rejected(err)),
        };

        let verdict = Verdict {
            is_correct: scored.is_correct,
            expected: question.answer(),
            message: scoring::feedback_message(scored.is_correct, rng),
        };
        self.score = self.score.record(scored.is_correct);
        self.progress[index] = scored.entry;

        if index + 1 >= self.pool.len() {
            self.phase = Phase::Complete;
            let record = self.build_record(now);
            return (self, Event::Completed { verdict, record });
        }

        self.phase = Phase::Feedback { index };
        let advance = PendingAdvance {
            epoch: self.epoch,
            from: index,
        };
        (self, Event::Answered { verdict, advance })
    }

    fn advance(mut self, pending: PendingAdvance) -> (Self, Event) {
        match self.phase {
            Phase::Feedback { index } if index == pending.from && self.epoch == pending.epoch => {
                self.phase = Phase::InProgress { index: index + 1 };
                (self, Event::Advanced { index: index + 1 })
            }
            _ => (self, Event::Ignored),
        }
    }

    fn build_record(&self, now: DateTime<Utc>) -> SessionRecord {
        let (difficulty, operands) = self
            .config
            .as_ref()
            .map(|c| (c.difficulty(), c.operands().iter().copied().collect()))
            .unwrap_or_default();
        SessionRecord::completed(self.score, self.progress.clone(), difficulty, operands, now)
    }

    /// Checks the bookkeeping invariants that must hold after every transition.
    ///
    /// # Errors
    ///
    /// Returns the first `InvariantError` found.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.progress.len() != self.pool.len() {
            return Err(InvariantError::ProgressLength {
                progress: self.progress.len(),
                pool: self.pool.len(),
            });
        }

        let answered = self.current_index();
        if self.score.total() as usize != answered {
            return Err(InvariantError::ScoreMismatch {
                score: self.score.total(),
                answered,
            });
        }

        if let Some(entry) = self
            .progress
            .iter()
            .find(|e| e.is_answered() != (e.index < answered))
        {
            return Err(InvariantError::ProgressOrder { index: entry.index });
        }

        if let Phase::InProgress { index } | Phase::Feedback { index } = self.phase {
            if index >= self.pool.len() {
                return Err(InvariantError::IndexOutOfRange {
                    index,
                    len: self.pool.len(),
                });
            }
        }

        if self.pool.is_empty() {
            return Ok(());
        }
        let Some(config) = &self.config else {
            return Err(InvariantError::MissingConfig);
        };
        let range = config.difficulty().multiplier_range();
        for (index, question) in self.pool.iter().enumerate() {
            if !config.operands().contains(&question.operand) || !range.contains(&question.multiplier)
            {
                return Err(InvariantError::QuestionOutOfBounds {
                    index,
                    question: *question,
                });
            }
        }

        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
