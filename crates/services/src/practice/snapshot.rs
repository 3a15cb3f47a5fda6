use drill_core::model::{ProgressEntry, Question, Score};
use drill_core::session::{Phase, SessionState};

/// Read-only view of the running session, useful for a front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PracticeSnapshot {
    pub phase: Phase,
    pub question: Option<Question>,
    /// 1-based number of the question on screen, 0 when idle.
    pub question_number: usize,
    pub total: usize,
    pub score: Score,
    pub status: Option<String>,
    pub progress: Vec<ProgressEntry>,
}

impl PracticeSnapshot {
    pub(crate) fn capture(state: &SessionState, status: Option<&str>) -> Self {
        let question_number = match state.phase() {
            Phase::Idle => 0,
            Phase::InProgress { index } | Phase::Feedback { index } => index + 1,
            Phase::Complete => state.pool().len(),
        };
        Self {
            phase: state.phase(),
            question: state.current_question().copied(),
            question_number,
            total: state.pool().len(),
            score: state.score(),
            status: status.map(ToOwned::to_owned),
            progress: state.progress().to_vec(),
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }
}
