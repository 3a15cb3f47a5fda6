use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use drill_core::Clock;
use drill_core::model::{SessionConfig, SessionRecord, SessionRecordId, UserId};
use drill_core::session::{Action, Event, PendingAdvance, SessionState, Verdict};
use storage::repository::SessionRecordRepository;

use super::snapshot::PracticeSnapshot;
use crate::error::PracticeError;

/// Pause between an answer and the next question.
pub const DEFAULT_FEEDBACK_DELAY: Duration = Duration::from_millis(500);

//
// ─── OPTIONS / OUTCOMES ────────────────────────────────────────────────────────
//

/// Knobs for a `PracticeService`.
#[derive(Debug, Clone)]
pub struct PracticeOptions {
    pub feedback_delay: Duration,
    /// Fixed RNG seed; `None` seeds from the OS.
    pub seed: Option<u64>,
    pub identity: Option<UserId>,
}

impl Default for PracticeOptions {
    fn default() -> Self {
        Self {
            feedback_delay: DEFAULT_FEEDBACK_DELAY,
            seed: None,
            identity: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartOutcome {
    pub epoch: u64,
    pub total: usize,
}

/// Result of submitting an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Answer scored; `next_index` is shown once the feedback delay elapses.
    Scored { verdict: Verdict, next_index: usize },
    /// Final answer scored; the record has been handed to persistence.
    Completed {
        verdict: Verdict,
        record: SessionRecord,
    },
    /// No question was awaiting an answer.
    Ignored,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

struct Engine {
    state: SessionState,
    rng: StdRng,
    status: Option<String>,
}

struct Inner {
    clock: Clock,
    records: Arc<dyn SessionRecordRepository>,
    feedback_delay: Duration,
    engine: Mutex<Engine>,
    identity: Mutex<Option<UserId>>,
    pending_advance: Mutex<Option<JoinHandle<()>>>,
    pending_write: Mutex<Option<JoinHandle<Option<SessionRecordId>>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn status_after(event: &Event, previous: Option<String>) -> Option<String> {
    match event {
        Event::Started { .. } | Event::Advanced { .. } => None,
        Event::Rejected(err) => Some(err.to_string()),
        Event::Answered { verdict, .. } | Event::Completed { verdict, .. } => {
            Some(verdict.message.to_owned())
        }
        Event::Ignored => previous,
    }
}

impl Inner {
    /// Runs one reducer step under the engine lock, then fires its side effects.
    fn dispatch(self: &Arc<Self>, action: Action) -> Event {
        let event = {
            let mut engine = lock(&self.engine);
            let Engine { state, rng, status } = &mut *engine;
            let (next, event) = std::mem::take(state).reduce(action, rng, self.clock.now());
            *state = next;
            *status = status_after(&event, status.take());
            event
        };

        match &event {
            Event::Answered { advance, .. } => self.schedule_advance(*advance),
            Event::Completed { record, .. } => self.persist(record.clone()),
            _ => {}
        }
        event
    }

    fn schedule_advance(self: &Arc<Self>, advance: PendingAdvance) {
        let inner = Arc::clone(self);
        let delay = self.feedback_delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Event::Advanced { index } = inner.dispatch(Action::Advance(advance)) {
                debug!(index, "advanced to next question");
            }
        });
        *lock(&self.pending_advance) = Some(handle);
    }

    fn persist(&self, record: SessionRecord) {
        info!(
            correct = record.correct(),
            incorrect = record.incorrect(),
            total = record.total_questions(),
            "practice session complete"
        );

        let Some(user) = lock(&self.identity).clone() else {
            debug!("no identity attached; session record not persisted");
            return;
        };

        let record = record.with_user(user);
        let records = Arc::clone(&self.records);
        let handle = tokio::spawn(async move {
            match records.store(&record).await {
                Ok(id) => {
                    info!(record_id = %id, "session record stored");
                    Some(id)
                }
                Err(err) => {
                    warn!(error = %err, "failed to store session record");
                    None
                }
            }
        });
        *lock(&self.pending_write) = Some(handle);
    }
}

/// Drives one practice session at a time.
///
/// Wraps the pure `SessionState` reducer with the feedback timer and the
/// best-effort write of the finished record. Must be used from within a Tokio
/// runtime.
#[derive(Clone)]
pub struct PracticeService {
    inner: Arc<Inner>,
}

impl PracticeService {
    #[must_use]
    pub fn new(clock: Clock, records: Arc<dyn SessionRecordRepository>) -> Self {
        Self::with_options(clock, records, PracticeOptions::default())
    }

    #[must_use]
    pub fn with_options(
        clock: Clock,
        records: Arc<dyn SessionRecordRepository>,
        options: PracticeOptions,
    ) -> Self {
        let rng = options
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self {
            inner: Arc::new(Inner {
                clock,
                records,
                feedback_delay: options.feedback_delay,
                engine: Mutex::new(Engine {
                    state: SessionState::new(),
                    rng,
                    status: None,
                }),
                identity: Mutex::new(options.identity),
                pending_advance: Mutex::new(None),
                pending_write: Mutex::new(None),
            }),
        }
    }

    /// Attach or clear the learner identity used for persistence.
    pub fn set_identity(&self, user: Option<UserId>) {
        *lock(&self.inner.identity) = user;
    }

    #[must_use]
    pub fn identity(&self) -> Option<UserId> {
        lock(&self.inner.identity).clone()
    }

    #[must_use]
    pub fn feedback_delay(&self) -> Duration {
        self.inner.feedback_delay
    }

    /// Start a fresh session, replacing any current one.
    ///
    /// Nothing here awaits; the method is `async` so that it is only called
    /// from inside a Tokio runtime, where the feedback timer gets spawned.
    /// `restart` and `submit_answer` follow the same convention.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Validation` if the config is rejected; the service is then idle.
    #[allow(clippy::unused_async)]
    pub async fn start(&self, config: SessionConfig) -> Result<StartOutcome, PracticeError> {
        let event = self.inner.dispatch(Action::Start(config));
        Self::started(event)
    }

    /// Start again with the same config and a newly generated pool.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::NoActiveSession` if nothing was started yet.
    #[allow(clippy::unused_async)]
    pub async fn restart(&self) -> Result<StartOutcome, PracticeError> {
        let event = self.inner.dispatch(Action::Restart);
        Self::started(event)
    }

    fn started(event: Event) -> Result<StartOutcome, PracticeError> {
        match event {
            Event::Started { epoch, total } => {
                info!(epoch, total, "practice session started");
                Ok(StartOutcome { epoch, total })
            }
            Event::Rejected(err) => {
                debug!(error = %err, "session config rejected");
                Err(err.into())
            }
            _ => Err(PracticeError::NoActiveSession),
        }
    }

    /// Submit an answer for the current question.
    ///
    /// May spawn the feedback timer or the record write, hence `async`.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Validation` for a blank answer; nothing is recorded.
    #[allow(clippy::unused_async)]
    pub async fn submit_answer(&self, raw: &str) -> Result<SubmitOutcome, PracticeError> {
        match self.inner.dispatch(Action::Submit(raw.to_owned())) {
            Event::Answered { verdict, advance } => Ok(SubmitOutcome::Scored {
                verdict,
                next_index: advance.from + 1,
            }),
            Event::Completed { verdict, record } => Ok(SubmitOutcome::Completed { verdict, record }),
            Event::Rejected(err) => Err(err.into()),
            _ => {
                debug!("answer ignored; no question awaiting an answer");
                Ok(SubmitOutcome::Ignored)
            }
        }
    }

    /// Wait for the pending post-answer advance, if any.
    pub async fn settle(&self) {
        let handle = lock(&self.inner.pending_advance).take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                warn!(error = %err, "feedback timer task failed");
            }
        }
    }

    /// Wait for the last record write, returning its id when it succeeded.
    pub async fn wait_for_persistence(&self) -> Option<SessionRecordId> {
        let handle = lock(&self.inner.pending_write).take()?;
        match handle.await {
            Ok(id) => id,
            Err(err) => {
                warn!(error = %err, "persistence task failed");
                None
            }
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> PracticeSnapshot {
        let engine = lock(&self.inner.engine);
        PracticeSnapshot::capture(&engine.state, engine.status.as_deref())
    }

    /// Copy of the underlying reducer state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        lock(&self.inner.engine).state.clone()
    }
}

impl fmt::Debug for PracticeService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let engine = lock(&self.inner.engine);
        f.debug_struct("PracticeService")
            .field("phase", &engine.state.phase())
            .field("epoch", &engine.state.epoch())
            .field("feedback_delay", &self.inner.feedback_delay)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
