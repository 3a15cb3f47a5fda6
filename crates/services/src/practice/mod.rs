mod service;
mod snapshot;

// Public API of the practice subsystem.
pub use crate::error::PracticeError;
pub use service::{
    DEFAULT_FEEDBACK_DELAY, PracticeOptions, PracticeService, StartOutcome, SubmitOutcome,
};
pub use snapshot::PracticeSnapshot;
