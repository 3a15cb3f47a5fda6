#![forbid(unsafe_code)]

pub mod error;
pub mod history;
pub mod practice;

pub use drill_core::Clock;

pub use error::{HistoryError, PracticeError};
pub use history::{DEFAULT_HISTORY_LIMIT, HistoryService, SessionHistoryItem};
pub use practice::{
    DEFAULT_FEEDBACK_DELAY, PracticeOptions, PracticeService, PracticeSnapshot, StartOutcome,
    SubmitOutcome,
};
