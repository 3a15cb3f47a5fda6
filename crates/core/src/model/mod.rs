mod config;
mod ids;
mod progress;
mod question;
mod record;

pub use config::{Difficulty, SessionConfig, ValidationError};
pub use ids::{SessionRecordId, UserId, UserIdError};
pub use progress::{ProgressEntry, Score};
pub use question::{Question, QuestionPool};
pub use record::{RecordError, SessionRecord};
