use thiserror::Error;

use crate::model::{RecordError, UserIdError, ValidationError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    UserId(#[from] UserIdError),
}
