//! Shared error types for the services crate.

use thiserror::Error;

use drill_core::model::ValidationError;
use storage::repository::StorageError;

/// Errors emitted by `PracticeService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PracticeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no session to restart")]
    NoActiveSession,
}

/// Errors emitted by `HistoryService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HistoryError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}
