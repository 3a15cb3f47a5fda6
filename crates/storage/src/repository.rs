use async_trait::async_trait;
use drill_core::model::{SessionRecord, SessionRecordId, UserId};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("record has no user attached")]
    MissingUser,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A stored record together with its storage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecordRow {
    pub id: SessionRecordId,
    pub record: SessionRecord,
}

impl SessionRecordRow {
    #[must_use]
    pub fn new(id: SessionRecordId, record: SessionRecord) -> Self {
        Self { id, record }
    }
}

/// Durable sink for finished sessions, and the read side used for history.
#[async_trait]
pub trait SessionRecordRepository: Send + Sync {
    /// Persist a finished session record. The record must carry a user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::MissingUser` for anonymous records, or other storage errors.
    async fn store(&self, record: &SessionRecord) -> Result<SessionRecordId, StorageError>;

    /// Fetch one record by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_record(&self, id: SessionRecordId) -> Result<SessionRecord, StorageError>;

    /// Records for a user, oldest first, capped at `limit`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read or decode failures.
    async fn list_for_user(
        &self,
        user: &UserId,
        limit: u32,
    ) -> Result<Vec<SessionRecordRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    records: Arc<Mutex<Vec<SessionRecordRow>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRecordRepository for InMemoryRepository {
    async fn store(&self, record: &SessionRecord) -> Result<SessionRecordId, StorageError> {
        if record.user().is_none() {
            return Err(StorageError::MissingUser);
        }
        let mut guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let next = i64::try_from(guard.len())
            .map_err(|_| StorageError::Serialization("record id overflow".into()))?
            + 1;
        let id = SessionRecordId::new(next);
        guard.push(SessionRecordRow::new(id, record.clone()));
        Ok(id)
    }

    async fn get_record(&self, id: SessionRecordId) -> Result<SessionRecord, StorageError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .iter()
            .find(|row| row.id == id)
            .map(|row| row.record.clone())
            .ok_or(StorageError::NotFound)
    }

    async fn list_for_user(
        &self,
        user: &UserId,
        limit: u32,
    ) -> Result<Vec<SessionRecordRow>, StorageError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut rows: Vec<SessionRecordRow> = guard
            .iter()
            .filter(|row| row.record.user() == Some(user))
            .cloned()
            .collect();
        rows.sort_by_key(|row| (row.record.timestamp(), row.id));
        rows.truncate(limit as usize);
        Ok(rows)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub records: Arc<dyn SessionRecordRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let records: Arc<dyn SessionRecordRepository> = Arc::new(InMemoryRepository::new());
        Self { records }
    }
}
