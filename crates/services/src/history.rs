use chrono::{DateTime, Utc};
use std::sync::Arc;

use drill_core::model::{Difficulty, SessionRecord, SessionRecordId, UserId};
use storage::repository::SessionRecordRepository;

use crate::error::HistoryError;

/// Default cap on how many sessions a history query returns.
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;

/// One finished session as shown in a learner's history, e.g. a chart point.
///
/// Timestamps are left unformatted; the caller decides how to render them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHistoryItem {
    pub id: SessionRecordId,
    /// "Session N", numbered from 1 in chronological order.
    pub label: String,
    pub correct: u32,
    pub incorrect: u32,
    pub total: u32,
    pub difficulty: Difficulty,
    pub completed_at: DateTime<Utc>,
}

impl SessionHistoryItem {
    #[must_use]
    pub fn from_record(id: SessionRecordId, position: usize, record: &SessionRecord) -> Self {
        Self {
            id,
            label: format!("Session {}", position + 1),
            correct: record.correct(),
            incorrect: record.incorrect(),
            total: record.total_questions(),
            difficulty: record.difficulty(),
            completed_at: record.timestamp(),
        }
    }
}

/// Read side over stored session records.
#[derive(Clone)]
pub struct HistoryService {
    records: Arc<dyn SessionRecordRepository>,
}

impl HistoryService {
    #[must_use]
    pub fn new(records: Arc<dyn SessionRecordRepository>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(storage::repository::InMemoryRepository::new()))
    }

    /// A user's sessions, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Storage` on repository failures.
    pub async fn history(
        &self,
        user: &UserId,
        limit: u32,
    ) -> Result<Vec<SessionHistoryItem>, HistoryError> {
        let rows = self.records.list_for_user(user, limit).await?;
        Ok(rows
            .iter()
            .enumerate()
            .map(|(position, row)| SessionHistoryItem::from_record(row.id, position, &row.record))
            .collect())
    }

    /// Fetch one stored record, including its per-question progress.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Storage` when the record is missing or unreadable.
    pub async fn record(&self, id: SessionRecordId) -> Result<SessionRecord, HistoryError> {
        Ok(self.records.get_record(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use drill_core::model::ProgressEntry;
    use drill_core::time::fixed_now;
    use storage::repository::{InMemoryRepository, StorageError};

    fn record(user: &str, correct: u32, incorrect: u32, minutes: i64) -> SessionRecord {
        let total = correct + incorrect;
        let progress = (0..total as usize)
            .map(|index| ProgressEntry {
                index,
                operand: 12,
                multiplier: 3,
                is_correct: index < correct as usize,
                user_answer: Some(if index < correct as usize { 36 } else { 35 }),
                answered: true,
            })
            .collect();
        SessionRecord::from_persisted(
            Some(UserId::new(user).unwrap()),
            Difficulty::Normal,
            vec![12],
            correct,
            incorrect,
            total,
            progress,
            fixed_now() + chrono::Duration::minutes(minutes),
        )
        .unwrap()
    }

    #[test]
    fn item_numbers_sessions_from_one() {
        let rec = record("ada", 3, 1, 0);
        let item = SessionHistoryItem::from_record(SessionRecordId::new(9), 0, &rec);

        assert_eq!(item.label, "Session 1");
        assert_eq!(item.correct, 3);
        assert_eq!(item.incorrect, 1);
        assert_eq!(item.total, 4);
        assert_eq!(item.completed_at, fixed_now());
    }

    #[tokio::test]
    async fn history_is_chronological_and_per_user() {
        let repo = InMemoryRepository::new();
        repo.store(&record("ada", 2, 0, 10)).await.unwrap();
        repo.store(&record("ada", 1, 1, 5)).await.unwrap();
        repo.store(&record("grace", 0, 2, 1)).await.unwrap();

        let svc = HistoryService::new(Arc::new(repo));
        let items = svc
            .history(&UserId::new("ada").unwrap(), DEFAULT_HISTORY_LIMIT)
            .await
            .unwrap();

        let labels: Vec<_> = items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, ["Session 1", "Session 2"]);
        assert_eq!(items[0].correct, 1);
        assert_eq!(items[1].correct, 2);
        assert!(items[0].completed_at < items[1].completed_at);
    }

    #[tokio::test]
    async fn unknown_user_has_empty_history() {
        let svc = HistoryService::in_memory();
        let items = svc.history(&UserId::new("nobody").unwrap(), 10).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn missing_record_surfaces_storage_error() {
        let svc = HistoryService::in_memory();
        let err = svc.record(SessionRecordId::new(404)).await.unwrap_err();
        assert!(matches!(err, HistoryError::Storage(StorageError::NotFound)));
    }
}
