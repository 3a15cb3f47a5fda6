use drill_core::model::{SessionRecord, SessionRecordId, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{map_record_row, ser};
use crate::repository::{SessionRecordRepository, SessionRecordRow, StorageError};

#[async_trait::async_trait]
impl SessionRecordRepository for SqliteRepository {
    async fn store(&self, record: &SessionRecord) -> Result<SessionRecordId, StorageError> {
        let user = record.user().ok_or(StorageError::MissingUser)?;
        let operands = serde_json::to_string(record.operands()).map_err(ser)?;
        let progress = serde_json::to_string(record.progress()).map_err(ser)?;

        let res = sqlx::query(
            r"
                INSERT INTO session_records (
                    user_id, difficulty, operands, correct, incorrect,
                    total_questions, progress, recorded_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(user.as_str())
        .bind(record.difficulty().as_str())
        .bind(operands)
        .bind(i64::from(record.correct()))
        .bind(i64::from(record.incorrect()))
        .bind(i64::from(record.total_questions()))
        .bind(progress)
        .bind(record.timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(SessionRecordId::new(res.last_insert_rowid()))
    }

    async fn get_record(&self, id: SessionRecordId) -> Result<SessionRecord, StorageError> {
        let row = sqlx::query(
            r"
                SELECT
                    user_id, difficulty, operands, correct, incorrect,
                    total_questions, progress, recorded_at
                FROM session_records
                WHERE id = ?1
            ",
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        map_record_row(&row)
    }

    async fn list_for_user(
        &self,
        user: &UserId,
        limit: u32,
    ) -> Result<Vec<SessionRecordRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, user_id, difficulty, operands, correct, incorrect,
                    total_questions, progress, recorded_at
                FROM session_records
                WHERE user_id = ?1
                ORDER BY recorded_at ASC, id ASC
                LIMIT ?2
            ",
        )
        .bind(user.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.try_get("id").map_err(ser)?;
            out.push(SessionRecordRow::new(
                SessionRecordId::new(id),
                map_record_row(&row)?,
            ));
        }

        Ok(out)
    }
}
