use drill_core::model::{Difficulty, ProgressEntry, SessionRecord, UserId};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn map_record_row(row: &sqlx::sqlite::SqliteRow) -> Result<SessionRecord, StorageError> {
    let user = UserId::new(row.try_get::<String, _>("user_id").map_err(ser)?).map_err(ser)?;
    let difficulty = row
        .try_get::<String, _>("difficulty")
        .map_err(ser)?
        .parse::<Difficulty>()
        .map_err(ser)?;
    let operands: Vec<i32> =
        serde_json::from_str(&row.try_get::<String, _>("operands").map_err(ser)?).map_err(ser)?;
    let progress: Vec<ProgressEntry> =
        serde_json::from_str(&row.try_get::<String, _>("progress").map_err(ser)?).map_err(ser)?;
    let correct = u32_from_i64("correct", row.try_get::<i64, _>("correct").map_err(ser)?)?;
    let incorrect = u32_from_i64("incorrect", row.try_get::<i64, _>("incorrect").map_err(ser)?)?;
    let total_questions = u32_from_i64(
        "total_questions",
        row.try_get::<i64, _>("total_questions").map_err(ser)?,
    )?;
    let recorded_at = row.try_get("recorded_at").map_err(ser)?;

    SessionRecord::from_persisted(
        Some(user),
        difficulty,
        operands,
        correct,
        incorrect,
        total_questions,
        progress,
        recorded_at,
    )
    .map_err(ser)
}
