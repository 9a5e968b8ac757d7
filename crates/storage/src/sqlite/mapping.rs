use chrono::{DateTime, Utc};
use lesson_core::model::{CourseId, ProgressSnapshot};
use sqlx::Row;

use crate::repository::{ProgressEntry, StorageError};
use crate::snapshot;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn version_to_i64(snapshot: &ProgressSnapshot) -> i64 {
    i64::from(snapshot.version)
}

pub(crate) fn map_snapshot_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<ProgressSnapshot, StorageError> {
    let payload: String = row.try_get("payload").map_err(ser)?;
    Ok(snapshot::decode(&payload)?)
}

pub(crate) fn map_entry_row(row: &sqlx::sqlite::SqliteRow) -> Result<ProgressEntry, StorageError> {
    let course: String = row.try_get("course_id").map_err(ser)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(ser)?;
    Ok(ProgressEntry {
        course: CourseId::new(course),
        updated_at,
    })
}
