use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lesson_core::model::{LearnerId, ProgressSnapshot};

use crate::repository::{ProgressEntry, ProgressKey, ProgressRepository, StorageError};
use crate::snapshot;

use super::SqliteRepository;
use super::mapping::{conn, map_entry_row, map_snapshot_row, version_to_i64};

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn load_snapshot(
        &self,
        key: &ProgressKey,
    ) -> Result<Option<ProgressSnapshot>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT payload
            FROM progress_snapshots
            WHERE learner_id = ?1 AND course_id = ?2
            ",
        )
        .bind(key.learner.as_str())
        .bind(key.course.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_snapshot_row).transpose()
    }

    async fn save_snapshot(
        &self,
        key: &ProgressKey,
        snapshot: &ProgressSnapshot,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let payload = snapshot::encode(snapshot)?;
        sqlx::query(
            r"
            INSERT INTO progress_snapshots (
                learner_id,
                course_id,
                snapshot_version,
                payload,
                updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(learner_id, course_id) DO UPDATE SET
                snapshot_version = excluded.snapshot_version,
                payload = excluded.payload,
                updated_at = excluded.updated_at
            ",
        )
        .bind(key.learner.as_str())
        .bind(key.course.as_str())
        .bind(version_to_i64(snapshot))
        .bind(payload)
        .bind(saved_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn delete_snapshot(&self, key: &ProgressKey) -> Result<bool, StorageError> {
        let result = sqlx::query(
            r"
            DELETE FROM progress_snapshots
            WHERE learner_id = ?1 AND course_id = ?2
            ",
        )
        .bind(key.learner.as_str())
        .bind(key.course.as_str())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_progress(&self, learner: &LearnerId) -> Result<Vec<ProgressEntry>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT course_id, updated_at
            FROM progress_snapshots
            WHERE learner_id = ?1
            ORDER BY updated_at DESC, course_id ASC
            ",
        )
        .bind(learner.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_entry_row).collect()
    }
}
