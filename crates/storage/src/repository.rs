use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lesson_core::model::{CourseId, LearnerId, ProgressSnapshot};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::snapshot::{self, SnapshotError};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// One learner's progress in one course.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgressKey {
    pub learner: LearnerId,
    pub course: CourseId,
}

impl ProgressKey {
    #[must_use]
    pub fn new(learner: impl Into<LearnerId>, course: impl Into<CourseId>) -> Self {
        Self {
            learner: learner.into(),
            course: course.into(),
        }
    }
}

/// Listing row for a stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEntry {
    pub course: CourseId,
    pub updated_at: DateTime<Utc>,
}

/// Persisted shape: the encoded snapshot plus when it was written.
#[derive(Debug, Clone)]
struct StoredSnapshot {
    payload: String,
    updated_at: DateTime<Utc>,
}

/// Repository contract for progress snapshots.
///
/// Blobs are stored encoded and decoded on load, so a load may fail with
/// `StorageError::Snapshot` when the stored data is corrupt or too new.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the snapshot for `key`, migrated to the current version.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Snapshot` for undecodable blobs, or other storage errors.
    async fn load_snapshot(&self, key: &ProgressKey)
    -> Result<Option<ProgressSnapshot>, StorageError>;

    /// Persist or replace the snapshot for `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be encoded or stored.
    async fn save_snapshot(
        &self,
        key: &ProgressKey,
        snapshot: &ProgressSnapshot,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Remove the snapshot for `key`; returns true if one existed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the delete fails.
    async fn delete_snapshot(&self, key: &ProgressKey) -> Result<bool, StorageError>;

    /// Courses the learner has saved progress for, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the listing fails.
    async fn list_progress(&self, learner: &LearnerId) -> Result<Vec<ProgressEntry>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    snapshots: Arc<Mutex<HashMap<ProgressKey, StoredSnapshot>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw payload as is, bypassing the codec.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn insert_raw(
        &self,
        key: ProgressKey,
        payload: impl Into<String>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .snapshots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(
            key,
            StoredSnapshot {
                payload: payload.into(),
                updated_at,
            },
        );
        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn load_snapshot(
        &self,
        key: &ProgressKey,
    ) -> Result<Option<ProgressSnapshot>, StorageError> {
        let guard = self
            .snapshots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .get(key)
            .map(|stored| snapshot::decode(&stored.payload))
            .transpose()
            .map_err(StorageError::from)
    }

    async fn save_snapshot(
        &self,
        key: &ProgressKey,
        snapshot: &ProgressSnapshot,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let payload = snapshot::encode(snapshot)?;
        self.insert_raw(key.clone(), payload, saved_at)
    }

    async fn delete_snapshot(&self, key: &ProgressKey) -> Result<bool, StorageError> {
        let mut guard = self
            .snapshots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.remove(key).is_some())
    }

    async fn list_progress(&self, learner: &LearnerId) -> Result<Vec<ProgressEntry>, StorageError> {
        let guard = self
            .snapshots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut entries: Vec<ProgressEntry> = guard
            .iter()
            .filter(|(key, _)| &key.learner == learner)
            .map(|(key, stored)| ProgressEntry {
                course: key.course.clone(),
                updated_at: stored.updated_at,
            })
            .collect();
        entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.course.cmp(&b.course)));
        Ok(entries)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            progress: Arc::new(InMemoryRepository::new()),
        }
    }
}
