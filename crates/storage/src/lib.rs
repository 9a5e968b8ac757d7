#![forbid(unsafe_code)]

pub mod repository;
pub mod snapshot;
pub mod sqlite;

pub use repository::{
    InMemoryRepository, ProgressEntry, ProgressKey, ProgressRepository, Storage, StorageError,
};
pub use snapshot::SnapshotError;
