//! Durable state for label numbering
//!
//! - [`kv`]: the byte-oriented persistence collaborator (redb or memory)
//! - [`sequence`]: day-keyed counters with preview/commit semantics

pub mod kv;
pub mod sequence;

pub use kv::{KeyValueStore, MemoryKeyValueStore, RedbKeyValueStore};
pub use sequence::{
    MemorySequenceStore, PersistentSequenceStore, RETAINED_DAYS, SEQ_STORE_KEY, SequenceStore,
};

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Storage errors
///
/// Never fatal for label numbering: the sequence store logs them and
/// degrades to an in-memory counter.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    Poisoned,
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Key-value store shared behind a trait object
pub type SharedKeyValueStore = Arc<dyn KeyValueStore + Send + Sync>;

/// Open the sequence store backed by the redb file at `db_path`
///
/// If the file cannot be opened (missing directory, locked by another
/// process) the store runs on memory for this process and logs a warning.
pub fn open_sequence_store(db_path: &Path) -> PersistentSequenceStore<SharedKeyValueStore> {
    let opened = db_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map_or(Ok(()), std::fs::create_dir_all)
        .map_err(|e| e.to_string())
        .and_then(|()| RedbKeyValueStore::open(db_path).map_err(|e| e.to_string()));

    let kv: SharedKeyValueStore = match opened {
        Ok(kv) => {
            tracing::info!(path = %db_path.display(), "Sequence store opened");
            Arc::new(kv)
        }
        Err(error) => {
            tracing::warn!(
                path = %db_path.display(),
                error = %error,
                "Sequence store unavailable, numbering is not persisted for this run"
            );
            Arc::new(MemoryKeyValueStore::new())
        }
    };
    PersistentSequenceStore::new(kv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::day::DayKey;

    #[test]
    fn test_open_creates_parent_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("label.redb");
        let day = DayKey::new(2025, 123);

        {
            let mut store = open_sequence_store(&path);
            assert_eq!(store.commit_next(day), 1);
            assert!(!store.is_degraded());
        }
        assert!(path.exists());
        assert_eq!(open_sequence_store(&path).get(day), 1);
    }

    #[test]
    fn test_open_failure_falls_back_to_memory() {
        let tmp = tempfile::tempdir().unwrap();
        // A directory cannot be opened as a database file
        let mut store = open_sequence_store(tmp.path());
        let day = DayKey::new(2025, 123);
        assert_eq!(store.commit_next(day), 1);
        assert_eq!(store.commit_next(day), 2);
    }
}
