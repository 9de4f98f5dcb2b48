//! Durable key-value collaborator
//!
//! The label engine persists exactly one logical value (the serialized
//! sequence map), so the contract is a plain byte-oriented `read`/`write`.
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `kv` | `&str` | `&[u8]` | Serialized engine state |

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::{StorageError, StorageResult};

const KV_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");

/// Byte-oriented durable store
pub trait KeyValueStore {
    /// Read a value, `None` if the key was never written
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Replace the value of a key
    fn write(&self, key: &str, value: &[u8]) -> StorageResult<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        (**self).write(key, value)
    }
}

/// Key-value store backed by redb
///
/// redb commits with `Durability::Immediate`: a value is on disk once
/// `write` returns, and the file stays consistent across power loss.
#[derive(Clone)]
pub struct RedbKeyValueStore {
    db: Arc<Database>,
}

impl RedbKeyValueStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(KV_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }
}

impl KeyValueStore for RedbKeyValueStore {
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(KV_TABLE)?;
        Ok(table.get(key)?.map(|guard| guard.value().to_vec()))
    }

    fn write(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(KV_TABLE)?;
            table.insert(key, value)?;
        }
        txn.commit()?;
        Ok(())
    }
}

/// Process-local store, lost on exit
#[derive(Debug, Default, Clone)]
pub struct MemoryKeyValueStore {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}
