//! Day-keyed sequence counters
//!
//! `reserve_next` previews the next number without side effects; only
//! `commit_next` mutates and persists. The persisted form is one JSON object
//! `{"{year}-{dayOfYear}": n}` under [`SEQ_STORE_KEY`], capped at
//! [`RETAINED_DAYS`] entries.

use std::collections::BTreeMap;

use tracing::{debug, instrument, warn};

use super::kv::KeyValueStore;
use super::{StorageError, StorageResult};
use crate::day::DayKey;

/// Key of the serialized counter map in the key-value store
pub const SEQ_STORE_KEY: &str = "unit_seq_store_v1";

/// Number of most recent day buckets kept after a commit
pub const RETAINED_DAYS: usize = 370;

type Counters = BTreeMap<DayKey, u32>;

/// Counter store injected into the identifier generator and committer
pub trait SequenceStore {
    /// Last committed sequence for a day (0 if none)
    fn get(&self, key: DayKey) -> u32;

    /// Sequence the next commit would return, without mutating anything
    fn reserve_next(&self, key: DayKey) -> u32 {
        self.get(key).saturating_add(1)
    }

    /// Increment, prune and persist; returns the new value
    fn commit_next(&mut self, key: DayKey) -> u32;

    /// Keep only the [`RETAINED_DAYS`] greatest day keys
    fn prune(&mut self);
}

/// Drop the oldest keys (by key order) beyond the retention cap
fn retain_recent(counters: &mut Counters) {
    while counters.len() > RETAINED_DAYS {
        counters.pop_first();
    }
}

fn bump(counters: &mut Counters, key: DayKey) -> u32 {
    let slot = counters.entry(key).or_insert(0);
    *slot = slot.saturating_add(1);
    *slot
}

/// Non-persistent store, for tests and ephemeral sessions
#[derive(Debug, Default, Clone)]
pub struct MemorySequenceStore {
    counters: Counters,
}

impl MemorySequenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn day_keys(&self) -> Vec<DayKey> {
        self.counters.keys().copied().collect()
    }
}

impl SequenceStore for MemorySequenceStore {
    fn get(&self, key: DayKey) -> u32 {
        self.counters.get(&key).copied().unwrap_or(0)
    }

    fn commit_next(&mut self, key: DayKey) -> u32 {
        let next = bump(&mut self.counters, key);
        self.prune();
        next
    }

    fn prune(&mut self) {
        retain_recent(&mut self.counters);
    }
}

/// Store persisted through a [`KeyValueStore`]
///
/// Every operation re-reads the backing value, so a preview reflects commits
/// made through another handle on the same backing store. When the backing
/// store cannot be read, holds undecodable data, or rejects a write, the
/// store degrades for the rest of its lifetime: counting continues in memory
/// from the last good state and nothing is written again.
pub struct PersistentSequenceStore<K> {
    kv: K,
    cache: Counters,
    degraded: bool,
}

impl<K: KeyValueStore> PersistentSequenceStore<K> {
    pub fn new(kv: K) -> Self {
        let mut store = Self {
            kv,
            cache: Counters::new(),
            degraded: false,
        };
        match store.load() {
            Ok(counters) => store.cache = counters,
            Err(e) => store.degrade(&e),
        }
        store
    }

    /// Whether numbering has fallen back to memory only
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Day keys currently held, oldest first
    pub fn day_keys(&self) -> Vec<DayKey> {
        self.current().keys().copied().collect()
    }

    fn load(&self) -> StorageResult<Counters> {
        match self.kv.read(SEQ_STORE_KEY)? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Counters::new()),
        }
    }

    fn persist(&self) -> StorageResult<()> {
        let bytes = serde_json::to_vec(&self.cache).map_err(StorageError::from)?;
        self.kv.write(SEQ_STORE_KEY, &bytes)
    }

    fn current(&self) -> Counters {
        if self.degraded {
            return self.cache.clone();
        }
        match self.load() {
            Ok(counters) => counters,
            Err(e) => {
                warn!(error = %e, "Sequence store read failed, using last known counters");
                self.cache.clone()
            }
        }
    }

    fn degrade(&mut self, error: &StorageError) {
        if !self.degraded {
            warn!(
                error = %error,
                "Sequence store unavailable, numbering continues in memory for this run"
            );
        }
        self.degraded = true;
    }
}

impl<K: KeyValueStore> SequenceStore for PersistentSequenceStore<K> {
    fn get(&self, key: DayKey) -> u32 {
        if self.degraded {
            return self.cache.get(&key).copied().unwrap_or(0);
        }
        self.current().get(&key).copied().unwrap_or(0)
    }

    #[instrument(skip(self), fields(day = %key, degraded = self.degraded))]
    fn commit_next(&mut self, key: DayKey) -> u32 {
        if !self.degraded {
            match self.load() {
                Ok(counters) => self.cache = counters,
                Err(e) => self.degrade(&e),
            }
        }

        let next = bump(&mut self.cache, key);
        retain_recent(&mut self.cache);

        if !self.degraded
            && let Err(e) = self.persist()
        {
            self.degrade(&e);
        }
        debug!(sequence = next, "Sequence committed");
        next
    }

    fn prune(&mut self) {
        if !self.degraded {
            match self.load() {
                Ok(counters) => self.cache = counters,
                Err(e) => self.degrade(&e),
            }
        }

        let held = self.cache.len();
        retain_recent(&mut self.cache);
        if self.cache.len() == held {
            return;
        }

        if !self.degraded
            && let Err(e) = self.persist()
        {
            self.degrade(&e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::kv::{MemoryKeyValueStore, RedbKeyValueStore};

    /// Backing store that reads fine but rejects every write
    struct ReadOnlyKv(MemoryKeyValueStore);

    impl KeyValueStore for ReadOnlyKv {
        fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
            self.0.read(key)
        }

        fn write(&self, _key: &str, _value: &[u8]) -> StorageResult<()> {
            Err(StorageError::Poisoned)
        }
    }

    /// Backing store that cannot even be read
    struct BrokenKv;

    impl KeyValueStore for BrokenKv {
        fn read(&self, _key: &str) -> StorageResult<Option<Vec<u8>>> {
            Err(StorageError::Poisoned)
        }

        fn write(&self, _key: &str, _value: &[u8]) -> StorageResult<()> {
            Err(StorageError::Poisoned)
        }
    }

    fn day(n: u32) -> DayKey {
        DayKey::new(2025, n)
    }

    #[test]
    fn test_reserve_does_not_mutate() {
        let store = MemorySequenceStore::new();
        assert_eq!(store.reserve_next(day(1)), 1);
        assert_eq!(store.reserve_next(day(1)), 1);
        assert_eq!(store.get(day(1)), 0);
    }

    #[test]
    fn test_commit_increments_per_day() {
        let mut store = MemorySequenceStore::new();
        assert_eq!(store.commit_next(day(1)), 1);
        assert_eq!(store.commit_next(day(1)), 2);
        assert_eq!(store.commit_next(day(2)), 1);
        assert_eq!(store.reserve_next(day(1)), 3);
    }

    #[test]
    fn test_retention_evicts_oldest_key() {
        let mut store = MemorySequenceStore::new();
        let keys: Vec<DayKey> = (0..371)
            .map(|i| DayKey::new(2024 + (i / 300) as i32, i % 300 + 1))
            .collect();
        for key in &keys {
            store.commit_next(*key);
        }

        let held = store.day_keys();
        assert_eq!(held.len(), RETAINED_DAYS);
        assert!(!held.contains(&keys[0]));
        assert_eq!(held, keys[1..].to_vec());
    }

    #[test]
    fn test_persistent_survives_restart() {
        let kv = MemoryKeyValueStore::new();
        {
            let mut store = PersistentSequenceStore::new(kv.clone());
            store.commit_next(day(123));
            store.commit_next(day(123));
        }
        let store = PersistentSequenceStore::new(kv.clone());
        assert_eq!(store.get(day(123)), 2);
        assert_eq!(store.reserve_next(day(123)), 3);

        let raw = kv.read(SEQ_STORE_KEY).unwrap().unwrap();
        assert_eq!(raw, br#"{"2025-123":2}"#);
    }

    #[test]
    fn test_preview_sees_commits_from_other_handle() {
        let kv = MemoryKeyValueStore::new();
        let mut writer = PersistentSequenceStore::new(kv.clone());
        let reader = PersistentSequenceStore::new(kv);

        assert_eq!(reader.reserve_next(day(5)), 1);
        writer.commit_next(day(5));
        assert_eq!(reader.reserve_next(day(5)), 2);
    }

    #[test]
    fn test_prune_keeps_commits_from_other_handle() {
        let kv = MemoryKeyValueStore::new();
        let mut stale = PersistentSequenceStore::new(kv.clone());
        let mut writer = PersistentSequenceStore::new(kv.clone());

        writer.commit_next(day(5));
        writer.commit_next(day(5));
        stale.prune();

        assert_eq!(writer.get(day(5)), 2);
        assert_eq!(stale.get(day(5)), 2);
        assert_eq!(kv.read(SEQ_STORE_KEY).unwrap().unwrap(), br#"{"2025-5":2}"#);
    }

    #[test]
    fn test_prune_writes_only_on_eviction() {
        let inner = MemoryKeyValueStore::new();
        inner.write(SEQ_STORE_KEY, br#"{"2025-1":3}"#).unwrap();

        // A write would fail and degrade the store
        let mut store = PersistentSequenceStore::new(ReadOnlyKv(inner));
        store.prune();
        assert!(!store.is_degraded());
        assert_eq!(store.get(day(1)), 3);
    }

    #[test]
    fn test_corrupt_store_degrades_to_memory() {
        let kv = MemoryKeyValueStore::new();
        kv.write(SEQ_STORE_KEY, b"not json").unwrap();

        let mut store = PersistentSequenceStore::new(kv.clone());
        assert!(store.is_degraded());
        assert_eq!(store.reserve_next(day(1)), 1);
        assert_eq!(store.commit_next(day(1)), 1);
        assert_eq!(store.commit_next(day(1)), 2);

        // Corrupt data is left for inspection, never overwritten
        assert_eq!(kv.read(SEQ_STORE_KEY).unwrap().unwrap(), b"not json");
    }

    #[test]
    fn test_unreadable_store_degrades_to_memory() {
        let mut store = PersistentSequenceStore::new(BrokenKv);
        assert!(store.is_degraded());
        assert_eq!(store.commit_next(day(9)), 1);
        assert_eq!(store.commit_next(day(9)), 2);
        assert_eq!(store.get(day(9)), 2);
    }

    #[test]
    fn test_write_failure_keeps_counting() {
        let inner = MemoryKeyValueStore::new();
        inner.write(SEQ_STORE_KEY, br#"{"2025-1":7}"#).unwrap();

        let mut store = PersistentSequenceStore::new(ReadOnlyKv(inner));
        assert!(!store.is_degraded());
        assert_eq!(store.commit_next(day(1)), 8);
        assert!(store.is_degraded());
        assert_eq!(store.commit_next(day(1)), 9);
        assert_eq!(store.reserve_next(day(1)), 10);
    }

    #[test]
    fn test_persistent_retention() {
        let kv = RedbKeyValueStore::open_in_memory().unwrap();
        let mut store = PersistentSequenceStore::new(kv.clone());
        for i in 1..=366 {
            store.commit_next(DayKey::new(2024, i));
        }
        for i in 1..=5 {
            store.commit_next(DayKey::new(2025, i));
        }

        let reopened = PersistentSequenceStore::new(kv);
        let held = reopened.day_keys();
        assert_eq!(held.len(), RETAINED_DAYS);
        assert_eq!(held.first(), Some(&DayKey::new(2024, 2)));
        assert_eq!(held.last(), Some(&DayKey::new(2025, 5)));
        assert_eq!(reopened.get(DayKey::new(2024, 1)), 0);
    }
}
