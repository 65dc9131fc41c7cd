//! Per-record serialization of reconciliation attempts.
//!
//! Two attempts for the same `(kind, id)` must not interleave their
//! read → submit → write sequence. Attempts for different records never wait
//! on each other. Entries are dropped from the map once no attempt holds or
//! waits for them.

use std::{collections::HashMap, sync::Arc};

use agritrack_sync_store::{EntityKind, RecordId};
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Key = (EntityKind, RecordId);

/// Map of per-record async locks.
#[derive(Debug, Default)]
pub(crate) struct RecordLocks {
    locks: Mutex<HashMap<Key, Arc<AsyncMutex<()>>>>,
}

impl RecordLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Waits until no other attempt holds the record.
    pub(crate) async fn acquire(&self, kind: EntityKind, id: RecordId) -> RecordGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock();
            Arc::clone(locks.entry((kind, id)).or_default())
        };

        let guard = lock.lock_owned().await;
        RecordGuard { locks: self, key: (kind, id), guard: Some(guard) }
    }

    /// Number of records with a live lock entry.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.lock().len()
    }
}

/// Held for the duration of one attempt.
pub(crate) struct RecordGuard<'a> {
    locks: &'a RecordLocks,
    key: Key,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for RecordGuard<'_> {
    fn drop(&mut self) {
        // Release first so the map holds the only other reference if idle
        drop(self.guard.take());

        let mut locks = self.locks.locks.lock();
        if let Some(lock) = locks.get(&self.key)
            && Arc::strong_count(lock) == 1
        {
            locks.remove(&self.key);
        }
    }
}
