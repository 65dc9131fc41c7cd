//! In-memory domain store implementation.
//!
//! This module provides [`MemoryDomainStore`], an in-memory implementation of
//! [`DomainStore`] suitable for testing and development.
//!
//! # Features
//!
//! - **Thread-safe**: Uses [`parking_lot::RwLock`] for concurrent access
//! - **Atomic per record**: Every update and commit runs under one write lock
//! - **Sessions**: Buffered deltas with read-your-writes
//!
//! # Example
//!
//! ```
//! use agritrack_sync_store::{
//!     DomainStore, EntityKind, MemoryDomainStore, RecordDelta, SyncOutcome, SyncState,
//!     SyncStatusStore,
//! };
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! # let record = agritrack_sync_store::DomainRecord::new(
//! #     agritrack_sync_store::record::RecordPayload::Certification(
//! #         agritrack_sync_store::record::CertificationRecord {
//! #             processing_record_id: uuid::Uuid::new_v4(),
//! #             cert_type: "organic".into(),
//! #             issued_date: None,
//! #             expiry_date: None,
//! #             issuer_id: None,
//! #             notes: None,
//! #         },
//! #     ),
//! # );
//! let store = MemoryDomainStore::new();
//! let id = record.id;
//! store.insert(record).await.unwrap();
//!
//! let mut session = store.session().await.unwrap();
//! session.stage(EntityKind::Certification, id, SyncOutcome::confirmed_now("tx-1").into());
//! session.commit().await.unwrap();
//!
//! let status = store.read_status(EntityKind::Certification, id).await.unwrap();
//! assert_eq!(status.state, SyncState::Confirmed);
//! # });
//! ```
//!
//! # Limitations
//!
//! - Data is not persisted; all data is lost when the process exits
//! - Sessions do not detect write-write conflicts; the last commit wins

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use fail::fail_point;
use parking_lot::RwLock;

use crate::{
    error::{StoreError, StoreResult},
    record::DomainRecord,
    status::{RecordDelta, SyncState},
    store::{DomainStore, StoreSession},
    types::{EntityKind, RecordId},
};

type RecordMap = HashMap<(EntityKind, RecordId), DomainRecord>;

/// In-memory domain store keyed by `(kind, id)`.
///
/// # Cloning
///
/// `MemoryDomainStore` is cheaply cloneable via [`Arc`]. All clones share the
/// same underlying records.
#[derive(Clone, Debug, Default)]
pub struct MemoryDomainStore {
    records: Arc<RwLock<RecordMap>>,
}

impl MemoryDomainStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records across all kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns `true` if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Removes a record, simulating local deletion.
    ///
    /// Returns the removed record, if any.
    pub fn remove(&self, kind: EntityKind, id: RecordId) -> Option<DomainRecord> {
        self.records.write().remove(&(kind, id))
    }
}

#[async_trait]
impl DomainStore for MemoryDomainStore {
    #[tracing::instrument(skip(self, record), fields(kind = %record.kind(), id = %record.id))]
    async fn insert(&self, record: DomainRecord) -> StoreResult<()> {
        let key = (record.kind(), record.id);
        let mut records = self.records.write();

        if records.contains_key(&key) {
            return Err(StoreError::already_exists(key.0, key.1));
        }

        records.insert(key, record);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn get(&self, kind: EntityKind, id: RecordId) -> StoreResult<Option<DomainRecord>> {
        Ok(self.records.read().get(&(kind, id)).cloned())
    }

    #[tracing::instrument(skip(self, delta), fields(state = %delta.outcome.state()))]
    async fn update(&self, kind: EntityKind, id: RecordId, delta: RecordDelta) -> StoreResult<()> {
        let mut records = self.records.write();
        let record = records.get_mut(&(kind, id)).ok_or_else(|| StoreError::not_found(kind, id))?;
        record.apply(&delta);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn list_by_status(
        &self,
        kind: EntityKind,
        state: SyncState,
    ) -> StoreResult<Vec<RecordId>> {
        let records = self.records.read();
        let mut ids: Vec<RecordId> = records
            .values()
            .filter(|record| record.kind() == kind && record.sync.state == state)
            .map(|record| record.id)
            .collect();
        ids.sort();
        Ok(ids)
    }

    #[tracing::instrument(skip(self))]
    async fn session(&self) -> StoreResult<Box<dyn StoreSession>> {
        fail_point!("store-open-session", |_| {
            Err(StoreError::connection("injected session failure"))
        });

        Ok(Box::new(MemorySession { records: Arc::clone(&self.records), staged: Vec::new() }))
    }
}

/// Session over a [`MemoryDomainStore`].
struct MemorySession {
    records: Arc<RwLock<RecordMap>>,
    staged: Vec<(EntityKind, RecordId, RecordDelta)>,
}

#[async_trait]
impl StoreSession for MemorySession {
    async fn get(&self, kind: EntityKind, id: RecordId) -> StoreResult<Option<DomainRecord>> {
        let mut record = match self.records.read().get(&(kind, id)) {
            Some(record) => record.clone(),
            None => return Ok(None),
        };

        for (staged_kind, staged_id, delta) in &self.staged {
            if *staged_kind == kind && *staged_id == id {
                record.apply(delta);
            }
        }

        Ok(Some(record))
    }

    fn stage(&mut self, kind: EntityKind, id: RecordId, delta: RecordDelta) {
        self.staged.push((kind, id, delta));
    }

    #[tracing::instrument(skip(self), fields(staged = self.staged.len()))]
    async fn commit(self: Box<Self>) -> StoreResult<()> {
        fail_point!("store-session-commit", |_| {
            Err(StoreError::internal("injected commit failure"))
        });

        let mut records = self.records.write();

        // Validate everything first so a missing record leaves the store untouched
        if let Some((kind, id, _)) =
            self.staged.iter().find(|(kind, id, _)| !records.contains_key(&(*kind, *id)))
        {
            return Err(StoreError::not_found(*kind, *id));
        }

        for (kind, id, delta) in &self.staged {
            if let Some(record) = records.get_mut(&(*kind, *id)) {
                record.apply(delta);
            }
        }

        Ok(())
    }
}
