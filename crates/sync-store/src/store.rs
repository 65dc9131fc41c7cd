//! Store traits consumed by the reconciliation worker.
//!
//! [`DomainStore`] is the contract with the local relational store. The
//! worker never borrows the request's connection scope: it opens a
//! [`StoreSession`] of its own, reads the committed record through it,
//! stages the terminal sync state and commits.
//!
//! [`SyncStatusStore`] is not a separate physical store. It is the
//! four-field projection every [`DomainStore`] exposes through a blanket
//! implementation.

use async_trait::async_trait;

use crate::{
    error::{StoreError, StoreResult},
    record::DomainRecord,
    status::{RecordDelta, SyncState, SyncStatus},
    types::{EntityKind, RecordId},
};

/// Local domain store holding syncable records.
///
/// Implementations must apply every [`update`](DomainStore::update) and every
/// session commit atomically per record: concurrent readers observe either
/// the full delta or none of it.
#[async_trait]
pub trait DomainStore: Send + Sync {
    /// Commits a new record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] if a record with the same kind
    /// and id is present.
    async fn insert(&self, record: DomainRecord) -> StoreResult<()>;

    /// Retrieves a record.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))` if the record exists
    /// - `Ok(None)` if it doesn't
    /// - `Err(...)` on store errors
    async fn get(&self, kind: EntityKind, id: RecordId) -> StoreResult<Option<DomainRecord>>;

    /// Applies a field delta to a record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the record doesn't exist.
    async fn update(&self, kind: EntityKind, id: RecordId, delta: RecordDelta) -> StoreResult<()>;

    /// Lists ids of records of `kind` currently in `state`.
    async fn list_by_status(&self, kind: EntityKind, state: SyncState)
    -> StoreResult<Vec<RecordId>>;

    /// Opens a session private to the caller.
    async fn session(&self) -> StoreResult<Box<dyn StoreSession>>;
}

/// A unit of work against the store, owned by a single task.
///
/// Reads see staged deltas (read-your-writes). Staged deltas are applied
/// together on [`commit`](StoreSession::commit); dropping the session
/// discards them.
#[async_trait]
pub trait StoreSession: Send + Sync {
    /// Retrieves a record, including any delta staged in this session.
    async fn get(&self, kind: EntityKind, id: RecordId) -> StoreResult<Option<DomainRecord>>;

    /// Stages a delta for a record.
    fn stage(&mut self, kind: EntityKind, id: RecordId, delta: RecordDelta);

    /// Applies all staged deltas.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if a staged record disappeared
    /// before commit; in that case nothing is applied.
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}

/// Read/write access to the sync fields of records.
#[async_trait]
pub trait SyncStatusStore: Send + Sync {
    /// Reads the sync status of a record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the record doesn't exist.
    async fn read_status(&self, kind: EntityKind, id: RecordId) -> StoreResult<SyncStatus>;

    /// Writes a sync delta to a record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the record doesn't exist.
    async fn write_status(
        &self,
        kind: EntityKind,
        id: RecordId,
        delta: RecordDelta,
    ) -> StoreResult<()>;
}

#[async_trait]
impl<S> SyncStatusStore for S
where
    S: DomainStore + ?Sized,
{
    async fn read_status(&self, kind: EntityKind, id: RecordId) -> StoreResult<SyncStatus> {
        self.get(kind, id)
            .await?
            .map(|record| record.sync)
            .ok_or_else(|| StoreError::not_found(kind, id))
    }

    async fn write_status(
        &self,
        kind: EntityKind,
        id: RecordId,
        delta: RecordDelta,
    ) -> StoreResult<()> {
        self.update(kind, id, delta).await
    }
}
