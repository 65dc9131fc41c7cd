//! Background reconciliation of locally committed records with the ledger.
//!
//! [`Reconciler::schedule`] is called right after a domain write commits. It
//! spawns one task and returns immediately; the caller never observes the
//! ledger call or its failure. Each task:
//!
//! 1. opens a store session of its own and re-reads the record,
//! 2. submits the record's creation transaction through the gateway,
//! 3. stages the terminal sync state and commits the session.
//!
//! ```text
//!  schedule(kind, id) / reconcile(kind, id)
//!        │ spawn (schedule is bounded by max_concurrent_tasks)
//!        ▼
//!  ┌───────────────┐ per-record lock  ┌───────────────┐
//!  │ panic boundary│ ───────────────► │    attempt    │── session.get
//!  └───────┬───────┘                  └───────┬───────┘── gateway.submit_record
//!          │ JoinError::Panic                 │         ── session.commit
//!          ▼                                  ▼
//!      Failed("reconciliation task panicked: ...")   Confirmed | Failed
//! ```
//!
//! There is no automatic retry. A failed record stays `Failed` until someone
//! schedules it again.

use std::{any::Any, sync::Arc};

use agritrack_sync_store::{
    DomainRecord, DomainStore, EntityKind, RecordDelta, RecordId, StoreError, StoreResult,
    SyncOutcome, SyncState, SyncStatus, SyncStatusStore,
};
use fail::fail_point;
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

use crate::{
    config::ReconcilerConfig,
    error::{LedgerError, ReconcileError},
    gateway::{ContractGateway, creation_function},
    locks::RecordLocks,
};

/// Failure detail recorded when a success response has no transaction id.
pub const MISSING_TX_ID: &str = "ledger response carried no transaction id";

/// Reads the sync status of a record.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] if the record doesn't exist.
pub async fn sync_status<S>(store: &S, kind: EntityKind, id: RecordId) -> StoreResult<SyncStatus>
where
    S: SyncStatusStore + ?Sized,
{
    store.read_status(kind, id).await
}

/// Schedules and runs reconciliation attempts.
///
/// Cheap to clone; all clones share the same task set and locks.
#[derive(Clone)]
pub struct Reconciler {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn DomainStore>,
    gateway: ContractGateway,
    config: ReconcilerConfig,
    tracker: TaskTracker,
    permits: Arc<Semaphore>,
    locks: RecordLocks,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("gateway", &self.inner.gateway)
            .field("config", &self.inner.config)
            .field("in_flight", &self.inner.tracker.len())
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Creates a reconciler writing to `store` and submitting through `gateway`.
    #[must_use]
    pub fn new(
        store: Arc<dyn DomainStore>,
        gateway: ContractGateway,
        config: ReconcilerConfig,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent_tasks));
        Self {
            inner: Arc::new(Inner {
                store,
                gateway,
                config,
                tracker: TaskTracker::new(),
                permits,
                locks: RecordLocks::new(),
            }),
        }
    }

    /// Schedules one reconciliation attempt and returns immediately.
    ///
    /// Calling it again for a `Failed` record is how a failed sync is
    /// retried. Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::ShutDown`] after [`shutdown`](Self::shutdown).
    pub fn schedule(&self, kind: EntityKind, id: RecordId) -> Result<(), ReconcileError> {
        if self.inner.tracker.is_closed() {
            return Err(ReconcileError::ShutDown);
        }

        let inner = Arc::clone(&self.inner);
        let span = tracing::info_span!("reconcile_task", %kind, %id);
        self.inner.tracker.spawn(
            async move {
                let Ok(_permit) = Arc::clone(&inner.permits).acquire_owned().await else {
                    return;
                };

                match inner.attempt_guarded(kind, id).await {
                    Ok(_) => {},
                    // Already logged where it was detected
                    Err(err) if err.is_not_found() => {},
                    Err(err) => tracing::error!(error = %err, "reconciliation attempt aborted"),
                }
            }
            .instrument(span),
        );

        tracing::debug!(%kind, %id, "reconciliation scheduled");
        Ok(())
    }

    /// Runs one attempt and waits for it.
    ///
    /// Ledger failures do not surface here: they are persisted and show up
    /// in the returned status as `Failed`.
    ///
    /// # Errors
    ///
    /// - [`ReconcileError::Store`] wrapping [`StoreError::NotFound`] if the
    ///   record does not exist; nothing is written
    /// - [`ReconcileError::Store`] if the store fails
    pub async fn reconcile(
        &self,
        kind: EntityKind,
        id: RecordId,
    ) -> Result<SyncStatus, ReconcileError> {
        self.inner.attempt_guarded(kind, id).await
    }

    /// Lists records of `kind` that have not reached the ledger yet.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Store`] if the store fails.
    pub async fn pending_records(&self, kind: EntityKind) -> Result<Vec<RecordId>, ReconcileError> {
        Ok(self.inner.store.list_by_status(kind, SyncState::Pending).await?)
    }

    /// Number of reconciliation tasks still running.
    ///
    /// A scheduled attempt counts until its record lock is released.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.tracker.len()
    }

    /// Stops accepting new work and waits for in-flight attempts.
    pub async fn shutdown(&self) {
        self.inner.tracker.close();
        tracing::info!(in_flight = self.inner.tracker.len(), "reconciler shutting down");
        self.inner.tracker.wait().await;
    }
}

impl Inner {
    /// Runs one attempt on its own task and waits for it.
    ///
    /// The record lock lives inside that task, so dropping the returned
    /// future detaches the attempt without releasing the lock early.
    async fn attempt_guarded(
        self: &Arc<Self>,
        kind: EntityKind,
        id: RecordId,
    ) -> Result<SyncStatus, ReconcileError> {
        let inner = Arc::clone(self);
        let handle = self.tracker.spawn(
            async move {
                let _guard = inner.locks.acquire(kind, id).await;
                inner.attempt_isolated(kind, id).await
            }
            .in_current_span(),
        );

        match handle.await {
            Ok(result) => result,
            Err(join_err) => {
                tracing::error!(%kind, %id, error = %join_err, "reconciliation task aborted");
                Err(ReconcileError::Aborted(join_err.to_string()))
            },
        }
    }

    /// Runs the attempt on a nested task and turns a panic into `Failed`.
    ///
    /// Callers hold the record lock.
    async fn attempt_isolated(
        self: &Arc<Self>,
        kind: EntityKind,
        id: RecordId,
    ) -> Result<SyncStatus, ReconcileError> {
        let inner = Arc::clone(self);
        let handle = tokio::spawn(async move { inner.attempt(kind, id).await }.in_current_span());

        match handle.await {
            Ok(result) => result,
            Err(join_err) => {
                let error = if join_err.is_panic() {
                    format!("reconciliation task panicked: {}", panic_message(join_err.into_panic()))
                } else {
                    "reconciliation task was cancelled".to_owned()
                };
                tracing::error!(%kind, %id, error = %error, "reconciliation task did not complete");
                self.persist_failure(kind, id, error).await
            },
        }
    }

    #[tracing::instrument(name = "reconcile", skip_all, fields(%kind, %id))]
    async fn attempt(&self, kind: EntityKind, id: RecordId) -> Result<SyncStatus, ReconcileError> {
        let mut session = self.store.session().await?;

        let Some(record) = session.get(kind, id).await? else {
            tracing::error!(%kind, %id, "record not found for ledger sync");
            return Err(StoreError::not_found(kind, id).into());
        };

        if record.sync.is_confirmed() {
            tracing::debug!(tx_id = ?record.sync.ledger_tx_id, "record already confirmed");
            return Ok(record.sync);
        }

        fail_point!("reconcile-before-submit");

        let delta = self.submit(&record).await;

        let mut status = record.sync;
        status.apply(&delta.outcome);
        session.stage(kind, id, delta);
        session.commit().await?;

        Ok(status)
    }

    async fn submit(&self, record: &DomainRecord) -> RecordDelta {
        let function = creation_function(record.kind());
        let timeout = self.config.attempt_timeout;

        let result =
            match tokio::time::timeout(timeout, self.gateway.submit_record(record)).await {
                Ok(result) => result,
                Err(_) => Err(LedgerError::timeout(function, timeout)),
            };

        match result {
            Ok(response) => match confirmation(record.kind(), &response) {
                Some(delta) => {
                    if let SyncOutcome::Confirmed { tx_id, .. } = &delta.outcome {
                        tracing::info!(function, %tx_id, "record synced to ledger");
                    }
                    delta
                },
                None => {
                    tracing::error!(function, response = %response, "{MISSING_TX_ID}");
                    SyncOutcome::failed(MISSING_TX_ID).into()
                },
            },
            Err(err) => {
                if err.is_connection() {
                    tracing::warn!(function, error = %err, "ledger unreachable, record marked failed");
                } else {
                    tracing::error!(function, error = %err, "ledger rejected record");
                }
                SyncOutcome::failed(err.to_string()).into()
            },
        }
    }

    async fn persist_failure(
        &self,
        kind: EntityKind,
        id: RecordId,
        error: String,
    ) -> Result<SyncStatus, ReconcileError> {
        let mut session = self.store.session().await?;
        let Some(record) = session.get(kind, id).await? else {
            return Err(StoreError::not_found(kind, id).into());
        };

        let outcome = SyncOutcome::failed(error);
        let mut status = record.sync;
        status.apply(&outcome);
        session.stage(kind, id, outcome.into());
        session.commit().await?;

        Ok(status)
    }
}

/// Builds the confirmation delta from a submit response.
///
/// Returns `None` when the response names no transaction.
fn confirmation(kind: EntityKind, response: &str) -> Option<RecordDelta> {
    let json: Value = serde_json::from_str(response).ok()?;
    let tx_id = json.get("transaction_id").and_then(Value::as_str).filter(|tx| !tx.is_empty())?;

    let delta = RecordDelta::new(SyncOutcome::confirmed_now(tx_id));
    if kind != EntityKind::TemperatureLog {
        return Some(delta);
    }

    let verdict = json
        .get("result")
        .and_then(|result| result.get("is_violation"))
        .or_else(|| json.get("is_violation"))
        .and_then(Value::as_bool);

    Some(match verdict {
        Some(flag) => delta.with_violation(flag),
        None => delta,
    })
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_reads_transaction_id() {
        let delta = confirmation(EntityKind::Batch, r#"{"transaction_id":"tx-1"}"#).unwrap();
        assert_eq!(delta.outcome.state(), SyncState::Confirmed);
        assert!(delta.is_violation.is_none());
    }

    #[test]
    fn test_confirmation_without_tx_id_is_none() {
        assert!(confirmation(EntityKind::Batch, r#"{"result":{}}"#).is_none());
        assert!(confirmation(EntityKind::Batch, r#"{"transaction_id":""}"#).is_none());
        assert!(confirmation(EntityKind::Batch, "not json").is_none());
        assert!(confirmation(EntityKind::Batch, r#"{"transaction_id":42}"#).is_none());
    }

    #[test]
    fn test_violation_read_from_nested_result() {
        let response = r#"{"transaction_id":"tx-2","result":{"is_violation":true}}"#;
        let delta = confirmation(EntityKind::TemperatureLog, response).unwrap();
        assert_eq!(delta.is_violation, Some(true));
    }

    #[test]
    fn test_violation_read_from_top_level() {
        let response = r#"{"transaction_id":"tx-3","is_violation":false}"#;
        let delta = confirmation(EntityKind::TemperatureLog, response).unwrap();
        assert_eq!(delta.is_violation, Some(false));
    }

    #[test]
    fn test_violation_ignored_for_other_kinds() {
        let response = r#"{"transaction_id":"tx-4","result":{"is_violation":true}}"#;
        let delta = confirmation(EntityKind::Transport, response).unwrap();
        assert!(delta.is_violation.is_none());
    }

    #[test]
    fn test_panic_message_variants() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(7_u8)), "unknown panic payload");
    }
}
