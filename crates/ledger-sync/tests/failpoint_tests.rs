#![allow(clippy::expect_used, clippy::panic)]
//! Integration tests for fail-point injection into reconciliation.
//!
//! These tests require the `failpoints` feature:
//! ```bash
//! cargo test -p agritrack-ledger-sync --features failpoints --test failpoint_tests
//! ```

use std::sync::Arc;

use agritrack_ledger_sync::{
    ContractGateway, Reconciler, ReconcilerConfig, testutil::ScriptedTransport,
};
use agritrack_sync_store::{
    EntityKind, MemoryDomainStore, SyncState, SyncStatusStore, testutil,
};

fn reconciler(store: &MemoryDomainStore, transport: Arc<ScriptedTransport>) -> Reconciler {
    Reconciler::new(
        Arc::new(store.clone()),
        ContractGateway::new(transport),
        ReconcilerConfig::default(),
    )
}

#[tokio::test]
async fn panic_before_submit_is_persisted_as_failure() {
    let scenario = fail::FailScenario::setup();
    fail::cfg("reconcile-before-submit", "panic(boom)").expect("failed to configure fail point");

    let (store, ids) = testutil::seeded_store(vec![testutil::batch_record()]).await;
    let transport = Arc::new(ScriptedTransport::new());
    let reconciler = reconciler(&store, Arc::clone(&transport));

    reconciler.schedule(EntityKind::Batch, ids[0]).expect("schedule should succeed");
    reconciler.shutdown().await;

    let status = store.read_status(EntityKind::Batch, ids[0]).await.expect("read should succeed");
    assert_eq!(status.state, SyncState::Failed);
    assert_eq!(status.ledger_error.as_deref(), Some("reconciliation task panicked: boom"));
    assert!(transport.calls().is_empty(), "the ledger must not be called");

    scenario.teardown();
}

#[tokio::test]
async fn unavailable_store_aborts_attempt_without_ledger_call() {
    let scenario = fail::FailScenario::setup();
    fail::cfg("store-open-session", "return").expect("failed to configure fail point");

    let (store, ids) = testutil::seeded_store(vec![testutil::certification_record()]).await;
    let transport = Arc::new(ScriptedTransport::new());
    let reconciler = reconciler(&store, Arc::clone(&transport));

    let result = reconciler.reconcile(EntityKind::Certification, ids[0]).await;
    assert!(result.is_err(), "got: {result:?}");
    assert!(transport.calls().is_empty());

    fail::remove("store-open-session");
    let status =
        store.read_status(EntityKind::Certification, ids[0]).await.expect("read should succeed");
    assert_eq!(status.state, SyncState::Pending);

    scenario.teardown();
}

#[tokio::test]
async fn failed_commit_leaves_record_pending() {
    let scenario = fail::FailScenario::setup();
    fail::cfg("store-session-commit", "return").expect("failed to configure fail point");

    let (store, ids) = testutil::seeded_store(vec![testutil::batch_record()]).await;
    let transport = Arc::new(ScriptedTransport::new());
    let reconciler = reconciler(&store, Arc::clone(&transport));

    let result = reconciler.reconcile(EntityKind::Batch, ids[0]).await;
    assert!(result.is_err(), "got: {result:?}");
    assert_eq!(transport.calls().len(), 1);

    let status = store.read_status(EntityKind::Batch, ids[0]).await.expect("read should succeed");
    assert_eq!(status.state, SyncState::Pending);

    scenario.teardown();
}
