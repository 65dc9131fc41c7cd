#![allow(clippy::expect_used, clippy::panic)]
//! Integration tests for fail-point injection.
//!
//! These tests require the `failpoints` feature:
//! ```bash
//! cargo test -p agritrack-sync-store --features failpoints --test failpoint_tests
//! ```

use agritrack_sync_store::{
    DomainStore, EntityKind, StoreError, SyncOutcome, SyncState, SyncStatusStore, testutil,
};

#[tokio::test]
async fn session_commit_failpoint_leaves_record_untouched() {
    let scenario = fail::FailScenario::setup();
    fail::cfg("store-session-commit", "return").expect("failed to configure fail point");

    let (store, ids) = testutil::seeded_store(vec![testutil::batch_record()]).await;
    let mut session = store.session().await.expect("session should open");
    session.stage(EntityKind::Batch, ids[0], SyncOutcome::confirmed_now("tx-1").into());

    let result = session.commit().await;
    assert!(matches!(result, Err(StoreError::Internal { .. })), "got: {result:?}");

    let status = store.read_status(EntityKind::Batch, ids[0]).await.expect("read should succeed");
    assert_eq!(status.state, SyncState::Pending);

    scenario.teardown();
}

#[tokio::test]
async fn open_session_failpoint_returns_connection_error() {
    let scenario = fail::FailScenario::setup();
    fail::cfg("store-open-session", "return").expect("failed to configure fail point");

    let store = agritrack_sync_store::MemoryDomainStore::new();
    let result = store.session().await;

    assert!(matches!(result, Err(StoreError::Connection { .. })));

    scenario.teardown();
}

#[tokio::test]
async fn session_commit_without_failpoint_succeeds() {
    let scenario = fail::FailScenario::setup();
    // No fail point configured, the commit goes through

    let (store, ids) = testutil::seeded_store(vec![testutil::batch_record()]).await;
    let mut session = store.session().await.expect("session should open");
    session.stage(EntityKind::Batch, ids[0], SyncOutcome::confirmed_now("tx-1").into());
    session.commit().await.expect("commit should succeed");

    let status = store.read_status(EntityKind::Batch, ids[0]).await.expect("read should succeed");
    assert_eq!(status.state, SyncState::Confirmed);

    scenario.teardown();
}
