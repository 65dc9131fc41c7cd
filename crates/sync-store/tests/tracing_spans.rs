//! Integration test verifying that `#[instrument]` annotations produce
//! the expected spans on `MemoryDomainStore` operations.

#![allow(clippy::expect_used)]

use std::sync::{Arc, Mutex};

use agritrack_sync_store::{
    DomainStore, EntityKind, MemoryDomainStore, RecordId, SyncOutcome, SyncState, testutil,
};
use tracing::Subscriber;
use tracing_subscriber::{layer::SubscriberExt, registry::LookupSpan};

// ---------------------------------------------------------------------------
// Collecting layer, records span names as they are created
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct SpanCollector {
    spans: Arc<Mutex<Vec<String>>>,
}

impl<S> tracing_subscriber::Layer<S> for SpanCollector
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        _attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if let Some(span) = ctx.span(id) {
            self.spans.lock().expect("lock poisoned").push(span.name().to_owned());
        }
    }
}

fn collect() -> (Arc<Mutex<Vec<String>>>, tracing::subscriber::DefaultGuard) {
    let collector = SpanCollector::default();
    let spans = Arc::clone(&collector.spans);
    let subscriber = tracing_subscriber::registry().with(collector);
    (spans, tracing::subscriber::set_default(subscriber))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn insert_creates_span() {
    let (spans, _guard) = collect();

    let store = MemoryDomainStore::new();
    store.insert(testutil::batch_record()).await.expect("insert should succeed");

    let recorded = spans.lock().expect("lock poisoned");
    assert!(recorded.iter().any(|s| s == "insert"), "expected an 'insert' span, got: {recorded:?}");
}

#[tokio::test]
async fn get_creates_span() {
    let (spans, _guard) = collect();

    let store = MemoryDomainStore::new();
    let _ = store.get(EntityKind::Batch, RecordId::new()).await;

    let recorded = spans.lock().expect("lock poisoned");
    assert!(recorded.iter().any(|s| s == "get"), "expected a 'get' span, got: {recorded:?}");
}

#[tokio::test]
async fn update_creates_span_even_on_error() {
    let (spans, _guard) = collect();

    let store = MemoryDomainStore::new();
    let _ = store.update(EntityKind::Batch, RecordId::new(), SyncOutcome::failed("x").into()).await;

    let recorded = spans.lock().expect("lock poisoned");
    assert!(recorded.iter().any(|s| s == "update"), "expected an 'update' span, got: {recorded:?}");
}

#[tokio::test]
async fn list_by_status_creates_span() {
    let (spans, _guard) = collect();

    let store = MemoryDomainStore::new();
    let _ = store.list_by_status(EntityKind::Transport, SyncState::Pending).await;

    let recorded = spans.lock().expect("lock poisoned");
    assert!(
        recorded.iter().any(|s| s == "list_by_status"),
        "expected a 'list_by_status' span, got: {recorded:?}"
    );
}

#[tokio::test]
async fn session_commit_creates_span() {
    let (spans, _guard) = collect();

    let store = MemoryDomainStore::new();
    let session = store.session().await.expect("session should open");
    session.commit().await.expect("empty commit should succeed");

    let recorded = spans.lock().expect("lock poisoned");
    assert!(recorded.iter().any(|s| s == "session"), "expected a 'session' span, got: {recorded:?}");
    assert!(recorded.iter().any(|s| s == "commit"), "expected a 'commit' span, got: {recorded:?}");
}
