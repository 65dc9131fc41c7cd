//! Shared record fixtures for store and reconciliation tests.
//!
//! Feature-gated behind `testutil` so the fixtures never reach production
//! builds.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! agritrack-sync-store = { path = "../sync-store", features = ["testutil"] }
//! ```
//!
//! ```no_run
//! // Requires the `testutil` feature to be enabled.
//! use agritrack_sync_store::testutil::{batch_record, seeded_store};
//! ```

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::{
    DomainStore,
    memory::MemoryDomainStore,
    record::{
        BatchRecord, CertificationRecord, DomainRecord, LifecycleEventRecord, LifecycleEventType,
        ProcessingRecord, RecordPayload, RegulatoryRecord, TemperatureLogRecord, TransportRecord,
    },
    types::RecordId,
};

/// Fixed reference instant used by every fixture: 2024-03-01T08:00:00Z.
#[must_use]
pub fn fixture_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).single().expect("fixture time is valid")
}

/// A pending batch with every optional field populated.
#[must_use]
pub fn batch_record() -> DomainRecord {
    DomainRecord::new(RecordPayload::Batch(BatchRecord {
        product_id: Uuid::new_v4(),
        farmer_id: Uuid::new_v4(),
        batch_number: "BATCH-2024-0042".into(),
        quantity: 500,
        start_date: fixture_time(),
        expected_end_date: Some(fixture_time() + chrono::Duration::days(42)),
        location: Some("House 3".into()),
        qr_code: Some("https://trace.example/b/0042".into()),
        notes: None,
    }))
}

/// A pending vaccination event.
#[must_use]
pub fn lifecycle_event_record() -> DomainRecord {
    DomainRecord::new(RecordPayload::LifecycleEvent(LifecycleEventRecord {
        batch_id: Uuid::new_v4(),
        event_type: LifecycleEventType::Vaccination,
        description: "Newcastle disease vaccine".into(),
        recorded_by: Uuid::new_v4(),
        event_date: fixture_time(),
        quantity_affected: Some(500),
        metadata: None,
    }))
}

/// A pending, temperature-monitored transport manifest.
#[must_use]
pub fn transport_record() -> DomainRecord {
    DomainRecord::new(RecordPayload::Transport(TransportRecord {
        batch_id: Uuid::new_v4(),
        from_party_id: Uuid::new_v4(),
        to_party_id: Uuid::new_v4(),
        vehicle_id: Some("KDA 123X".into()),
        driver_name: Some("J. Mwangi".into()),
        departure_time: fixture_time(),
        origin_location: "Farm A".into(),
        destination_location: "Processor B".into(),
        temperature_monitored: true,
        notes: None,
    }))
}

/// A pending temperature reading.
#[must_use]
pub fn temperature_log_record(temperature: f64) -> DomainRecord {
    DomainRecord::new(RecordPayload::TemperatureLog(TemperatureLogRecord {
        transport_id: Uuid::new_v4(),
        temperature,
        timestamp: fixture_time(),
        location: None,
        is_violation: false,
    }))
}

/// A pending processing record.
#[must_use]
pub fn processing_record() -> DomainRecord {
    DomainRecord::new(RecordPayload::ProcessingRecord(ProcessingRecord {
        batch_id: Uuid::new_v4(),
        processing_date: fixture_time(),
        facility_name: "Processor B".into(),
        slaughter_count: Some(480),
        yield_kg: Some(912.5),
        quality_score: None,
        notes: None,
    }))
}

/// A pending certification with issuer and dates left unset.
#[must_use]
pub fn certification_record() -> DomainRecord {
    DomainRecord::new(RecordPayload::Certification(CertificationRecord {
        processing_record_id: Uuid::new_v4(),
        cert_type: "halal".into(),
        issued_date: None,
        expiry_date: None,
        issuer_id: None,
        notes: None,
    }))
}

/// A pending regulatory record.
#[must_use]
pub fn regulatory_record() -> DomainRecord {
    DomainRecord::new(RecordPayload::RegulatoryRecord(RegulatoryRecord {
        batch_id: Uuid::new_v4(),
        record_type: "export_permit".into(),
        issued_date: Some(fixture_time()),
        expiry_date: None,
        regulator_id: Uuid::new_v4(),
        details: None,
        audit_flags: None,
    }))
}

/// One pending record of every kind, in [`EntityKind::ALL`](crate::EntityKind::ALL) order.
#[must_use]
pub fn one_of_each() -> Vec<DomainRecord> {
    vec![
        batch_record(),
        lifecycle_event_record(),
        transport_record(),
        temperature_log_record(5.0),
        processing_record(),
        certification_record(),
        regulatory_record(),
    ]
}

/// Create a [`MemoryDomainStore`] holding the given records.
///
/// Returns the store together with the inserted ids, in input order.
///
/// # Panics
///
/// Panics if two records share a kind and id.
pub async fn seeded_store(records: Vec<DomainRecord>) -> (MemoryDomainStore, Vec<RecordId>) {
    let store = MemoryDomainStore::new();
    let mut ids = Vec::with_capacity(records.len());
    for record in records {
        ids.push(record.id);
        store.insert(record).await.expect("seed insert failed");
    }
    (store, ids)
}

/// Assert that a [`StoreResult`](crate::StoreResult) is a
/// [`StoreError::NotFound`](crate::StoreError::NotFound).
#[macro_export]
macro_rules! assert_not_found {
    ($result:expr) => {{
        let result = $result;
        assert!(
            matches!(result, Err($crate::error::StoreError::NotFound { .. })),
            "expected StoreError::NotFound, got: {:?}",
            result,
        );
    }};
}
