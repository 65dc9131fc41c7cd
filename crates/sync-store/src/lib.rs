//! Local record store abstraction and ledger sync status tracking for AgriTrack.
//!
//! Every traceability record (batch, lifecycle event, transport manifest,
//! temperature log, processing record, certification, regulatory record) is
//! committed to the local store first and mirrored to the Fabric ledger
//! later. This crate owns the local side of that contract: the record types,
//! the four sync fields each record carries, and the [`DomainStore`] trait
//! the reconciliation worker reads and writes through.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Domain Layer                             │
//! │        (HTTP handlers creating batches, events, ...)        │
//! ├─────────────────────────────────────────────────────────────┤
//! │                 agritrack-ledger-sync                       │
//! │         Reconciler │ ContractGateway │ Transports           │
//! ├─────────────────────────────────────────────────────────────┤
//! │                 agritrack-sync-store                        │
//! │        DomainStore │ StoreSession │ SyncStatusStore         │
//! ├──────────────────────┬──────────────────────────────────────┤
//! │  MemoryDomainStore   │   relational store (external)        │
//! │      (testing)       │                                      │
//! └──────────────────────┴──────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use agritrack_sync_store::{
//!     DomainRecord, DomainStore, EntityKind, MemoryDomainStore, SyncState, SyncStatusStore,
//!     record::{CertificationRecord, RecordPayload},
//! };
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemoryDomainStore::new();
//!
//!     let record = DomainRecord::new(RecordPayload::Certification(CertificationRecord {
//!         processing_record_id: Uuid::new_v4(),
//!         cert_type: "halal".into(),
//!         issued_date: None,
//!         expiry_date: None,
//!         issuer_id: None,
//!         notes: None,
//!     }));
//!     let id = record.id;
//!     store.insert(record).await?;
//!
//!     let status = store.read_status(EntityKind::Certification, id).await?;
//!     assert_eq!(status.state, SyncState::Pending);
//!     Ok(())
//! }
//! ```
//!
//! # Feature Flags
//!
//! - **`testutil`**: Enables the `testutil` module with record fixtures.
//! - **`failpoints`**: Activates `fail` fail points inside the memory store.

#![deny(unsafe_code)]

pub mod error;
pub mod memory;
pub mod record;
pub mod status;
pub mod store;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used)]
pub mod testutil;
pub mod types;

// Re-export primary types at crate root for convenience
pub use error::{StoreError, StoreResult};
pub use memory::MemoryDomainStore;
pub use record::{DomainRecord, RecordPayload};
pub use status::{RecordDelta, SyncOutcome, SyncState, SyncStatus};
pub use store::{DomainStore, StoreSession, SyncStatusStore};
pub use types::{EntityKind, RecordId};
