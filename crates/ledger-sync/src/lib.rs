//! Hyperledger Fabric reconciliation for AgriTrack traceability records.
//!
//! Domain writes commit locally first. This crate mirrors each committed
//! record onto the supply-chain chaincode and records the outcome on the
//! local row, so the ledger never sits on the request path.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Domain Layer                            │
//! │      commit record ──► Reconciler::schedule(kind, id)       │
//! ├─────────────────────────────────────────────────────────────┤
//! │                     Reconciler                              │
//! │   TaskTracker │ Semaphore │ per-record locks │ panic guard  │
//! ├──────────────────────────────┬──────────────────────────────┤
//! │       ContractGateway        │   DomainStore (sync-store)   │
//! │  typed chaincode operations  │  session.get / stage / commit│
//! ├──────────────────────────────┴──────────────────────────────┤
//! │                  LedgerTransport                            │
//! │         FabricTransport (mTLS gRPC) │ NoOpTransport         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use agritrack_ledger_sync::{LedgerContext, LedgerSettings, ReconcilerConfig};
//! use agritrack_sync_store::{
//!     DomainRecord, DomainStore, EntityKind, MemoryDomainStore, SyncState,
//!     record::{CertificationRecord, RecordPayload},
//! };
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryDomainStore::new());
//!     let context = LedgerContext::from_config(&LedgerSettings::from_env()?);
//!     let reconciler = context.reconciler(store.clone(), ReconcilerConfig::default());
//!
//!     let record = DomainRecord::new(RecordPayload::Certification(CertificationRecord {
//!         processing_record_id: Uuid::new_v4(),
//!         cert_type: "organic".into(),
//!         issued_date: None,
//!         expiry_date: None,
//!         issuer_id: None,
//!         notes: None,
//!     }));
//!     let id = record.id;
//!     store.insert(record).await?;
//!
//!     let status = reconciler.reconcile(EntityKind::Certification, id).await?;
//!     assert_ne!(status.state, SyncState::Pending);
//!
//!     reconciler.shutdown().await;
//!     context.close().await;
//!     Ok(())
//! }
//! ```
//!
//! # Error Classification
//!
//! | Failure                                   | Error                                  |
//! | ----------------------------------------- | -------------------------------------- |
//! | missing setting, bad peer URI             | [`LedgerError::Configuration`]         |
//! | unreadable credentials, TLS, timeouts     | [`LedgerError::Connection`]            |
//! | chaincode rejection, failed commit        | [`LedgerError::Transaction`]           |
//!
//! Ledger errors never escape the reconciler: they end up as a `Failed` sync
//! status with the message in `sync_error`.
//!
//! # Feature Flags
//!
//! - **`testutil`**: Enables [`testutil`] with a scripted transport and test
//!   credentials.
//! - **`failpoints`**: Activates `fail` fail points in the reconciler and the
//!   memory store.

#![deny(unsafe_code)]

pub mod codec;
pub mod config;
pub mod error;
pub mod factory;
pub mod fabric;
pub mod gateway;
mod locks;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used, clippy::panic)]
pub mod testutil;
pub mod transport;
pub mod worker;

// Re-export primary types at crate root for convenience
pub use codec::LedgerArg;
pub use config::{LedgerSettings, ReconcilerConfig};
pub use error::{LedgerError, ReconcileError, Result, TransactionErrorKind};
pub use fabric::FabricTransport;
pub use factory::LedgerContext;
pub use gateway::{ContractGateway, WIRE_VERSION};
pub use transport::{LedgerTransport, NOOP_RESPONSE, NoOpTransport};
pub use worker::{Reconciler, sync_status};
