//! Typed operations over the supply-chain chaincode.
//!
//! [`ContractGateway`] has one method per chaincode function. Each method
//! encodes its arguments with [`LedgerArg`](crate::codec::LedgerArg) in the
//! fixed order the chaincode expects and returns the raw ledger response.
//! There is no business validation here: the chaincode is the authority.
//!
//! # Wire contract
//!
//! The argument order of every function is versioned as [`WIRE_VERSION`].
//! Reordering, inserting or removing an argument is a breaking change to
//! the ledger contract and must bump it.
//!
//! Record projections fill absent optional values as follows:
//!
//! | Field                                   | When absent     |
//! |-----------------------------------------|-----------------|
//! | batch and temperature `location`        | `"unspecified"` |
//! | counts and measurements                 | `"0"`           |
//! | certification `issuer_id`               | `"system"`      |
//! | other strings, dates                    | `""`            |

use std::sync::Arc;

use agritrack_sync_store::{
    EntityKind, RecordId,
    record::{
        BatchRecord, CertificationRecord, DomainRecord, LifecycleEventRecord, ProcessingRecord,
        RecordPayload, RegulatoryRecord, TemperatureLogRecord, TransportRecord,
    },
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{codec::LedgerArg, error::Result, ledger_args, transport::LedgerTransport};

/// Version of the chaincode argument order.
pub const WIRE_VERSION: u32 = 1;

/// Location sent when a record has none.
const UNSPECIFIED_LOCATION: &str = "unspecified";

/// Issuer sent when a certification has none.
const SYSTEM_ISSUER: &str = "system";

/// Chaincode function that creates the ledger asset for a record kind.
#[must_use]
pub fn creation_function(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Batch => "CreateBatch",
        EntityKind::LifecycleEvent => "RecordLifecycleEvent",
        EntityKind::Transport => "CreateTransportManifest",
        EntityKind::TemperatureLog => "AddTemperatureLog",
        EntityKind::ProcessingRecord => "RecordProcessing",
        EntityKind::Certification => "IssueCertification",
        EntityKind::RegulatoryRecord => "CreateRegulatoryRecord",
    }
}

/// Typed client for the supply-chain chaincode.
///
/// Cheap to clone; all clones share the transport.
#[derive(Clone)]
pub struct ContractGateway {
    transport: Arc<dyn LedgerTransport>,
}

impl std::fmt::Debug for ContractGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractGateway").field("transport", &self.transport.name()).finish()
    }
}

impl ContractGateway {
    /// Creates a gateway over the given transport.
    #[must_use]
    pub fn new(transport: Arc<dyn LedgerTransport>) -> Self {
        Self { transport }
    }

    /// Returns the underlying transport.
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn LedgerTransport> {
        &self.transport
    }

    async fn submit(&self, function: &'static str, args: Vec<String>) -> Result<String> {
        tracing::debug!(function, args = args.len(), transport = self.transport.name(), "submit");
        self.transport.submit(function, &args).await
    }

    async fn evaluate(&self, function: &'static str, args: Vec<String>) -> Result<String> {
        tracing::debug!(function, args = args.len(), transport = self.transport.name(), "evaluate");
        self.transport.evaluate(function, &args).await
    }

    /// Submits the creation transaction matching a record's kind.
    ///
    /// Values are read from the record as stored locally.
    pub async fn submit_record(&self, record: &DomainRecord) -> Result<String> {
        let id = record.id;
        match &record.payload {
            RecordPayload::Batch(batch) => self.create_batch(id, batch).await,
            RecordPayload::LifecycleEvent(event) => self.record_lifecycle_event(id, event).await,
            RecordPayload::Transport(transport) => {
                self.create_transport_manifest(id, transport).await
            },
            RecordPayload::TemperatureLog(log) => self.add_temperature_log(id, log).await,
            RecordPayload::ProcessingRecord(processing) => {
                self.record_processing(id, processing).await
            },
            RecordPayload::Certification(cert) => self.issue_certification(id, cert).await,
            RecordPayload::RegulatoryRecord(regulatory) => {
                self.create_regulatory_record(id, regulatory).await
            },
        }
    }

    // ------------------------------------------------------------------
    // Products
    // ------------------------------------------------------------------

    /// `CreateProduct(product_id, name, description)`
    pub async fn create_product(
        &self,
        product_id: Uuid,
        name: &str,
        description: &str,
    ) -> Result<String> {
        self.submit("CreateProduct", ledger_args![product_id, name, description]).await
    }

    /// `GetProduct(product_id)`
    pub async fn get_product(&self, product_id: Uuid) -> Result<String> {
        self.evaluate("GetProduct", ledger_args![product_id]).await
    }

    /// `DeactivateProduct(product_id)`
    pub async fn deactivate_product(&self, product_id: Uuid) -> Result<String> {
        self.submit("DeactivateProduct", ledger_args![product_id]).await
    }

    // ------------------------------------------------------------------
    // Batches
    // ------------------------------------------------------------------

    /// `CreateBatch(batch_id, product_id, farmer_id, batch_number, quantity,
    /// start_date, expected_end_date, location, qr_code, notes)`
    pub async fn create_batch(&self, batch_id: RecordId, batch: &BatchRecord) -> Result<String> {
        self.submit("CreateBatch", create_batch_args(batch_id, batch)).await
    }

    /// `GetBatch(batch_id)`
    pub async fn get_batch(&self, batch_id: Uuid) -> Result<String> {
        self.evaluate("GetBatch", ledger_args![batch_id]).await
    }

    /// `UpdateBatchStatus(batch_id, new_status)`
    pub async fn update_batch_status(&self, batch_id: Uuid, new_status: &str) -> Result<String> {
        self.submit("UpdateBatchStatus", ledger_args![batch_id, new_status]).await
    }

    /// `CompleteBatch(batch_id, actual_end_date)`
    pub async fn complete_batch(
        &self,
        batch_id: Uuid,
        actual_end_date: DateTime<Utc>,
    ) -> Result<String> {
        self.submit("CompleteBatch", ledger_args![batch_id, actual_end_date]).await
    }

    /// `GetBatchesByFarmer(farmer_id)`
    pub async fn get_batches_by_farmer(&self, farmer_id: Uuid) -> Result<String> {
        self.evaluate("GetBatchesByFarmer", ledger_args![farmer_id]).await
    }

    // ------------------------------------------------------------------
    // Lifecycle events
    // ------------------------------------------------------------------

    /// `RecordLifecycleEvent(event_id, batch_id, event_type, description,
    /// recorded_by, event_date, quantity_affected, metadata)`
    pub async fn record_lifecycle_event(
        &self,
        event_id: RecordId,
        event: &LifecycleEventRecord,
    ) -> Result<String> {
        let args = ledger_args![
            event_id,
            event.batch_id,
            event.event_type.as_str(),
            event.description,
            event.recorded_by,
            event.event_date,
            event.quantity_affected.unwrap_or(0),
            event.metadata,
        ];
        self.submit("RecordLifecycleEvent", args).await
    }

    /// `GetBatchLifecycleEvents(batch_id)`
    pub async fn get_batch_lifecycle_events(&self, batch_id: Uuid) -> Result<String> {
        self.evaluate("GetBatchLifecycleEvents", ledger_args![batch_id]).await
    }

    // ------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------

    /// `CreateTransportManifest(transport_id, batch_id, from_party_id,
    /// to_party_id, vehicle_id, driver_name, departure_time, origin_location,
    /// destination_location, temperature_monitored, notes)`
    pub async fn create_transport_manifest(
        &self,
        transport_id: RecordId,
        transport: &TransportRecord,
    ) -> Result<String> {
        let args = ledger_args![
            transport_id,
            transport.batch_id,
            transport.from_party_id,
            transport.to_party_id,
            transport.vehicle_id,
            transport.driver_name,
            transport.departure_time,
            transport.origin_location,
            transport.destination_location,
            transport.temperature_monitored,
            transport.notes,
        ];
        self.submit("CreateTransportManifest", args).await
    }

    /// `UpdateTransportStatus(transport_id, new_status, arrival_time)`
    pub async fn update_transport_status(
        &self,
        transport_id: Uuid,
        new_status: &str,
        arrival_time: Option<DateTime<Utc>>,
    ) -> Result<String> {
        self.submit("UpdateTransportStatus", ledger_args![transport_id, new_status, arrival_time])
            .await
    }

    /// `GetTransport(transport_id)`
    pub async fn get_transport(&self, transport_id: Uuid) -> Result<String> {
        self.evaluate("GetTransport", ledger_args![transport_id]).await
    }

    /// `GetTransportsByBatch(batch_id)`
    pub async fn get_transports_by_batch(&self, batch_id: Uuid) -> Result<String> {
        self.evaluate("GetTransportsByBatch", ledger_args![batch_id]).await
    }

    /// `AddTemperatureLog(log_id, transport_id, temperature, timestamp, location)`
    ///
    /// The chaincode flags readings outside its safe range; the verdict comes
    /// back as `is_violation` in the response.
    pub async fn add_temperature_log(
        &self,
        log_id: RecordId,
        log: &TemperatureLogRecord,
    ) -> Result<String> {
        let location = log.location.as_deref().unwrap_or(UNSPECIFIED_LOCATION);
        let args =
            ledger_args![log_id, log.transport_id, log.temperature, log.timestamp, location];
        self.submit("AddTemperatureLog", args).await
    }

    /// `GetTransportTemperatureLogs(transport_id)`
    pub async fn get_transport_temperature_logs(&self, transport_id: Uuid) -> Result<String> {
        self.evaluate("GetTransportTemperatureLogs", ledger_args![transport_id]).await
    }

    // ------------------------------------------------------------------
    // Processing and certification
    // ------------------------------------------------------------------

    /// `RecordProcessing(processing_id, batch_id, process_date, facility_name,
    /// slaughter_count, yield_kg, quality_score, notes)`
    pub async fn record_processing(
        &self,
        processing_id: RecordId,
        processing: &ProcessingRecord,
    ) -> Result<String> {
        let args = ledger_args![
            processing_id,
            processing.batch_id,
            processing.processing_date,
            processing.facility_name,
            processing.slaughter_count.unwrap_or(0),
            processing.yield_kg.unwrap_or(0.0),
            processing.quality_score.unwrap_or(0.0),
            processing.notes,
        ];
        self.submit("RecordProcessing", args).await
    }

    /// `GetProcessingRecord(processing_id)`
    pub async fn get_processing_record(&self, processing_id: Uuid) -> Result<String> {
        self.evaluate("GetProcessingRecord", ledger_args![processing_id]).await
    }

    /// `IssueCertification(certification_id, processing_id, cert_type,
    /// issued_date, expiry_date, issuer_id, notes)`
    pub async fn issue_certification(
        &self,
        certification_id: RecordId,
        cert: &CertificationRecord,
    ) -> Result<String> {
        let issuer = cert.issuer_id.map_or_else(|| SYSTEM_ISSUER.to_owned(), |id| id.encode());
        let args = ledger_args![
            certification_id,
            cert.processing_record_id,
            cert.cert_type,
            cert.issued_date,
            cert.expiry_date,
            issuer,
            cert.notes,
        ];
        self.submit("IssueCertification", args).await
    }

    /// `UpdateCertificationStatus(certification_id, new_status)`
    pub async fn update_certification_status(
        &self,
        certification_id: Uuid,
        new_status: &str,
    ) -> Result<String> {
        self.submit("UpdateCertificationStatus", ledger_args![certification_id, new_status]).await
    }

    /// `GetCertification(certification_id)`
    pub async fn get_certification(&self, certification_id: Uuid) -> Result<String> {
        self.evaluate("GetCertification", ledger_args![certification_id]).await
    }

    /// `GetCertificationsByProcessing(processing_id)`
    pub async fn get_certifications_by_processing(&self, processing_id: Uuid) -> Result<String> {
        self.evaluate("GetCertificationsByProcessing", ledger_args![processing_id]).await
    }

    // ------------------------------------------------------------------
    // Regulatory
    // ------------------------------------------------------------------

    /// `CreateRegulatoryRecord(regulatory_id, batch_id, record_type,
    /// issued_date, expiry_date, regulator_id, details, audit_flags)`
    pub async fn create_regulatory_record(
        &self,
        regulatory_id: RecordId,
        regulatory: &RegulatoryRecord,
    ) -> Result<String> {
        let args = ledger_args![
            regulatory_id,
            regulatory.batch_id,
            regulatory.record_type,
            regulatory.issued_date,
            regulatory.expiry_date,
            regulatory.regulator_id,
            regulatory.details,
            regulatory.audit_flags,
        ];
        self.submit("CreateRegulatoryRecord", args).await
    }

    /// `UpdateRegulatoryStatus(regulatory_id, new_status, rejection_reason)`
    pub async fn update_regulatory_status(
        &self,
        regulatory_id: Uuid,
        new_status: &str,
        rejection_reason: Option<&str>,
    ) -> Result<String> {
        self.submit(
            "UpdateRegulatoryStatus",
            ledger_args![regulatory_id, new_status, rejection_reason],
        )
        .await
    }

    /// `GetRegulatoryRecord(regulatory_id)`
    pub async fn get_regulatory_record(&self, regulatory_id: Uuid) -> Result<String> {
        self.evaluate("GetRegulatoryRecord", ledger_args![regulatory_id]).await
    }

    /// `GetRegulatoryRecordsByBatch(batch_id)`
    pub async fn get_regulatory_records_by_batch(&self, batch_id: Uuid) -> Result<String> {
        self.evaluate("GetRegulatoryRecordsByBatch", ledger_args![batch_id]).await
    }
}

/// Argument vector of `CreateBatch`.
///
/// Exposed so the ordering can be checked without a transport.
#[must_use]
pub fn create_batch_args(batch_id: RecordId, batch: &BatchRecord) -> Vec<String> {
    let location = batch.location.as_deref().unwrap_or(UNSPECIFIED_LOCATION);
    ledger_args![
        batch_id,
        batch.product_id,
        batch.farmer_id,
        batch.batch_number,
        batch.quantity,
        batch.start_date,
        batch.expected_end_date,
        location,
        batch.qr_code,
        batch.notes,
    ]
}
