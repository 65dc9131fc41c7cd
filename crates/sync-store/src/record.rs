//! Syncable domain records.
//!
//! The payload types mirror the local tables the ledger projection is built
//! from. Field meaning and optionality follow the relational schema; the
//! ledger only ever receives a flattened string projection of these values,
//! never the records themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    status::{RecordDelta, SyncStatus},
    types::{EntityKind, RecordId},
};

/// A production batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord {
    /// Product this batch produces.
    pub product_id: Uuid,
    /// Farmer who owns the batch.
    pub farmer_id: Uuid,
    /// Human-facing unique tracking number.
    pub batch_number: String,
    /// Number of units (animals, kilograms, ...).
    pub quantity: u32,
    /// When the batch started.
    pub start_date: DateTime<Utc>,
    /// Planned end of the batch.
    pub expected_end_date: Option<DateTime<Utc>>,
    /// Farm location or house.
    pub location: Option<String>,
    /// QR code link.
    pub qr_code: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Lifecycle event categories.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEventType {
    /// Hatching.
    Hatch,
    /// Feeding.
    Feed,
    /// Vaccination.
    Vaccination,
    /// Medication.
    Medication,
    /// Mortality.
    Mortality,
    /// Weight check.
    WeightCheck,
    /// Harvest.
    Harvest,
    /// Anything else.
    Other,
}

impl LifecycleEventType {
    /// Wire name of the event type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hatch => "hatch",
            Self::Feed => "feed",
            Self::Vaccination => "vaccination",
            Self::Medication => "medication",
            Self::Mortality => "mortality",
            Self::WeightCheck => "weight_check",
            Self::Harvest => "harvest",
            Self::Other => "other",
        }
    }
}

/// An append-only lifecycle event on a batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEventRecord {
    /// Batch the event belongs to.
    pub batch_id: Uuid,
    /// Event category.
    pub event_type: LifecycleEventType,
    /// What happened.
    pub description: String,
    /// User who recorded the event.
    pub recorded_by: Uuid,
    /// When the event happened.
    pub event_date: DateTime<Utc>,
    /// Units affected (mortality, hatch, ...).
    pub quantity_affected: Option<u32>,
    /// Extra JSON details.
    pub metadata: Option<String>,
}

/// A transport manifest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransportRecord {
    /// Batch being moved.
    pub batch_id: Uuid,
    /// Sending party.
    pub from_party_id: Uuid,
    /// Receiving party.
    pub to_party_id: Uuid,
    /// Vehicle identifier.
    pub vehicle_id: Option<String>,
    /// Driver name.
    pub driver_name: Option<String>,
    /// Departure time.
    pub departure_time: DateTime<Utc>,
    /// Origin.
    pub origin_location: String,
    /// Destination.
    pub destination_location: String,
    /// Whether the cargo is temperature monitored.
    pub temperature_monitored: bool,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// A temperature reading taken during transport.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemperatureLogRecord {
    /// Transport the reading belongs to.
    pub transport_id: Uuid,
    /// Reading in degrees Celsius.
    pub temperature: f64,
    /// When the reading was taken.
    pub timestamp: DateTime<Utc>,
    /// Where the reading was taken.
    pub location: Option<String>,
    /// Violation verdict written back from the ledger.
    pub is_violation: bool,
}

/// Output of a processing facility.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessingRecord {
    /// Batch that was processed.
    pub batch_id: Uuid,
    /// When processing took place.
    pub processing_date: DateTime<Utc>,
    /// Facility name.
    pub facility_name: String,
    /// Number of animals slaughtered.
    pub slaughter_count: Option<u32>,
    /// Yield in kilograms.
    pub yield_kg: Option<f64>,
    /// Quality score, 0-100.
    pub quality_score: Option<f64>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// A certification against a processing record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CertificationRecord {
    /// Certified processing record.
    pub processing_record_id: Uuid,
    /// halal, organic, food_safety, ...
    pub cert_type: String,
    /// Issue date.
    pub issued_date: Option<DateTime<Utc>>,
    /// Expiry date.
    pub expiry_date: Option<DateTime<Utc>>,
    /// Issuing user.
    pub issuer_id: Option<Uuid>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// A regulatory approval or compliance record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegulatoryRecord {
    /// Batch under regulation.
    pub batch_id: Uuid,
    /// health_cert, export_permit, compliance_check, ...
    pub record_type: String,
    /// Issue date.
    pub issued_date: Option<DateTime<Utc>>,
    /// Expiry date.
    pub expiry_date: Option<DateTime<Utc>>,
    /// Regulator responsible.
    pub regulator_id: Uuid,
    /// JSON or text details.
    pub details: Option<String>,
    /// JSON array of audit flags.
    pub audit_flags: Option<String>,
}

/// Kind-specific payload of a [`DomainRecord`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordPayload {
    /// See [`BatchRecord`].
    Batch(BatchRecord),
    /// See [`LifecycleEventRecord`].
    LifecycleEvent(LifecycleEventRecord),
    /// See [`TransportRecord`].
    Transport(TransportRecord),
    /// See [`TemperatureLogRecord`].
    TemperatureLog(TemperatureLogRecord),
    /// See [`ProcessingRecord`].
    ProcessingRecord(ProcessingRecord),
    /// See [`CertificationRecord`].
    Certification(CertificationRecord),
    /// See [`RegulatoryRecord`].
    RegulatoryRecord(RegulatoryRecord),
}

impl RecordPayload {
    /// The entity kind of this payload.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Batch(_) => EntityKind::Batch,
            Self::LifecycleEvent(_) => EntityKind::LifecycleEvent,
            Self::Transport(_) => EntityKind::Transport,
            Self::TemperatureLog(_) => EntityKind::TemperatureLog,
            Self::ProcessingRecord(_) => EntityKind::ProcessingRecord,
            Self::Certification(_) => EntityKind::Certification,
            Self::RegulatoryRecord(_) => EntityKind::RegulatoryRecord,
        }
    }
}

/// A locally committed record together with its ledger sync status.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DomainRecord {
    /// Immutable record id.
    pub id: RecordId,
    /// Kind-specific fields.
    pub payload: RecordPayload,
    /// Ledger sync status.
    pub sync: SyncStatus,
    /// Local creation time.
    pub created_at: DateTime<Utc>,
}

impl DomainRecord {
    /// Creates a new pending record with a fresh id.
    #[must_use]
    pub fn new(payload: RecordPayload) -> Self {
        Self::with_id(RecordId::new(), payload)
    }

    /// Creates a new pending record with the given id.
    #[must_use]
    pub fn with_id(id: RecordId, payload: RecordPayload) -> Self {
        Self { id, payload, sync: SyncStatus::pending(), created_at: Utc::now() }
    }

    /// The entity kind of this record.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.payload.kind()
    }

    /// Applies a delta produced by a reconciliation attempt.
    pub fn apply(&mut self, delta: &RecordDelta) {
        self.sync.apply(&delta.outcome);
        if let (Some(flag), RecordPayload::TemperatureLog(log)) =
            (delta.is_violation, &mut self.payload)
        {
            log.is_violation = flag;
        }
    }
}
