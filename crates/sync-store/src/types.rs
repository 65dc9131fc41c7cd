//! Common types used across store operations.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a locally committed record.
///
/// Assigned once at local creation and never changed. The same value is used
/// as the asset key on the ledger, so it is rendered in the canonical
/// hyphenated lowercase UUID form.
///
/// # Examples
///
/// ```
/// use agritrack_sync_store::RecordId;
/// use uuid::Uuid;
///
/// let raw = Uuid::nil();
/// let id = RecordId::from(raw);
/// assert_eq!(Uuid::from(id), raw);
/// assert_eq!(id.to_string(), "00000000-0000-0000-0000-000000000000");
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub Uuid);

impl RecordId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for RecordId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<RecordId> for Uuid {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// The kinds of record that carry ledger sync status.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A production batch.
    Batch,
    /// An append-only lifecycle event on a batch.
    LifecycleEvent,
    /// A transport manifest.
    Transport,
    /// A temperature reading taken during transport.
    TemperatureLog,
    /// A processing facility record.
    ProcessingRecord,
    /// A certification issued against a processing record.
    Certification,
    /// A regulatory approval or compliance record.
    RegulatoryRecord,
}

impl EntityKind {
    /// Every kind, in declaration order.
    pub const ALL: [EntityKind; 7] = [
        Self::Batch,
        Self::LifecycleEvent,
        Self::Transport,
        Self::TemperatureLog,
        Self::ProcessingRecord,
        Self::Certification,
        Self::RegulatoryRecord,
    ];

    /// Returns the snake_case name used in logs and error messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Batch => "batch",
            Self::LifecycleEvent => "lifecycle_event",
            Self::Transport => "transport",
            Self::TemperatureLog => "temperature_log",
            Self::ProcessingRecord => "processing_record",
            Self::Certification => "certification",
            Self::RegulatoryRecord => "regulatory_record",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_parse_roundtrip() {
        let id = RecordId::new();
        let parsed: RecordId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_record_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<RecordId>().is_err());
    }

    #[test]
    fn test_record_id_serializes_transparently() {
        let id = RecordId::from(Uuid::nil());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""00000000-0000-0000-0000-000000000000""#);
    }

    #[test]
    fn test_entity_kind_names_match_serde() {
        for kind in EntityKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }
}
