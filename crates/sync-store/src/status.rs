//! Ledger sync status carried by every syncable record.
//!
//! # Lifecycle
//!
//! ```text
//! ┌─────────┐  attempt succeeds  ┌───────────┐
//! │ Pending │ ─────────────────► │ Confirmed │
//! └────┬────┘                    └───────────┘
//!      │ attempt fails                 ▲
//!      ▼                               │ re-attempt succeeds
//! ┌─────────┐ ─────────────────────────┘
//! │ Failed  │ ◄──┐
//! └─────────┘ ───┘ re-attempt fails
//! ```
//!
//! Each attempt resolves to exactly one [`SyncOutcome`]. `ledger_tx_id` is
//! only ever written by a confirmation, and a failure never touches it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sync state of a single record.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    /// Committed locally, not yet confirmed on the ledger.
    #[default]
    Pending,
    /// Committed on the ledger.
    Confirmed,
    /// The last attempt failed; a new attempt may be scheduled.
    Failed,
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// The `{status, tx_id, error, synced_at}` projection of a record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    /// Current sync state.
    pub state: SyncState,
    /// Ledger transaction id, set on confirmation.
    pub ledger_tx_id: Option<String>,
    /// Failure detail, set on failure and cleared on confirmation.
    pub ledger_error: Option<String>,
    /// When the ledger confirmed the record.
    pub synced_at: Option<DateTime<Utc>>,
}

impl SyncStatus {
    /// Status of a freshly created record.
    #[must_use]
    pub fn pending() -> Self {
        Self::default()
    }

    /// Applies the outcome of one reconciliation attempt.
    pub fn apply(&mut self, outcome: &SyncOutcome) {
        match outcome {
            SyncOutcome::Confirmed { tx_id, synced_at } => {
                self.state = SyncState::Confirmed;
                self.ledger_tx_id = Some(tx_id.clone());
                self.ledger_error = None;
                self.synced_at = Some(*synced_at);
            },
            SyncOutcome::Failed { error } => {
                self.state = SyncState::Failed;
                self.ledger_error = Some(error.clone());
            },
        }
    }

    /// Returns `true` once the ledger has confirmed the record.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.state == SyncState::Confirmed
    }
}

/// Terminal result of a single reconciliation attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The ledger committed the record.
    Confirmed {
        /// Transaction id reported by the ledger.
        tx_id: String,
        /// Confirmation time.
        synced_at: DateTime<Utc>,
    },
    /// The attempt failed.
    Failed {
        /// Human-readable failure detail.
        error: String,
    },
}

impl SyncOutcome {
    /// Confirmation stamped with the current time.
    #[must_use]
    pub fn confirmed_now(tx_id: impl Into<String>) -> Self {
        Self::Confirmed { tx_id: tx_id.into(), synced_at: Utc::now() }
    }

    /// Failure with the given detail.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed { error: error.into() }
    }

    /// The state this outcome resolves a record to.
    #[must_use]
    pub fn state(&self) -> SyncState {
        match self {
            Self::Confirmed { .. } => SyncState::Confirmed,
            Self::Failed { .. } => SyncState::Failed,
        }
    }
}

/// Field delta written back to a record after an attempt.
///
/// Besides the sync outcome, the ledger may hand back a verdict the local
/// record mirrors (currently the temperature violation flag).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordDelta {
    /// Outcome of the attempt.
    pub outcome: SyncOutcome,
    /// Ledger-detected temperature violation, for temperature logs.
    pub is_violation: Option<bool>,
}

impl RecordDelta {
    /// Delta carrying only a sync outcome.
    #[must_use]
    pub fn new(outcome: SyncOutcome) -> Self {
        Self { outcome, is_violation: None }
    }

    /// Attaches the ledger's temperature violation verdict.
    #[must_use]
    pub fn with_violation(mut self, is_violation: bool) -> Self {
        self.is_violation = Some(is_violation);
        self
    }
}

impl From<SyncOutcome> for RecordDelta {
    fn from(outcome: SyncOutcome) -> Self {
        Self::new(outcome)
    }
}
