//! Error types for ledger access and reconciliation.
//!
//! [`LedgerError`] is what every [`LedgerTransport`](crate::LedgerTransport)
//! returns. It never crosses the reconciliation boundary: the worker turns it
//! into a persisted `Failed` status. [`ReconcileError`] is reserved for the
//! local failures an awaited [`Reconciler::reconcile`](crate::Reconciler::reconcile)
//! call cannot paper over.
//!
//! # Classification
//!
//! Gateway failures are classified from the structured gRPC status code
//! first. Only when the code carries no meaning of its own is the message
//! inspected (see [`classify_message`]).

use std::{fmt, sync::Arc, time::Duration};

use agritrack_sync_store::StoreError;
use thiserror::Error;
use tonic::Code;

/// A boxed error type for source chain tracking.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync>;

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Category of a failed chaincode invocation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TransactionErrorKind {
    /// The chaincode does not define the requested function.
    FunctionNotFound,
    /// The caller's identity is not allowed to invoke the function.
    PermissionDenied,
    /// The asset the function operates on does not exist.
    ResourceMissing,
    /// The chaincode or endorsers rejected the invocation.
    Rejected,
    /// The transaction was ordered but failed validation.
    CommitFailed,
}

impl fmt::Display for TransactionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FunctionNotFound => "function not found",
            Self::PermissionDenied => "permission denied",
            Self::ResourceMissing => "resource missing",
            Self::Rejected => "rejected",
            Self::CommitFailed => "commit failed",
        })
    }
}

/// Errors raised by ledger transports.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LedgerError {
    /// Required settings are missing or malformed.
    ///
    /// Only raised while constructing a live transport.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The peer could not be reached, credentials could not be loaded, the
    /// call timed out or another task is already connecting.
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
        /// The underlying error that caused this connection failure.
        #[source]
        source: Option<BoxError>,
    },

    /// The ledger refused the invocation.
    #[error("Transaction '{function}' failed ({kind}): {message}")]
    Transaction {
        /// Failure category.
        kind: TransactionErrorKind,
        /// Chaincode function that was invoked.
        function: String,
        /// Original ledger message.
        message: String,
    },
}

impl LedgerError {
    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates a new `Connection` error with the given message.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection { message: message.into(), source: None }
    }

    /// Creates a new `Connection` error with a message and source error.
    #[must_use]
    pub fn connection_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Creates a `Connection` error for a call that exceeded its deadline.
    #[must_use]
    pub fn timeout(function: &str, after: Duration) -> Self {
        Self::connection(format!(
            "ledger call '{function}' timed out after {}",
            humantime_serde::re::humantime::format_duration(after)
        ))
    }

    /// Creates a new `Transaction` error.
    #[must_use]
    pub fn transaction(
        kind: TransactionErrorKind,
        function: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Transaction { kind, function: function.into(), message: message.into() }
    }

    /// Returns `true` for connection-level failures.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// Returns the transaction failure category, if any.
    #[must_use]
    pub fn transaction_kind(&self) -> Option<TransactionErrorKind> {
        match self {
            Self::Transaction { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Classifies a failed gateway call from its gRPC status.
///
/// Codes that identify the failure on their own win; every other code falls
/// through to [`classify_message`].
#[must_use]
pub fn classify_status(function: &str, code: Code, message: String) -> LedgerError {
    match code {
        Code::Unavailable | Code::DeadlineExceeded | Code::Cancelled => {
            LedgerError::connection(format!("ledger call '{function}' failed ({code:?}): {message}"))
        },
        Code::PermissionDenied | Code::Unauthenticated => {
            LedgerError::transaction(TransactionErrorKind::PermissionDenied, function, message)
        },
        Code::NotFound => {
            LedgerError::transaction(TransactionErrorKind::FunctionNotFound, function, message)
        },
        _ => classify_message(function, message),
    }
}

/// Classifies a chaincode failure from its message alone.
///
/// Matching is case-insensitive. The result only labels the failure; the
/// original message is always carried through unchanged.
#[must_use]
pub fn classify_message(function: &str, message: String) -> LedgerError {
    let lowered = message.to_lowercase();
    let kind = if lowered.contains("not found") {
        TransactionErrorKind::FunctionNotFound
    } else if lowered.contains("authorization") || lowered.contains("msp") {
        TransactionErrorKind::PermissionDenied
    } else if lowered.contains("does not exist") {
        TransactionErrorKind::ResourceMissing
    } else {
        TransactionErrorKind::Rejected
    };
    LedgerError::transaction(kind, function, message)
}

/// Errors surfaced by an awaited reconciliation attempt.
///
/// Ledger failures are not in here: they are persisted as `Failed` and the
/// attempt still counts as completed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReconcileError {
    /// The local store failed, or the record does not exist.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The reconciler no longer accepts work.
    #[error("reconciler is shut down")]
    ShutDown,

    /// The task driving the attempt ended without a result, for example
    /// because the runtime is shutting down.
    #[error("reconciliation task aborted: {0}")]
    Aborted(String),
}

impl ReconcileError {
    /// Returns `true` if the record to reconcile does not exist locally.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_not_found())
    }
}
