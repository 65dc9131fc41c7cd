//! Store error types and result alias.
//!
//! All [`DomainStore`](crate::DomainStore) implementations map their internal
//! failures onto [`StoreError`].
//!
//! # Error Types
//!
//! - [`StoreError::NotFound`] - The record does not exist in the local store
//! - [`StoreError::AlreadyExists`] - A record with the same id was already inserted
//! - [`StoreError::Connection`] - The store could not be reached
//! - [`StoreError::Internal`] - Backend-specific internal errors
//!
//! # Example
//!
//! ```
//! use agritrack_sync_store::{EntityKind, RecordId, StoreError, StoreResult};
//!
//! fn lookup(id: RecordId) -> StoreResult<()> {
//!     Err(StoreError::not_found(EntityKind::Batch, id))
//! }
//! ```

use std::sync::Arc;

use thiserror::Error;

use crate::types::{EntityKind, RecordId};

/// A boxed error type for source chain tracking.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync>;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while reading or writing local records.
///
/// # Non-exhaustive
///
/// New variants may be added without a semver-breaking change. Downstream
/// match expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The referenced record does not exist locally.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Kind of the missing record.
        kind: EntityKind,
        /// Identifier of the missing record.
        id: RecordId,
    },

    /// A record with the same kind and id already exists.
    #[error("{kind} {id} already exists")]
    AlreadyExists {
        /// Kind of the duplicate record.
        kind: EntityKind,
        /// Identifier of the duplicate record.
        id: RecordId,
    },

    /// The store could not be reached.
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
        /// The underlying error that caused this connection failure.
        #[source]
        source: Option<BoxError>,
    },

    /// Catch-all for backend-specific failures.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
        /// The underlying error that caused this internal failure.
        #[source]
        source: Option<BoxError>,
    },
}

impl StoreError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(kind: EntityKind, id: RecordId) -> Self {
        Self::NotFound { kind, id }
    }

    /// Creates a new `AlreadyExists` error.
    #[must_use]
    pub fn already_exists(kind: EntityKind, id: RecordId) -> Self {
        Self::AlreadyExists { kind, id }
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

    /// Creates a new `Internal` error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    /// Creates a new `Internal` error with a message and source error.
    #[must_use]
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Internal { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Returns `true` if this is a `NotFound` error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_not_found_display_names_kind_and_id() {
        let id = RecordId::new();
        let err = StoreError::not_found(EntityKind::LifecycleEvent, id);

        assert_eq!(err.to_string(), format!("lifecycle_event {id} not found"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_already_exists_is_not_not_found() {
        let err = StoreError::already_exists(EntityKind::Batch, RecordId::new());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_source_chain_preserved() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = StoreError::connection_with_source("database unreachable", io);

        assert_eq!(err.to_string(), "Connection error: database unreachable");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_internal_without_source() {
        let err = StoreError::internal("lock poisoned");
        assert_eq!(err.to_string(), "Internal error: lock poisoned");
        assert!(err.source().is_none());
    }
}
