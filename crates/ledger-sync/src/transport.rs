//! The ledger transport capability.
//!
//! A [`LedgerTransport`] invokes chaincode functions by name with an ordered
//! list of string arguments. Two implementations exist:
//!
//! - [`FabricTransport`](crate::FabricTransport) talks to a Fabric gateway
//!   peer over mutual TLS.
//! - [`NoOpTransport`] answers every call with a fixed placeholder and never
//!   touches the network. It is selected when the ledger is not configured.

use async_trait::async_trait;

use crate::error::Result;

/// Placeholder returned by [`NoOpTransport`] for every call.
///
/// It names no transaction: a record reconciled against the no-op transport
/// is not on any ledger and must stay eligible for a later submit.
pub const NOOP_RESPONSE: &str = r#"{"status":"noop","message":"blockchain not configured"}"#;

/// Invokes chaincode functions on the ledger.
///
/// Implementations must be safe to share between reconciliation tasks.
#[async_trait]
pub trait LedgerTransport: Send + Sync {
    /// Submits a state-changing transaction and waits until the ledger
    /// reports it committed.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Connection`](crate::LedgerError::Connection) if the
    ///   peer cannot be reached or the call times out
    /// - [`LedgerError::Transaction`](crate::LedgerError::Transaction) if the
    ///   ledger refuses or fails to commit the transaction
    async fn submit(&self, function: &str, args: &[String]) -> Result<String>;

    /// Evaluates a read-only query. Nothing is committed.
    ///
    /// # Errors
    ///
    /// Same as [`submit`](Self::submit), minus commit failures.
    async fn evaluate(&self, function: &str, args: &[String]) -> Result<String>;

    /// Drops any established connection. The next call reconnects.
    async fn close(&self);

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Transport used when the ledger is not configured.
///
/// Never fails and performs no I/O.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpTransport;

impl NoOpTransport {
    /// Creates a new no-op transport.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LedgerTransport for NoOpTransport {
    async fn submit(&self, function: &str, args: &[String]) -> Result<String> {
        tracing::debug!(function, args = args.len(), "no-op submit");
        Ok(NOOP_RESPONSE.to_owned())
    }

    async fn evaluate(&self, function: &str, args: &[String]) -> Result<String> {
        tracing::debug!(function, args = args.len(), "no-op evaluate");
        Ok(NOOP_RESPONSE.to_owned())
    }

    async fn close(&self) {}

    fn name(&self) -> &'static str {
        "noop"
    }
}
