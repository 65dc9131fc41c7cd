//! Transport selection and the shared ledger context.
//!
//! [`LedgerContext`] is built once at startup and handed to whatever needs
//! the ledger. It picks the live [`FabricTransport`] when the ledger is
//! configured and falls back to [`NoOpTransport`] otherwise, so the rest of
//! the service never has to ask which one it got.

use std::sync::Arc;

use agritrack_sync_store::DomainStore;

use crate::{
    config::{LedgerSettings, ReconcilerConfig},
    fabric::FabricTransport,
    gateway::ContractGateway,
    transport::{LedgerTransport, NoOpTransport},
    worker::Reconciler,
};

/// Cloneable handle to the selected ledger transport.
///
/// # Example
///
/// ```
/// use agritrack_ledger_sync::{LedgerContext, LedgerSettings};
///
/// let context = LedgerContext::from_config(&LedgerSettings::default());
/// assert!(!context.is_live());
/// assert_eq!(context.transport().name(), "noop");
/// ```
#[derive(Clone)]
pub struct LedgerContext {
    transport: Arc<dyn LedgerTransport>,
    live: bool,
}

impl std::fmt::Debug for LedgerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerContext")
            .field("transport", &self.transport.name())
            .field("live", &self.live)
            .finish()
    }
}

impl LedgerContext {
    /// Selects a transport for `settings`.
    ///
    /// Never fails and never reads credential files: an unusable live
    /// configuration is logged and replaced by the no-op transport.
    #[must_use]
    pub fn from_config(settings: &LedgerSettings) -> Self {
        if !settings.is_configured() {
            tracing::info!("Fabric not configured, ledger writes are disabled");
            return Self::with_transport(Arc::new(NoOpTransport::new()));
        }

        match FabricTransport::new(settings) {
            Ok(transport) => {
                tracing::info!(
                    channel = settings.channel().unwrap_or_default(),
                    chaincode = settings.chaincode().unwrap_or_default(),
                    peer = settings.peer_endpoint().unwrap_or_default(),
                    "using Fabric gateway transport"
                );
                Self { transport: Arc::new(transport), live: true }
            },
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "Fabric configuration unusable, falling back to no-op transport"
                );
                Self::with_transport(Arc::new(NoOpTransport::new()))
            },
        }
    }

    /// Wraps an existing transport. Useful for tests and custom transports.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn LedgerTransport>) -> Self {
        Self { transport, live: false }
    }

    /// Returns `true` if the live Fabric transport was selected.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Returns the selected transport.
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn LedgerTransport> {
        &self.transport
    }

    /// Returns a contract gateway over the selected transport.
    #[must_use]
    pub fn gateway(&self) -> ContractGateway {
        ContractGateway::new(Arc::clone(&self.transport))
    }

    /// Builds a reconciler writing sync state to `store`.
    #[must_use]
    pub fn reconciler(&self, store: Arc<dyn DomainStore>, config: ReconcilerConfig) -> Reconciler {
        Reconciler::new(store, self.gateway(), config)
    }

    /// Closes the transport. Later calls reconnect lazily.
    pub async fn close(&self) {
        self.transport.close().await;
    }
}
