//! Configuration for ledger access and the reconciliation worker.
//!
//! [`LedgerSettings`] is an immutable snapshot of the `FABRIC_*` settings.
//! Every field is optional at this level: whether the ledger counts as
//! configured is decided by [`LedgerContext`](crate::LedgerContext), and
//! full validation happens in [`FabricTransport::new`](crate::FabricTransport::new).
//!
//! [`ReconcilerConfig`] sizes the worker.

use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// Default per-call timeout for submit and evaluate (30 seconds).
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default bound on concurrently running reconciliation tasks.
const DEFAULT_MAX_CONCURRENT_TASKS: usize = 16;

/// Default bound on one reconciliation attempt (2 minutes).
const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(120);

/// Environment variable names read by [`LedgerSettings::from_env`].
pub mod env {
    /// Channel name.
    pub const CHANNEL: &str = "FABRIC_CHANNEL";
    /// Chaincode name.
    pub const CHAINCODE: &str = "FABRIC_CHAINCODE";
    /// Peer gateway endpoint, `host:port` or a full URI.
    pub const PEER_ENDPOINT: &str = "FABRIC_PEER_ENDPOINT";
    /// MSP id of the client identity.
    pub const MSP_ID: &str = "FABRIC_MSP_ID";
    /// Label of the client identity.
    pub const IDENTITY: &str = "FABRIC_IDENTITY";
    /// Path of the trusted TLS root certificate.
    pub const TLS_CA_CERT: &str = "FABRIC_TLS_CA_CERT";
    /// Path of the client identity certificate.
    pub const IDENTITY_CERT: &str = "FABRIC_IDENTITY_CERT";
    /// Path of the client identity private key.
    pub const IDENTITY_KEY: &str = "FABRIC_IDENTITY_KEY";
    /// Optional TLS server name override.
    pub const TLS_SERVER_NAME: &str = "FABRIC_TLS_SERVER_NAME";
    /// Optional per-call timeout, humantime format (`30s`).
    pub const CALL_TIMEOUT: &str = "FABRIC_CALL_TIMEOUT";
    /// Optional connection timeout, humantime format (`10s`).
    pub const CONNECT_TIMEOUT: &str = "FABRIC_CONNECT_TIMEOUT";
}

/// Connection settings for the Fabric gateway peer.
///
/// # Example
///
/// ```
/// use agritrack_ledger_sync::LedgerSettings;
///
/// let settings = LedgerSettings::builder()
///     .channel("supplychain")
///     .chaincode("supplychain")
///     .peer_endpoint("peer0.org1.example.com:7051")
///     .build()?;
///
/// assert!(settings.is_configured());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawLedgerSettings")]
pub struct LedgerSettings {
    /// Channel name.
    pub(crate) channel: Option<String>,

    /// Chaincode name.
    pub(crate) chaincode: Option<String>,

    /// Peer gateway endpoint.
    pub(crate) peer_endpoint: Option<String>,

    /// MSP id of the client identity.
    pub(crate) msp_id: Option<String>,

    /// Label of the client identity.
    pub(crate) identity: Option<String>,

    /// Trusted TLS root certificate.
    pub(crate) tls_ca_cert: Option<PathBuf>,

    /// Client identity certificate.
    pub(crate) identity_cert: Option<PathBuf>,

    /// Client identity private key.
    pub(crate) identity_key: Option<PathBuf>,

    /// TLS server name override for peers addressed by IP or alias.
    pub(crate) tls_server_name: Option<String>,

    /// Bound on a single submit or evaluate call.
    #[serde(serialize_with = "humantime_serde::serialize")]
    pub(crate) call_timeout: Duration,

    /// Bound on establishing the gRPC channel.
    #[serde(serialize_with = "humantime_serde::serialize")]
    pub(crate) connect_timeout: Duration,
}

/// Wire form of [`LedgerSettings`]; validated through the builder.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLedgerSettings {
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    chaincode: Option<String>,
    #[serde(default)]
    peer_endpoint: Option<String>,
    #[serde(default)]
    msp_id: Option<String>,
    #[serde(default)]
    identity: Option<String>,
    #[serde(default)]
    tls_ca_cert: Option<PathBuf>,
    #[serde(default)]
    identity_cert: Option<PathBuf>,
    #[serde(default)]
    identity_key: Option<PathBuf>,
    #[serde(default)]
    tls_server_name: Option<String>,
    #[serde(with = "humantime_serde", default = "default_call_timeout")]
    call_timeout: Duration,
    #[serde(with = "humantime_serde", default = "default_connect_timeout")]
    connect_timeout: Duration,
}

impl TryFrom<RawLedgerSettings> for LedgerSettings {
    type Error = LedgerError;

    fn try_from(raw: RawLedgerSettings) -> Result<Self> {
        Self::builder()
            .maybe_channel(raw.channel)
            .maybe_chaincode(raw.chaincode)
            .maybe_peer_endpoint(raw.peer_endpoint)
            .maybe_msp_id(raw.msp_id)
            .maybe_identity(raw.identity)
            .maybe_tls_ca_cert(raw.tls_ca_cert)
            .maybe_identity_cert(raw.identity_cert)
            .maybe_identity_key(raw.identity_key)
            .maybe_tls_server_name(raw.tls_server_name)
            .call_timeout(raw.call_timeout)
            .connect_timeout(raw.connect_timeout)
            .build()
    }
}

fn default_call_timeout() -> Duration {
    DEFAULT_CALL_TIMEOUT
}

fn default_connect_timeout() -> Duration {
    DEFAULT_CONNECT_TIMEOUT
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            channel: None,
            chaincode: None,
            peer_endpoint: None,
            msp_id: None,
            identity: None,
            tls_ca_cert: None,
            identity_cert: None,
            identity_key: None,
            tls_server_name: None,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

#[bon::bon]
impl LedgerSettings {
    /// Creates a settings snapshot.
    ///
    /// All connection fields are optional here; see
    /// [`is_configured`](Self::is_configured).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Configuration`] if either timeout is zero.
    #[builder]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        #[builder(into)] channel: Option<String>,
        #[builder(into)] chaincode: Option<String>,
        #[builder(into)] peer_endpoint: Option<String>,
        #[builder(into)] msp_id: Option<String>,
        #[builder(into)] identity: Option<String>,
        #[builder(into)] tls_ca_cert: Option<PathBuf>,
        #[builder(into)] identity_cert: Option<PathBuf>,
        #[builder(into)] identity_key: Option<PathBuf>,
        #[builder(into)] tls_server_name: Option<String>,
        #[builder(default = DEFAULT_CALL_TIMEOUT)] call_timeout: Duration,
        #[builder(default = DEFAULT_CONNECT_TIMEOUT)] connect_timeout: Duration,
    ) -> Result<Self> {
        if call_timeout.is_zero() {
            return Err(LedgerError::configuration("call_timeout must be non-zero"));
        }

        if connect_timeout.is_zero() {
            return Err(LedgerError::configuration("connect_timeout must be non-zero"));
        }

        Ok(Self {
            channel: non_blank(channel),
            chaincode: non_blank(chaincode),
            peer_endpoint: non_blank(peer_endpoint),
            msp_id: non_blank(msp_id),
            identity: non_blank(identity),
            tls_ca_cert,
            identity_cert,
            identity_key,
            tls_server_name: non_blank(tls_server_name),
            call_timeout,
            connect_timeout,
        })
    }
}

impl LedgerSettings {
    /// Loads settings from the `FABRIC_*` environment variables.
    ///
    /// Unset and empty variables are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Configuration`] if a timeout variable is not a
    /// valid non-zero humantime duration.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let duration = |key: &str, default: Duration| -> Result<Duration> {
            match var(key) {
                Some(raw) => humantime_serde::re::humantime::parse_duration(raw.trim())
                    .map_err(|e| LedgerError::configuration(format!("{key}: {e}"))),
                None => Ok(default),
            }
        };

        Self::builder()
            .maybe_channel(var(env::CHANNEL))
            .maybe_chaincode(var(env::CHAINCODE))
            .maybe_peer_endpoint(var(env::PEER_ENDPOINT))
            .maybe_msp_id(var(env::MSP_ID))
            .maybe_identity(var(env::IDENTITY))
            .maybe_tls_ca_cert(var(env::TLS_CA_CERT))
            .maybe_identity_cert(var(env::IDENTITY_CERT))
            .maybe_identity_key(var(env::IDENTITY_KEY))
            .maybe_tls_server_name(var(env::TLS_SERVER_NAME))
            .call_timeout(duration(env::CALL_TIMEOUT, DEFAULT_CALL_TIMEOUT)?)
            .connect_timeout(duration(env::CONNECT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)?)
            .build()
    }

    /// Returns `true` when channel, chaincode and peer endpoint are all set.
    ///
    /// This is the only check made when choosing a transport; the remaining
    /// settings are validated by the live transport itself.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.channel.is_some() && self.chaincode.is_some() && self.peer_endpoint.is_some()
    }

    /// Returns the channel name.
    #[must_use]
    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    /// Returns the chaincode name.
    #[must_use]
    pub fn chaincode(&self) -> Option<&str> {
        self.chaincode.as_deref()
    }

    /// Returns the peer endpoint.
    #[must_use]
    pub fn peer_endpoint(&self) -> Option<&str> {
        self.peer_endpoint.as_deref()
    }

    /// Returns the per-call timeout.
    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Returns the connection timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

/// Sizing of the reconciliation worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawReconcilerConfig")]
pub struct ReconcilerConfig {
    /// Maximum number of attempts running at the same time.
    pub(crate) max_concurrent_tasks: usize,

    /// Bound on the ledger call of one attempt.
    #[serde(serialize_with = "humantime_serde::serialize")]
    pub(crate) attempt_timeout: Duration,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawReconcilerConfig {
    #[serde(default = "default_max_concurrent_tasks")]
    max_concurrent_tasks: usize,
    #[serde(with = "humantime_serde", default = "default_attempt_timeout")]
    attempt_timeout: Duration,
}

impl TryFrom<RawReconcilerConfig> for ReconcilerConfig {
    type Error = LedgerError;

    fn try_from(raw: RawReconcilerConfig) -> Result<Self> {
        Self::builder()
            .max_concurrent_tasks(raw.max_concurrent_tasks)
            .attempt_timeout(raw.attempt_timeout)
            .build()
    }
}

fn default_max_concurrent_tasks() -> usize {
    DEFAULT_MAX_CONCURRENT_TASKS
}

fn default_attempt_timeout() -> Duration {
    DEFAULT_ATTEMPT_TIMEOUT
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: DEFAULT_MAX_CONCURRENT_TASKS,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

#[bon::bon]
impl ReconcilerConfig {
    /// Creates a worker configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Configuration`] if `max_concurrent_tasks` or
    /// `attempt_timeout` is zero.
    #[builder]
    pub fn new(
        #[builder(default = DEFAULT_MAX_CONCURRENT_TASKS)] max_concurrent_tasks: usize,
        #[builder(default = DEFAULT_ATTEMPT_TIMEOUT)] attempt_timeout: Duration,
    ) -> Result<Self> {
        if max_concurrent_tasks == 0 {
            return Err(LedgerError::configuration("max_concurrent_tasks must be at least 1"));
        }

        if attempt_timeout.is_zero() {
            return Err(LedgerError::configuration("attempt_timeout must be non-zero"));
        }

        Ok(Self { max_concurrent_tasks, attempt_timeout })
    }

    /// Returns the concurrency bound.
    #[must_use]
    pub fn max_concurrent_tasks(&self) -> usize {
        self.max_concurrent_tasks
    }

    /// Returns the per-attempt timeout.
    #[must_use]
    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }
}
