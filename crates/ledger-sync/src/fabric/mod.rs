//! Live ledger transport over the Hyperledger Fabric Gateway gRPC service.
//!
//! [`FabricTransport`] validates its settings up front and connects lazily on
//! the first call. The connection (a mutually authenticated TLS channel plus
//! the signing identity) is shared by every call until [`close`] drops it.
//!
//! A submit runs the full gateway flow:
//!
//! ```text
//!  signed proposal ──► Endorse ──► sign envelope ──► Submit ──► CommitStatus
//! ```
//!
//! and only returns once the peer reports the transaction as committed.
//!
//! [`close`]: LedgerTransport::close

mod identity;
mod proto;

use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::RwLock;
use prost::Message;
use serde_json::Value;
use tonic::{
    Status,
    codegen::http::uri::PathAndQuery,
    transport::{Certificate, Channel, ClientTlsConfig, Endpoint, Identity},
};
use tracing::{debug, info};
use zeroize::Zeroizing;

use self::{
    identity::{SigningIdentity, TransactionContext},
    proto::{
        ChaincodeAction, ChaincodeActionPayload, ChaincodeHeaderExtension, ChaincodeId,
        ChaincodeInput, ChaincodeInvocationSpec, ChaincodeProposalPayload, ChaincodeSpec,
        ChannelHeader, CommitStatusRequest, CommitStatusResponse, EndorseRequest,
        EndorseResponse, ErrorDetail, EvaluateRequest, EvaluateResponse, Header, Payload,
        Proposal, ProposalResponsePayload, RpcStatus, SignedCommitStatusRequest, SignedProposal,
        SubmitRequest, SubmitResponse, Timestamp, Transaction,
    },
};
use crate::{
    config::{LedgerSettings, env},
    error::{LedgerError, Result, TransactionErrorKind, classify_message, classify_status},
    transport::LedgerTransport,
};

/// Chaincode responses at or above this status are errors.
const ERROR_STATUS_THRESHOLD: i32 = 400;

/// Settings resolved and validated at construction.
#[derive(Debug)]
struct Resolved {
    channel: String,
    chaincode: String,
    peer_endpoint: String,
    endpoint: Endpoint,
    msp_id: String,
    identity: String,
    tls_ca_cert: PathBuf,
    identity_cert: PathBuf,
    identity_key: PathBuf,
    tls_server_name: Option<String>,
    call_timeout: Duration,
    connect_timeout: Duration,
}

/// An established gateway connection.
#[derive(Debug)]
struct Connection {
    channel: Channel,
    signer: SigningIdentity,
}

/// Resets the initialization flag when connection setup ends, however it ends.
struct InitializingGuard<'a>(&'a AtomicBool);

impl Drop for InitializingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// [`LedgerTransport`] backed by a Fabric Gateway peer.
///
/// # Example
///
/// ```no_run
/// use agritrack_ledger_sync::{FabricTransport, LedgerSettings, LedgerTransport};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = LedgerSettings::from_env()?;
/// let transport = FabricTransport::new(&settings)?;
///
/// let batch = transport.evaluate("GetBatch", &["0c6f...".to_owned()]).await?;
/// println!("{batch}");
/// # Ok(())
/// # }
/// ```
pub struct FabricTransport {
    settings: Resolved,
    connection: RwLock<Option<Arc<Connection>>>,
    initializing: AtomicBool,
}

impl std::fmt::Debug for FabricTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FabricTransport")
            .field("channel", &self.settings.channel)
            .field("chaincode", &self.settings.chaincode)
            .field("peer_endpoint", &self.settings.peer_endpoint)
            .field("msp_id", &self.settings.msp_id)
            .field("connected", &self.connection.read().is_some())
            .finish_non_exhaustive()
    }
}

impl FabricTransport {
    /// Validates `settings` without touching the network or the filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Configuration`] if any of the channel,
    /// chaincode, peer endpoint, MSP id, identity label or the three
    /// credential paths is missing, or if the peer endpoint is not a URI.
    pub fn new(settings: &LedgerSettings) -> Result<Self> {
        let channel = required(settings.channel.as_ref(), env::CHANNEL)?;
        let chaincode = required(settings.chaincode.as_ref(), env::CHAINCODE)?;
        let peer_endpoint = required(settings.peer_endpoint.as_ref(), env::PEER_ENDPOINT)?;
        let msp_id = required(settings.msp_id.as_ref(), env::MSP_ID)?;
        let identity = required(settings.identity.as_ref(), env::IDENTITY)?;
        let tls_ca_cert = required(settings.tls_ca_cert.as_ref(), env::TLS_CA_CERT)?;
        let identity_cert = required(settings.identity_cert.as_ref(), env::IDENTITY_CERT)?;
        let identity_key = required(settings.identity_key.as_ref(), env::IDENTITY_KEY)?;

        let uri = peer_uri(&peer_endpoint);
        let endpoint = Endpoint::from_shared(uri).map_err(|err| {
            LedgerError::configuration(format!(
                "{} '{peer_endpoint}' is not a valid URI: {err}",
                env::PEER_ENDPOINT
            ))
        })?;

        Ok(Self {
            settings: Resolved {
                channel,
                chaincode,
                peer_endpoint,
                endpoint,
                msp_id,
                identity,
                tls_ca_cert,
                identity_cert,
                identity_key,
                tls_server_name: settings.tls_server_name.clone(),
                call_timeout: settings.call_timeout,
                connect_timeout: settings.connect_timeout,
            },
            connection: RwLock::new(None),
            initializing: AtomicBool::new(false),
        })
    }

    /// Returns `true` once a connection has been established.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.read().is_some()
    }

    /// Returns the shared connection, establishing it on first use.
    async fn connection(&self) -> Result<Arc<Connection>> {
        let existing = self.connection.read().clone();
        if let Some(connection) = existing {
            return Ok(connection);
        }

        if self
            .initializing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(LedgerError::connection(
                "ledger connection initialization already in progress",
            ));
        }
        let _initializing = InitializingGuard(&self.initializing);

        // Another caller may have finished between the read and the swap
        let existing = self.connection.read().clone();
        if let Some(connection) = existing {
            return Ok(connection);
        }

        let connection = Arc::new(self.connect().await?);
        *self.connection.write() = Some(Arc::clone(&connection));
        info!(
            peer = %self.settings.peer_endpoint,
            channel = %self.settings.channel,
            msp_id = %self.settings.msp_id,
            identity = %self.settings.identity,
            "connected to Fabric gateway"
        );
        Ok(connection)
    }

    async fn connect(&self) -> Result<Connection> {
        let settings = &self.settings;

        let ca_pem = read_credential(&settings.tls_ca_cert, env::TLS_CA_CERT).await?;
        let cert_pem = read_credential(&settings.identity_cert, env::IDENTITY_CERT).await?;
        let key_pem =
            Zeroizing::new(read_credential(&settings.identity_key, env::IDENTITY_KEY).await?);

        let signer = SigningIdentity::from_pem(&settings.msp_id, &cert_pem, &key_pem).map_err(
            |err| {
                LedgerError::connection_with_source(
                    format!(
                        "failed to load identity '{}' from {} ({}) and {} ({})",
                        settings.identity,
                        settings.identity_cert.display(),
                        env::IDENTITY_CERT,
                        settings.identity_key.display(),
                        env::IDENTITY_KEY,
                    ),
                    err,
                )
            },
        )?;

        let mut tls = ClientTlsConfig::new()
            .ca_certificate(Certificate::from_pem(&ca_pem))
            .identity(Identity::from_pem(&cert_pem, key_pem.as_bytes()));
        if let Some(server_name) = &settings.tls_server_name {
            tls = tls.domain_name(server_name.clone());
        }

        let endpoint = settings
            .endpoint
            .clone()
            .tls_config(tls)
            .map_err(|err| LedgerError::connection_with_source("invalid TLS configuration", err))?
            .connect_timeout(settings.connect_timeout);

        let channel = endpoint.connect().await.map_err(|err| {
            LedgerError::connection_with_source(
                format!("failed to connect to peer {}", settings.peer_endpoint),
                err,
            )
        })?;

        Ok(Connection { channel, signer })
    }

    /// Bounds `call` by the per-call timeout.
    async fn bounded<F>(&self, function: &str, call: F) -> Result<String>
    where
        F: Future<Output = Result<String>>,
    {
        let timeout = self.settings.call_timeout;
        tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| LedgerError::timeout(function, timeout))?
    }

    fn signed_proposal(
        &self,
        signer: &SigningIdentity,
        context: &TransactionContext,
        function: &str,
        args: &[String],
    ) -> SignedProposal {
        let proposal_bytes = self.proposal(context, function, args).encode_to_vec();
        SignedProposal { signature: signer.sign(&proposal_bytes), proposal_bytes }
    }

    fn proposal(&self, context: &TransactionContext, function: &str, args: &[String]) -> Proposal {
        let chaincode_id =
            ChaincodeId { name: self.settings.chaincode.clone(), ..Default::default() };

        let channel_header = ChannelHeader {
            r#type: proto::HEADER_TYPE_ENDORSER_TRANSACTION,
            timestamp: Some(now()),
            channel_id: self.settings.channel.clone(),
            tx_id: context.tx_id.clone(),
            extension: ChaincodeHeaderExtension { chaincode_id: Some(chaincode_id.clone()) }
                .encode_to_vec(),
            ..Default::default()
        };
        let header = Header {
            channel_header: channel_header.encode_to_vec(),
            signature_header: context.signature_header(),
        };

        let mut input = Vec::with_capacity(args.len() + 1);
        input.push(function.as_bytes().to_vec());
        input.extend(args.iter().map(|arg| arg.as_bytes().to_vec()));

        let invocation = ChaincodeInvocationSpec {
            chaincode_spec: Some(ChaincodeSpec {
                chaincode_id: Some(chaincode_id),
                input: Some(ChaincodeInput { args: input, is_init: false }),
                ..Default::default()
            }),
        };

        Proposal {
            header: header.encode_to_vec(),
            payload: ChaincodeProposalPayload { input: invocation.encode_to_vec() }.encode_to_vec(),
            extension: Vec::new(),
        }
    }

    async fn submit_transaction(&self, function: &str, args: &[String]) -> Result<String> {
        let connection = self.connection().await?;
        let signer = &connection.signer;
        let context = TransactionContext::new(signer);
        let channel_id = self.settings.channel.clone();

        let endorsed: EndorseResponse = unary(
            connection.channel.clone(),
            proto::path::ENDORSE,
            EndorseRequest {
                transaction_id: context.tx_id.clone(),
                channel_id: channel_id.clone(),
                proposed_transaction: Some(self.signed_proposal(signer, &context, function, args)),
                endorsing_organizations: Vec::new(),
            },
        )
        .await
        .map_err(|status| status_error(function, &status))?;

        let mut envelope = endorsed.prepared_transaction.ok_or_else(|| {
            LedgerError::transaction(
                TransactionErrorKind::Rejected,
                function,
                "gateway returned no prepared transaction",
            )
        })?;
        let payload = transaction_result(&envelope.payload)
            .map_err(|err| malformed_response(function, &err))?;
        envelope.signature = signer.sign(&envelope.payload);
        debug!(function, tx_id = %context.tx_id, "transaction endorsed");

        let _: SubmitResponse = unary(
            connection.channel.clone(),
            proto::path::SUBMIT,
            SubmitRequest {
                transaction_id: context.tx_id.clone(),
                channel_id: channel_id.clone(),
                prepared_transaction: Some(envelope),
            },
        )
        .await
        .map_err(|status| status_error(function, &status))?;

        let request = CommitStatusRequest {
            transaction_id: context.tx_id.clone(),
            channel_id,
            identity: context.creator().to_vec(),
        }
        .encode_to_vec();
        let status: CommitStatusResponse = unary(
            connection.channel.clone(),
            proto::path::COMMIT_STATUS,
            SignedCommitStatusRequest { signature: signer.sign(&request), request },
        )
        .await
        .map_err(|status| status_error(function, &status))?;

        if status.result != proto::TX_VALIDATION_VALID {
            return Err(LedgerError::transaction(
                TransactionErrorKind::CommitFailed,
                function,
                format!(
                    "transaction {} failed to commit with validation code {}",
                    context.tx_id, status.result
                ),
            ));
        }

        info!(
            function,
            tx_id = %context.tx_id,
            block_number = status.block_number,
            "transaction committed"
        );
        Ok(serde_json::json!({
            "transaction_id": context.tx_id,
            "block_number": status.block_number,
            "result": result_value(&payload),
        })
        .to_string())
    }

    async fn evaluate_transaction(&self, function: &str, args: &[String]) -> Result<String> {
        let connection = self.connection().await?;
        let context = TransactionContext::new(&connection.signer);

        let evaluated: EvaluateResponse = unary(
            connection.channel.clone(),
            proto::path::EVALUATE,
            EvaluateRequest {
                transaction_id: context.tx_id.clone(),
                channel_id: self.settings.channel.clone(),
                proposed_transaction: Some(self.signed_proposal(
                    &connection.signer,
                    &context,
                    function,
                    args,
                )),
                target_organizations: Vec::new(),
            },
        )
        .await
        .map_err(|status| status_error(function, &status))?;

        let response = evaluated.result.unwrap_or_default();
        if response.status >= ERROR_STATUS_THRESHOLD {
            return Err(classify_message(function, response.message));
        }

        debug!(function, bytes = response.payload.len(), "transaction evaluated");
        Ok(String::from_utf8_lossy(&response.payload).into_owned())
    }
}

#[async_trait]
impl LedgerTransport for FabricTransport {
    #[tracing::instrument(skip(self, args), fields(args = args.len()))]
    async fn submit(&self, function: &str, args: &[String]) -> Result<String> {
        self.bounded(function, self.submit_transaction(function, args)).await
    }

    #[tracing::instrument(skip(self, args), fields(args = args.len()))]
    async fn evaluate(&self, function: &str, args: &[String]) -> Result<String> {
        self.bounded(function, self.evaluate_transaction(function, args)).await
    }

    async fn close(&self) {
        if self.connection.write().take().is_some() {
            info!(peer = %self.settings.peer_endpoint, "closed Fabric gateway connection");
        }
    }

    fn name(&self) -> &'static str {
        "fabric"
    }
}

fn required<T: Clone>(value: Option<&T>, setting: &str) -> Result<T> {
    value.cloned().ok_or_else(|| LedgerError::configuration(format!("{setting} is required")))
}

/// Peers are usually configured as bare `host:port`.
fn peer_uri(endpoint: &str) -> String {
    if endpoint.contains("://") { endpoint.to_owned() } else { format!("https://{endpoint}") }
}

fn now() -> Timestamp {
    let now = chrono::Utc::now();
    Timestamp {
        seconds: now.timestamp(),
        nanos: i32::try_from(now.timestamp_subsec_nanos()).unwrap_or_default(),
    }
}

async fn read_credential(path: &Path, setting: &str) -> Result<String> {
    tokio::fs::read_to_string(path).await.map_err(|err| {
        LedgerError::connection_with_source(
            format!("failed to read {setting} file {}", path.display()),
            err,
        )
    })
}

async fn unary<Req, Resp>(
    channel: Channel,
    path: &'static str,
    request: Req,
) -> std::result::Result<Resp, Status>
where
    Req: Message + Send + Sync + 'static,
    Resp: Message + Default + Send + Sync + 'static,
{
    let mut grpc = tonic::client::Grpc::new(channel);
    grpc.ready().await.map_err(|err| Status::unavailable(format!("peer not ready: {err}")))?;

    let codec = tonic::codec::ProstCodec::<Req, Resp>::default();
    grpc.unary(tonic::Request::new(request), PathAndQuery::from_static(path), codec)
        .await
        .map(tonic::Response::into_inner)
}

/// Classifies a failed call, appending any per-peer gateway error details.
fn status_error(function: &str, status: &Status) -> LedgerError {
    let mut message = status.message().to_owned();
    for detail in error_details(status.details()) {
        let _ = write!(message, "; {} ({}): {}", detail.address, detail.msp_id, detail.message);
    }
    classify_status(function, status.code(), message)
}

fn error_details(details: &[u8]) -> Vec<ErrorDetail> {
    let Ok(status) = RpcStatus::decode(details) else {
        return Vec::new();
    };
    status
        .details
        .into_iter()
        .filter(|any| any.type_url == proto::ERROR_DETAIL_TYPE_URL)
        .filter_map(|any| ErrorDetail::decode(any.value.as_slice()).ok())
        .collect()
}

/// Chaincode response payload carried inside a prepared envelope.
fn transaction_result(envelope_payload: &[u8]) -> std::result::Result<Vec<u8>, prost::DecodeError> {
    let payload = Payload::decode(envelope_payload)?;
    let transaction = Transaction::decode(payload.data.as_slice())?;
    let Some(action) = transaction.actions.first() else {
        return Ok(Vec::new());
    };

    let action_payload = ChaincodeActionPayload::decode(action.payload.as_slice())?;
    let Some(endorsed) = action_payload.action else {
        return Ok(Vec::new());
    };

    let response_payload =
        ProposalResponsePayload::decode(endorsed.proposal_response_payload.as_slice())?;
    let chaincode_action = ChaincodeAction::decode(response_payload.extension.as_slice())?;
    Ok(chaincode_action.response.map(|response| response.payload).unwrap_or_default())
}

fn result_value(payload: &[u8]) -> Value {
    serde_json::from_slice(payload)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(payload).into_owned()))
}

fn malformed_response(function: &str, err: &prost::DecodeError) -> LedgerError {
    LedgerError::transaction(
        TransactionErrorKind::Rejected,
        function,
        format!("malformed gateway response: {err}"),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::path::Path;

    use tempfile::TempDir;

    use super::{proto::*, *};
    use crate::testutil::{TEST_IDENTITY_CERT, TEST_IDENTITY_KEY};

    fn settings_in(dir: &Path) -> LedgerSettings {
        LedgerSettings::builder()
            .channel("supplychain")
            .chaincode("supplychain")
            .peer_endpoint("localhost:7051")
            .msp_id("Org1MSP")
            .identity("user1")
            .tls_ca_cert(dir.join("ca.pem"))
            .identity_cert(dir.join("cert.pem"))
            .identity_key(dir.join("key.pem"))
            .build()
            .unwrap()
    }

    fn write_credentials(dir: &Path) {
        std::fs::write(dir.join("ca.pem"), TEST_IDENTITY_CERT).unwrap();
        std::fs::write(dir.join("cert.pem"), TEST_IDENTITY_CERT).unwrap();
        std::fs::write(dir.join("key.pem"), TEST_IDENTITY_KEY).unwrap();
    }

    #[test]
    fn test_new_requires_every_setting() {
        let dir = TempDir::new().unwrap();
        let full = settings_in(dir.path());

        let cases: [(&str, fn(&mut LedgerSettings)); 8] = [
            (env::CHANNEL, |s| s.channel = None),
            (env::CHAINCODE, |s| s.chaincode = None),
            (env::PEER_ENDPOINT, |s| s.peer_endpoint = None),
            (env::MSP_ID, |s| s.msp_id = None),
            (env::IDENTITY, |s| s.identity = None),
            (env::TLS_CA_CERT, |s| s.tls_ca_cert = None),
            (env::IDENTITY_CERT, |s| s.identity_cert = None),
            (env::IDENTITY_KEY, |s| s.identity_key = None),
        ];

        for (setting, clear) in cases {
            let mut settings = full.clone();
            clear(&mut settings);
            let err = FabricTransport::new(&settings).unwrap_err();
            assert!(matches!(err, LedgerError::Configuration(_)), "{setting}: {err}");
            assert!(err.to_string().contains(setting), "{setting}: {err}");
        }
    }

    #[test]
    fn test_new_rejects_invalid_endpoint() {
        let dir = TempDir::new().unwrap();
        let mut settings = settings_in(dir.path());
        settings.peer_endpoint = Some("peer0 with spaces:7051".into());

        let err = FabricTransport::new(&settings).unwrap_err();
        assert!(matches!(err, LedgerError::Configuration(_)));
    }

    #[test]
    fn test_new_does_not_touch_filesystem() {
        let dir = TempDir::new().unwrap();
        let transport = FabricTransport::new(&settings_in(dir.path())).unwrap();
        assert!(!transport.is_connected());
    }

    #[test]
    fn test_peer_uri_adds_https_scheme() {
        assert_eq!(peer_uri("peer0:7051"), "https://peer0:7051");
        assert_eq!(peer_uri("https://peer0:7051"), "https://peer0:7051");
        assert_eq!(peer_uri("http://peer0:7051"), "http://peer0:7051");
    }

    #[tokio::test]
    async fn test_missing_credential_names_file_and_setting() {
        let dir = TempDir::new().unwrap();
        let transport = FabricTransport::new(&settings_in(dir.path())).unwrap();

        let err = transport.submit("CreateBatch", &[]).await.unwrap_err();
        assert!(err.is_connection());
        let message = err.to_string();
        assert!(message.contains(env::TLS_CA_CERT), "{message}");
        assert!(message.contains("ca.pem"), "{message}");
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_malformed_key_is_connection_error() {
        let dir = TempDir::new().unwrap();
        write_credentials(dir.path());
        std::fs::write(dir.path().join("key.pem"), "not a key").unwrap();
        let transport = FabricTransport::new(&settings_in(dir.path())).unwrap();

        let err = transport.evaluate("GetBatch", &["b".into()]).await.unwrap_err();
        assert!(err.is_connection());
        assert!(err.to_string().contains(env::IDENTITY_KEY));
    }

    #[tokio::test]
    async fn test_overlapping_initialization_is_rejected() {
        let dir = TempDir::new().unwrap();
        let transport = FabricTransport::new(&settings_in(dir.path())).unwrap();
        transport.initializing.store(true, Ordering::Release);

        let err = transport.submit("CreateBatch", &[]).await.unwrap_err();
        assert!(err.is_connection());
        assert!(err.to_string().contains("already in progress"));
    }

    #[tokio::test]
    async fn test_failed_initialization_resets_flag() {
        let dir = TempDir::new().unwrap();
        let transport = FabricTransport::new(&settings_in(dir.path())).unwrap();

        let _ = transport.submit("CreateBatch", &[]).await;
        assert!(!transport.initializing.load(Ordering::Acquire));

        // A second call retries instead of reporting initialization in progress
        let err = transport.submit("CreateBatch", &[]).await.unwrap_err();
        assert!(!err.to_string().contains("already in progress"));
    }

    #[tokio::test]
    async fn test_close_without_connection_is_noop() {
        let dir = TempDir::new().unwrap();
        let transport = FabricTransport::new(&settings_in(dir.path())).unwrap();
        transport.close().await;
        transport.close().await;
        assert!(!transport.is_connected());
    }

    #[test]
    fn test_proposal_carries_function_and_args() {
        let dir = TempDir::new().unwrap();
        let transport = FabricTransport::new(&settings_in(dir.path())).unwrap();
        let signer =
            SigningIdentity::from_pem("Org1MSP", TEST_IDENTITY_CERT, TEST_IDENTITY_KEY).unwrap();
        let context = TransactionContext::new(&signer);

        let proposal =
            transport.proposal(&context, "CreateBatch", &["b-1".into(), "500".into()]);

        let header = Header::decode(proposal.header.as_slice()).unwrap();
        let channel_header = ChannelHeader::decode(header.channel_header.as_slice()).unwrap();
        assert_eq!(channel_header.r#type, HEADER_TYPE_ENDORSER_TRANSACTION);
        assert_eq!(channel_header.channel_id, "supplychain");
        assert_eq!(channel_header.tx_id, context.tx_id);

        let payload = ChaincodeProposalPayload::decode(proposal.payload.as_slice()).unwrap();
        let invocation = ChaincodeInvocationSpec::decode(payload.input.as_slice()).unwrap();
        let spec = invocation.chaincode_spec.unwrap();
        assert_eq!(spec.chaincode_id.unwrap().name, "supplychain");
        assert_eq!(
            spec.input.unwrap().args,
            vec![b"CreateBatch".to_vec(), b"b-1".to_vec(), b"500".to_vec()]
        );
    }

    fn prepared_payload(chaincode_payload: &[u8]) -> Vec<u8> {
        let chaincode_action = ChaincodeAction {
            response: Some(Response {
                status: 200,
                message: String::new(),
                payload: chaincode_payload.to_vec(),
            }),
            ..Default::default()
        };
        let response_payload = ProposalResponsePayload {
            proposal_hash: vec![0; 32],
            extension: chaincode_action.encode_to_vec(),
        };
        let action_payload = ChaincodeActionPayload {
            chaincode_proposal_payload: Vec::new(),
            action: Some(ChaincodeEndorsedAction {
                proposal_response_payload: response_payload.encode_to_vec(),
            }),
        };
        let transaction = Transaction {
            actions: vec![TransactionAction {
                header: Vec::new(),
                payload: action_payload.encode_to_vec(),
            }],
        };
        Payload { header: None, data: transaction.encode_to_vec() }.encode_to_vec()
    }

    #[test]
    fn test_transaction_result_extracts_chaincode_payload() {
        let payload = prepared_payload(br#"{"batch_id":"b-1"}"#);
        assert_eq!(transaction_result(&payload).unwrap(), br#"{"batch_id":"b-1"}"#);
    }

    #[test]
    fn test_transaction_result_without_actions_is_empty() {
        let payload =
            Payload { header: None, data: Transaction::default().encode_to_vec() }.encode_to_vec();
        assert!(transaction_result(&payload).unwrap().is_empty());
    }

    #[test]
    fn test_transaction_result_rejects_garbage() {
        assert!(transaction_result(&[0xff, 0xff, 0xff]).is_err());
    }

    #[test]
    fn test_result_value_parses_json_or_falls_back_to_string() {
        assert_eq!(result_value(br#"{"ok":true}"#), serde_json::json!({"ok": true}));
        assert_eq!(result_value(b"plain text"), Value::String("plain text".into()));
        assert_eq!(result_value(b""), Value::String(String::new()));
    }

    #[test]
    fn test_status_error_appends_peer_details() {
        let detail = ErrorDetail {
            address: "peer0.org1:7051".into(),
            msp_id: "Org1MSP".into(),
            message: "chaincode response 500, batch already exists".into(),
        };
        let details = RpcStatus {
            code: 10,
            message: "failed to endorse transaction".into(),
            details: vec![Any {
                type_url: ERROR_DETAIL_TYPE_URL.into(),
                value: detail.encode_to_vec(),
            }],
        };
        let status = Status::with_details(
            tonic::Code::Aborted,
            "failed to endorse transaction",
            details.encode_to_vec().into(),
        );

        let err = status_error("CreateBatch", &status);
        assert_eq!(err.transaction_kind(), Some(TransactionErrorKind::Rejected));
        let message = err.to_string();
        assert!(message.contains("failed to endorse transaction"), "{message}");
        assert!(message.contains("peer0.org1:7051 (Org1MSP)"), "{message}");
        assert!(message.contains("batch already exists"), "{message}");
    }

    #[test]
    fn test_status_error_uses_code_first() {
        let status = Status::unavailable("connection refused");
        assert!(status_error("GetBatch", &status).is_connection());
    }
}
