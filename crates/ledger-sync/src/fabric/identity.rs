//! Client identity and transaction signing.

use std::fmt;

use p256::{
    SecretKey,
    ecdsa::{Signature, SigningKey, signature::Signer},
    pkcs8::DecodePrivateKey,
};
use prost::Message;
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::proto::{SerializedIdentity, SignatureHeader};

const CERTIFICATE_MARKER: &str = "-----BEGIN CERTIFICATE-----";
const NONCE_LEN: usize = 24;

/// Why identity material was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum IdentityError {
    #[error("identity certificate is not a PEM certificate")]
    InvalidCertificate,

    #[error("identity key is not a P-256 private key in PKCS#8 or SEC1 PEM form")]
    InvalidKey,
}

/// An MSP identity able to sign proposals and envelopes.
pub(crate) struct SigningIdentity {
    msp_id: String,
    certificate: Vec<u8>,
    key: SigningKey,
}

impl SigningIdentity {
    pub(crate) fn from_pem(
        msp_id: &str,
        certificate_pem: &str,
        key_pem: &str,
    ) -> Result<Self, IdentityError> {
        if !certificate_pem.contains(CERTIFICATE_MARKER) {
            return Err(IdentityError::InvalidCertificate);
        }

        let key = match SigningKey::from_pkcs8_pem(key_pem) {
            Ok(key) => key,
            Err(_) => SecretKey::from_sec1_pem(key_pem)
                .map(SigningKey::from)
                .map_err(|_| IdentityError::InvalidKey)?,
        };

        Ok(Self { msp_id: msp_id.to_owned(), certificate: certificate_pem.as_bytes().to_vec(), key })
    }

    /// Serialized `msp.SerializedIdentity` of this client.
    pub(crate) fn creator(&self) -> Vec<u8> {
        SerializedIdentity { mspid: self.msp_id.clone(), id_bytes: self.certificate.clone() }
            .encode_to_vec()
    }

    /// DER-encoded low-S ECDSA signature over the SHA-256 of `message`.
    pub(crate) fn sign(&self, message: &[u8]) -> Vec<u8> {
        let signature: Signature = self.key.sign(message);
        let signature = signature.normalize_s().unwrap_or(signature);
        signature.to_der().as_bytes().to_vec()
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("msp_id", &self.msp_id)
            .field("key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Identifiers shared by every message of one transaction.
#[derive(Debug, Clone)]
pub(crate) struct TransactionContext {
    pub(crate) tx_id: String,
    nonce: Vec<u8>,
    creator: Vec<u8>,
}

impl TransactionContext {
    /// Fresh nonce; the transaction id is `hex(sha256(nonce || creator))`.
    pub(crate) fn new(identity: &SigningIdentity) -> Self {
        let nonce = rand::random::<[u8; NONCE_LEN]>().to_vec();
        Self::with_nonce(identity, nonce)
    }

    fn with_nonce(identity: &SigningIdentity, nonce: Vec<u8>) -> Self {
        let creator = identity.creator();
        let mut hasher = Sha256::new();
        hasher.update(&nonce);
        hasher.update(&creator);
        let tx_id = hex::encode(hasher.finalize());
        Self { tx_id, nonce, creator }
    }

    pub(crate) fn signature_header(&self) -> Vec<u8> {
        SignatureHeader { creator: self.creator.clone(), nonce: self.nonce.clone() }.encode_to_vec()
    }

    pub(crate) fn creator(&self) -> &[u8] {
        &self.creator
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use p256::ecdsa::{VerifyingKey, signature::Verifier};

    use super::*;
    use crate::testutil::{TEST_IDENTITY_CERT, TEST_IDENTITY_KEY, TEST_IDENTITY_SEC1_KEY};

    fn identity() -> SigningIdentity {
        SigningIdentity::from_pem("Org1MSP", TEST_IDENTITY_CERT, TEST_IDENTITY_KEY).unwrap()
    }

    #[test]
    fn test_pkcs8_and_sec1_keys_are_the_same_identity() {
        let pkcs8 = identity();
        let sec1 =
            SigningIdentity::from_pem("Org1MSP", TEST_IDENTITY_CERT, TEST_IDENTITY_SEC1_KEY).unwrap();
        assert_eq!(pkcs8.key.verifying_key(), sec1.key.verifying_key());
    }

    #[test]
    fn test_rejects_non_certificate() {
        let err = SigningIdentity::from_pem("Org1MSP", "not a cert", TEST_IDENTITY_KEY).unwrap_err();
        assert_eq!(err, IdentityError::InvalidCertificate);
    }

    #[test]
    fn test_rejects_garbage_key() {
        let err = SigningIdentity::from_pem("Org1MSP", TEST_IDENTITY_CERT, "garbage").unwrap_err();
        assert_eq!(err, IdentityError::InvalidKey);
    }

    #[test]
    fn test_signature_verifies_and_is_low_s() {
        let identity = identity();
        let message = b"proposal bytes";

        let der = identity.sign(message);
        let signature = Signature::from_der(&der).unwrap();
        assert!(signature.normalize_s().is_none(), "signature must already be low-S");

        let verifying_key = VerifyingKey::from(&identity.key);
        verifying_key.verify(message, &signature).expect("signature should verify");
    }

    #[test]
    fn test_creator_carries_msp_and_certificate() {
        let creator = identity().creator();
        let decoded = SerializedIdentity::decode(creator.as_slice()).unwrap();
        assert_eq!(decoded.mspid, "Org1MSP");
        assert_eq!(decoded.id_bytes, TEST_IDENTITY_CERT.as_bytes());
    }

    #[test]
    fn test_tx_id_is_hash_of_nonce_and_creator() {
        let identity = identity();
        let context = TransactionContext::with_nonce(&identity, vec![7; NONCE_LEN]);

        let mut expected = Sha256::new();
        expected.update([7u8; NONCE_LEN]);
        expected.update(identity.creator());
        assert_eq!(context.tx_id, hex::encode(expected.finalize()));
        assert_eq!(context.tx_id.len(), 64);
    }

    #[test]
    fn test_fresh_contexts_have_distinct_ids() {
        let identity = identity();
        let a = TransactionContext::new(&identity);
        let b = TransactionContext::new(&identity);
        assert_ne!(a.tx_id, b.tx_id);
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", identity());
        assert!(rendered.contains("Org1MSP"));
        assert!(rendered.contains("<redacted>"));
    }
}
