//! Client TLS identity and trust anchors.
//!
//! Per spec §1, the cryptographic identity store (keys, certificate chain,
//! validation) is an external collaborator; this module only consumes the
//! already-issued PEM material and wraps it in the types `rustls` wants.

use std::sync::Arc;

use rustls::RootCertStore;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};

use crate::TransportError;

/// The mutually authenticated client's certificate chain and private key.
///
/// One `ClientIdentity` is shared by both the push and feedback sessions
/// (spec §6: "the client identity is the push certificate issued per
/// application").
#[derive(Clone)]
pub struct ClientIdentity {
    pub(crate) cert_chain: Vec<CertificateDer<'static>>,
    pub(crate) key: Arc<PrivateKeyDer<'static>>,
}

impl ClientIdentity {
    /// Parse a PEM-encoded certificate chain and private key.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidConfig`] if either PEM block fails to
    /// parse, or if the key file contains no private key.
    pub fn from_pem(cert_chain_pem: &[u8], private_key_pem: &[u8]) -> Result<Self, TransportError> {
        let cert_chain: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut &cert_chain_pem[..])
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| TransportError::InvalidConfig(format!("invalid certificate PEM: {e}")))?;

        if cert_chain.is_empty() {
            return Err(TransportError::InvalidConfig(
                "certificate PEM contained no certificates".to_string(),
            ));
        }

        let key = rustls_pemfile::private_key(&mut &private_key_pem[..])
            .map_err(|e| TransportError::InvalidConfig(format!("invalid private key PEM: {e}")))?
            .ok_or_else(|| TransportError::InvalidConfig("no private key found".to_string()))?;

        Ok(Self { cert_chain, key: Arc::new(key) })
    }
}

/// The set of certificate authorities trusted when verifying the peer's
/// server certificate (spec §3: "the trust anchor set is the caller's
/// choice, typically Apple's intermediate/root").
#[derive(Clone)]
pub struct TrustAnchors {
    pub(crate) store: Arc<RootCertStore>,
}

impl TrustAnchors {
    /// Parse one or more PEM-encoded root certificates.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidConfig`] if the PEM cannot be parsed
    /// or contains no usable certificates.
    pub fn from_pem(roots_pem: &[u8]) -> Result<Self, TransportError> {
        let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut &roots_pem[..])
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| TransportError::InvalidConfig(format!("invalid trust anchor PEM: {e}")))?;

        let mut store = RootCertStore::empty();
        for cert in certs {
            store
                .add(cert)
                .map_err(|e| TransportError::InvalidConfig(format!("invalid root certificate: {e}")))?;
        }

        if store.is_empty() {
            return Err(TransportError::InvalidConfig(
                "trust anchor PEM contained no certificates".to_string(),
            ));
        }

        Ok(Self { store: Arc::new(store) })
    }

    /// Wrap an already-populated root store (e.g. for tests).
    #[must_use]
    pub fn from_store(store: RootCertStore) -> Self {
        Self { store: Arc::new(store) }
    }
}
