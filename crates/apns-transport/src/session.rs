//! TLS session establishment and the live byte-stream handle.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

use crate::{ClientIdentity, Endpoint, TransportError, TrustAnchors};

/// Produces a [`TlsSession`] for a given endpoint.
///
/// Implemented by [`TokioTlsTransport`] in production and by a fake
/// implementation in `apns-harness` for tests — the gateway and feedback
/// session state machines in `apns-core` are generic over this trait so they
/// never depend on a live socket.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Perform a full connect + mutual-TLS handshake against `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on DNS, TCP, or TLS handshake failure
    /// (spec §4.2).
    async fn connect(&self, endpoint: &Endpoint) -> Result<TlsSession, TransportError>;
}

/// Production transport: TCP + mutual TLS via `tokio-rustls`.
pub struct TokioTlsTransport {
    connector: TlsConnector,
    server_name: String,
}

impl TokioTlsTransport {
    /// Build a transport that authenticates as `identity` and trusts
    /// `trust_anchors`, presenting `server_name` during the handshake.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidConfig`] if the identity's private
    /// key is rejected by `rustls` (e.g. unsupported key type).
    pub fn new(
        identity: ClientIdentity,
        trust_anchors: TrustAnchors,
        server_name: impl Into<String>,
    ) -> Result<Self, TransportError> {
        // Idempotent: ignored if a prior transport in this process already
        // installed the process-wide default crypto provider.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let config = rustls::ClientConfig::builder()
            .with_root_certificates((*trust_anchors.store).clone())
            .with_client_auth_cert(identity.cert_chain.clone(), identity.key.clone_key())
            .map_err(|e| TransportError::InvalidConfig(format!("invalid client certificate: {e}")))?;

        Ok(Self { connector: TlsConnector::from(Arc::new(config)), server_name: server_name.into() })
    }
}

#[async_trait]
impl PushTransport for TokioTlsTransport {
    async fn connect(&self, endpoint: &Endpoint) -> Result<TlsSession, TransportError> {
        let addr = endpoint.authority();

        tracing::debug!(%addr, "dialing tcp connection");
        let tcp = TcpStream::connect(&addr)
            .await
            .map_err(|source| TransportError::Connect { addr: addr.clone(), source })?;

        let server_name = rustls::pki_types::ServerName::try_from(self.server_name.clone())
            .map_err(|e| TransportError::InvalidConfig(format!("invalid server name: {e}")))?;

        tracing::debug!(%addr, server_name = %self.server_name, "starting tls handshake");
        let stream = self
            .connector
            .connect(server_name, tcp)
            .await
            .map_err(|source| TransportError::Handshake { addr: addr.clone(), source })?;

        tracing::info!(%addr, "tls session established");
        Ok(TlsSession::new(stream))
    }
}

/// A live, mutually authenticated byte stream to either the push gateway or
/// the feedback service.
///
/// `close` is idempotent (spec §4.2): calling it twice, or after the peer has
/// already closed, is not an error.
pub struct TlsSession {
    stream: Option<TlsStream<TcpStream>>,
}

impl TlsSession {
    fn new(stream: TlsStream<TcpStream>) -> Self {
        Self { stream: Some(stream) }
    }

    /// Write all of `bytes`, blocking until the transport has accepted them.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] on write failure, or a connection-reset
    /// style error if the session was already closed.
    pub async fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let stream = self.stream.as_mut().ok_or_else(session_closed)?;
        stream.write_all(bytes).await?;
        Ok(())
    }

    /// Read up to `max` bytes. Returns `Ok(None)` if the peer has closed the
    /// connection (spec §4.2: "reads may return short").
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] on read failure.
    pub async fn read(&mut self, max: usize) -> Result<Option<Vec<u8>>, TransportError> {
        let stream = self.stream.as_mut().ok_or_else(session_closed)?;
        let mut buf = vec![0u8; max];
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        Ok(Some(buf))
    }

    /// Close the session. Safe to call more than once.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(error) = stream.shutdown().await {
                tracing::debug!(%error, "tls shutdown failed (peer likely already closed)");
            }
        }
    }

    /// Whether the session has already been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }
}

fn session_closed() -> TransportError {
    TransportError::Io(std::io::Error::new(
        std::io::ErrorKind::NotConnected,
        "tls session is closed",
    ))
}
