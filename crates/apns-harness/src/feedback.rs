//! Fake feedback service: accepts one connection, writes whatever byte
//! chunks a test script supplies, then closes (spec §6 feedback endpoint
//! contract: "client opens connection, sends nothing, reads a sequence of
//! records until peer close").

use std::io;
use std::net::SocketAddr;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsAcceptor;
use tokio_rustls::server::TlsStream;

use crate::certs::TestCertificates;

/// A bound fake feedback service listening on an ephemeral `127.0.0.1` port.
pub struct FakeFeedbackServer {
    listener: TcpListener,
    acceptor: TlsAcceptor,
    addr: SocketAddr,
}

impl FakeFeedbackServer {
    /// Bind a fake feedback service using `certs` for its server identity.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if binding the ephemeral port fails.
    pub async fn bind(certs: &TestCertificates) -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let acceptor = TlsAcceptor::from(certs.server_config());
        Ok(Self { listener, acceptor, addr })
    }

    /// Local address the feedback drain should connect to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Accept one connection, write `chunks` to it in order, then close.
    ///
    /// Matches the real feedback service: it is a pure producer, the client
    /// never writes anything back.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the accept, handshake, or any write fails.
    pub async fn serve_once(&self, chunks: &[Vec<u8>]) -> io::Result<()> {
        let (tcp, _peer) = self.listener.accept().await?;
        let mut tls: TlsStream<TcpStream> = self.acceptor.accept(tcp).await?;
        for chunk in chunks {
            tls.write_all(chunk).await?;
        }
        tls.shutdown().await?;
        Ok(())
    }
}
