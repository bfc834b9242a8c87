//! Fake push gateway: accepts one mutually authenticated TLS connection at a
//! time and lets a test script what bytes the peer reads and writes (spec §6
//! push endpoint contract).

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsAcceptor;
use tokio_rustls::server::TlsStream;

use crate::certs::TestCertificates;

/// Header length of a notification frame up to and including the fixed
/// 32-byte token (spec §3): command + identifier + expiry + token_length +
/// token.
const NOTIFICATION_HEADER_LEN: usize = 1 + 4 + 4 + 2 + 32;

/// A bound fake push gateway listening on an ephemeral `127.0.0.1` port.
pub struct FakePushServer {
    listener: TcpListener,
    acceptor: TlsAcceptor,
    addr: SocketAddr,
}

impl FakePushServer {
    /// Bind a fake push gateway using `certs` for its server identity.
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

    /// Local address the dispatch worker should connect to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Accept and handshake exactly one incoming connection.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the accept or TLS handshake fails.
    pub async fn accept(&self) -> io::Result<FakePushConnection> {
        let (tcp, _peer) = self.listener.accept().await?;
        let tls = self.acceptor.accept(tcp).await?;
        Ok(FakePushConnection { stream: tls, buffer: Vec::new() })
    }
}

/// One accepted connection from the dispatch worker.
pub struct FakePushConnection {
    stream: TlsStream<TcpStream>,
    buffer: Vec<u8>,
}

impl FakePushConnection {
    /// Read exactly one complete notification frame (spec §3), blocking
    /// until enough bytes have arrived or the peer closes the connection.
    ///
    /// Returns `None` if the peer closed before a complete frame arrived.
    pub async fn read_frame(&mut self) -> io::Result<Option<Vec<u8>>> {
        while self.buffer.len() < NOTIFICATION_HEADER_LEN {
            if !self.fill().await? {
                return Ok(None);
            }
        }

        let payload_len_offset = NOTIFICATION_HEADER_LEN;
        while self.buffer.len() < payload_len_offset + 2 {
            if !self.fill().await? {
                return Ok(None);
            }
        }
        let payload_len = u16::from_be_bytes(
            self.buffer[payload_len_offset..payload_len_offset + 2].try_into().expect("2 bytes"),
        ) as usize;
        let frame_len = payload_len_offset + 2 + payload_len;

        while self.buffer.len() < frame_len {
            if !self.fill().await? {
                return Ok(None);
            }
        }

        let frame = self.buffer[..frame_len].to_vec();
        self.buffer.drain(..frame_len);
        Ok(Some(frame))
    }

    /// Read one more chunk into the internal buffer. Returns `false` on EOF.
    async fn fill(&mut self) -> io::Result<bool> {
        let mut chunk = [0u8; 512];
        let n = self.stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(false);
        }
        self.buffer.extend_from_slice(&chunk[..n]);
        Ok(true)
    }

    /// Write the 6-byte error response frame (spec §3) and close the
    /// connection, matching the real gateway's error-then-close behavior.
    pub async fn respond_and_close(mut self, status: u8, identifier: u32) -> io::Result<()> {
        let mut frame = vec![0x08, status];
        frame.extend_from_slice(&identifier.to_be_bytes());
        self.stream.write_all(&frame).await?;
        self.stream.shutdown().await?;
        Ok(())
    }

    /// Close the connection without sending a response, as the gateway does
    /// for an accepted notification.
    pub async fn close(mut self) -> io::Result<()> {
        self.stream.shutdown().await
    }

    /// Force-close the connection with `SO_LINGER(0)` so the kernel sends an
    /// immediate TCP reset instead of a graceful FIN, causing the dispatch
    /// worker's next write on this connection to fail. Used to drive the
    /// requeue-on-write-failure path from outside the session state machine.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if setting the socket option fails.
    pub fn reset(self) -> io::Result<()> {
        self.stream.get_ref().0.set_linger(Some(std::time::Duration::ZERO))?;
        drop(self);
        Ok(())
    }
}
