//! Transport-layer errors.

use thiserror::Error;

/// Errors surfaced by TLS transport operations.
///
/// Corresponds to spec §7's `TransportError` kind: any DNS, TCP, or TLS
/// handshake failure on connect, or an I/O failure on an established
/// session. Surfaced synchronously from `fetch_unreachable`; inside the
/// dispatch worker it is recovered locally (session closed, frame requeued).
#[derive(Error, Debug)]
pub enum TransportError {
    /// DNS resolution of the endpoint's host failed.
    #[error("dns resolution failed for {host}: {source}")]
    Dns {
        /// Host name that failed to resolve.
        host: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TCP connection establishment failed.
    #[error("tcp connect to {addr} failed: {source}")]
    Connect {
        /// Address that was dialed.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TLS handshake failed (certificate rejected, protocol mismatch, etc).
    #[error("tls handshake with {addr} failed: {source}")]
    Handshake {
        /// Address the handshake was attempted against.
        addr: String,
        /// Underlying TLS error.
        #[source]
        source: std::io::Error,
    },

    /// A read or write on an established session failed.
    #[error("transport io error: {0}")]
    Io(#[from] std::io::Error),

    /// The supplied identity or trust material could not be parsed.
    #[error("invalid tls configuration: {0}")]
    InvalidConfig(String),
}
