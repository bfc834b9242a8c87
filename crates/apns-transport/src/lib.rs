//! Client-authenticated TLS transport lifecycle (spec §4.2).
//!
//! This crate knows how to turn an [`Endpoint`] plus a [`ClientIdentity`] and
//! [`TrustAnchors`] pair into a live, mutually authenticated byte stream. It
//! does not know anything about the APNs wire format — that lives in
//! `apns-proto` — or about when to open, keep warm, or tear down a
//! connection, which is `apns-client`'s dispatch queue's job.
//!
//! Built on `tokio-rustls` rather than the QUIC-based transport this
//! workspace's TLS stack more commonly reaches for, because the legacy APNs
//! protocol is a single bidirectional TCP stream with no multiplexing.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

mod endpoint;
mod error;
mod identity;
mod session;

pub use endpoint::{Endpoint, EndpointSet};
pub use error::TransportError;
pub use identity::{ClientIdentity, TrustAnchors};
pub use session::{PushTransport, TlsSession, TokioTlsTransport};
