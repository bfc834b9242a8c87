//! Errors surfaced by the public service facade (spec §7).

use thiserror::Error;

/// Errors returned synchronously to callers of [`crate::ApnsService`].
///
/// Everything recoverable inside the dispatch worker itself (a failed write,
/// a dropped connection) is handled locally by closing and requeuing; it
/// never reaches this type. Only caller-facing failures are represented here.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The caller supplied a malformed token, oversized payload, or other
    /// invalid argument. Never retried.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] apns_proto::ProtocolError),

    /// The dispatch queue is at capacity and cannot accept another frame.
    #[error("dispatch queue is full")]
    QueueFull,

    /// `fetch_unreachable` was called while a feedback drain was already in
    /// progress.
    #[error("a feedback drain is already in progress")]
    AlreadyPolling,

    /// The TLS transport failed during a feedback drain or a `configure`
    /// reconnect probe.
    #[error(transparent)]
    Transport(#[from] apns_transport::TransportError),

    /// The service was not running (`start` not yet called, or `stop`
    /// already completed).
    #[error("the service is not running")]
    NotRunning,
}
