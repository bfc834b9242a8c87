//! Error types for the gateway and feedback session state machines.
//!
//! We avoid using `std::io::Error` for protocol logic to keep transport
//! failures (recoverable, handled by closing and reopening the session) and
//! programmer errors (illegal state transitions) distinguishable by type.

use thiserror::Error;

use crate::gateway::GatewayState;

/// Errors raised by [`crate::gateway::GatewaySession`].
#[derive(Error, Debug)]
pub enum GatewayError {
    /// A method was called that is illegal in the session's current state.
    #[error("invalid gateway transition: cannot {operation} from {state:?}")]
    InvalidState {
        /// State the session was in when the illegal call was made.
        state: GatewayState,
        /// Name of the operation that was attempted.
        operation: &'static str,
    },

    /// The residual read at close produced bytes that do not decode as a
    /// valid response frame.
    #[error("malformed response frame: {0}")]
    Protocol(#[from] apns_proto::ProtocolError),

    /// The TLS transport failed during connect, write, or read.
    #[error("transport failure: {0}")]
    Transport(#[from] apns_transport::TransportError),
}

impl GatewayError {
    /// Returns true if this error may succeed if the caller simply reopens
    /// the session and retries.
    ///
    /// Protocol errors and illegal transitions are not transient: the former
    /// indicates a gateway that is not speaking the expected wire format, the
    /// latter a bug in the caller.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
