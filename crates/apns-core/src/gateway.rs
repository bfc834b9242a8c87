//! Push gateway session state machine.
//!
//! Uses the action pattern: methods take time as input and return actions for
//! a driver (the dispatch worker in `apns-client`) to execute. This keeps the
//! state machine itself free of I/O, so idle-timeout and failure-recovery
//! logic can be exercised with a fake clock in tests.
//!
//! # State machine
//!
//! ```text
//! absent ──begin_connect──> connecting ──on_connected──> connected
//! connected ──send──> connected
//! connected ──write failure / peer close──> draining ──residual read──> absent
//! connected ──idle timeout──> closing ──> absent
//! ```

use std::ops::Sub;
use std::time::Duration;

use apns_proto::{ResponseStatus, decode_response};

use crate::error::GatewayError;

/// Current state of a [`GatewaySession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayState {
    /// No connection exists.
    Absent,
    /// A TLS handshake has been requested but has not completed.
    Connecting,
    /// A connection is live and may be written to.
    Connected,
    /// The connection is being torn down; one residual read is pending.
    Draining,
    /// The connection is being torn down due to an idle timeout.
    Closing,
}

/// Actions returned by the gateway session. The driver executes these against
/// the live [`apns_transport::TlsSession`]; the state machine itself never
/// touches a socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayAction {
    /// Open a TLS connection to the push endpoint.
    OpenConnection,
    /// Write this encoded notification frame.
    SendFrame(Vec<u8>),
    /// Attempt one non-blocking read of up to 6 bytes before closing (spec
    /// §4.3: the residual response buffer).
    AttemptResidualRead,
    /// A response frame was decoded; hand it to the response observer.
    DeliverResponse {
        /// Decoded status.
        status: ResponseStatus,
        /// Identifier correlating this response to an enqueued frame.
        identifier: u32,
    },
    /// Close the underlying TLS session.
    CloseSession,
}

/// Sans-IO state machine for the single push session.
///
/// Generic over the instant type so tests can drive idle-timeout logic with
/// a fake clock instead of real time.
#[derive(Debug, Clone)]
pub struct GatewaySession<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    state: GatewayState,
    last_activity: Option<I>,
}

impl<I> Default for GatewaySession<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<I> GatewaySession<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Create a new session in [`GatewayState::Absent`].
    #[must_use]
    pub fn new() -> Self {
        Self { state: GatewayState::Absent, last_activity: None }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> GatewayState {
        self.state
    }

    /// Request a new connection. Only legal from [`GatewayState::Absent`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidState`] if a session is already
    /// connecting, connected, or being torn down.
    pub fn begin_connect(&mut self) -> Result<Vec<GatewayAction>, GatewayError> {
        if self.state != GatewayState::Absent {
            return Err(GatewayError::InvalidState { state: self.state, operation: "begin_connect" });
        }
        self.state = GatewayState::Connecting;
        Ok(vec![GatewayAction::OpenConnection])
    }

    /// Record that the connection attempt failed. Returns to
    /// [`GatewayState::Absent`] so the next frame can reopen it (spec §4.3:
    /// "connect failure ⇒ the triggering frame is handed to the requeue
    /// list").
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidState`] unless currently connecting.
    pub fn on_connect_failed(&mut self) -> Result<(), GatewayError> {
        if self.state != GatewayState::Connecting {
            return Err(GatewayError::InvalidState {
                state: self.state,
                operation: "on_connect_failed",
            });
        }
        self.state = GatewayState::Absent;
        Ok(())
    }

    /// Record that the TLS handshake completed.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidState`] unless currently connecting.
    pub fn on_connected(&mut self, now: I) -> Result<(), GatewayError> {
        if self.state != GatewayState::Connecting {
            return Err(GatewayError::InvalidState { state: self.state, operation: "on_connected" });
        }
        self.state = GatewayState::Connected;
        self.last_activity = Some(now);
        Ok(())
    }

    /// Hand a notification frame to the driver for writing. Only legal while
    /// [`GatewayState::Connected`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidState`] if not connected.
    pub fn send(&mut self, frame: Vec<u8>) -> Result<Vec<GatewayAction>, GatewayError> {
        if self.state != GatewayState::Connected {
            return Err(GatewayError::InvalidState { state: self.state, operation: "send" });
        }
        Ok(vec![GatewayAction::SendFrame(frame)])
    }

    /// Record a successful write, refreshing the idle clock.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidState`] if not connected.
    pub fn on_write_success(&mut self, now: I) -> Result<(), GatewayError> {
        if self.state != GatewayState::Connected {
            return Err(GatewayError::InvalidState {
                state: self.state,
                operation: "on_write_success",
            });
        }
        self.last_activity = Some(now);
        Ok(())
    }

    /// A write failed, or the peer closed / a read error occurred. Begin
    /// draining: attempt one residual read before the session is discarded
    /// (spec §4.3).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidState`] if not connected.
    pub fn begin_draining(&mut self) -> Result<Vec<GatewayAction>, GatewayError> {
        if self.state != GatewayState::Connected {
            return Err(GatewayError::InvalidState {
                state: self.state,
                operation: "begin_draining",
            });
        }
        self.state = GatewayState::Draining;
        Ok(vec![GatewayAction::AttemptResidualRead])
    }

    /// Consume the result of the residual read requested by
    /// [`Self::begin_draining`]. Decodes a response frame if one was present
    /// and returns to [`GatewayState::Absent`].
    ///
    /// `bytes` is `None` if the peer closed without sending anything.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Protocol`] if `bytes` is non-empty but does not
    /// decode as a valid 6-byte response frame, or
    /// [`GatewayError::InvalidState`] if not currently draining. A malformed
    /// residual read still leaves the session in [`GatewayState::Absent`] so
    /// the caller may reconnect; decode failure is reported for logging, not
    /// to block reopening.
    pub fn on_residual_read(
        &mut self,
        bytes: Option<&[u8]>,
    ) -> Result<Vec<GatewayAction>, GatewayError> {
        if self.state != GatewayState::Draining {
            return Err(GatewayError::InvalidState {
                state: self.state,
                operation: "on_residual_read",
            });
        }
        self.state = GatewayState::Absent;
        self.last_activity = None;

        let mut actions = vec![GatewayAction::CloseSession];
        match bytes {
            None | Some([]) => {},
            Some(frame) => {
                let (status, identifier) = decode_response(frame)?;
                actions.push(GatewayAction::DeliverResponse { status, identifier });
            },
        }
        Ok(actions)
    }

    /// Whether the session has been idle (no successful send) for at least
    /// `idle_timeout`. Only meaningful while connected.
    #[must_use]
    pub fn is_idle(&self, now: I, idle_timeout: Duration) -> bool {
        match (self.state, self.last_activity) {
            (GatewayState::Connected, Some(last)) => now - last >= idle_timeout,
            _ => false,
        }
    }

    /// Begin closing the session proactively due to an idle timeout.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidState`] if not connected.
    pub fn begin_idle_close(&mut self) -> Result<Vec<GatewayAction>, GatewayError> {
        if self.state != GatewayState::Connected {
            return Err(GatewayError::InvalidState {
                state: self.state,
                operation: "begin_idle_close",
            });
        }
        self.state = GatewayState::Closing;
        Ok(vec![GatewayAction::CloseSession])
    }

    /// Record that the driver finished tearing down the session (either
    /// variety of close). Returns to [`GatewayState::Absent`].
    pub fn on_closed(&mut self) {
        self.state = GatewayState::Absent;
        self.last_activity = None;
    }
}
