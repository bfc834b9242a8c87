//! Sans-IO session state machines for the push gateway and feedback service
//! (spec §4.3, §4.4).
//!
//! Neither state machine here performs I/O. The gateway session returns
//! actions for a driver to execute against a live
//! [`apns_transport::TlsSession`]; the feedback session is a pure fold over
//! byte chunks. The driver that wires these to real sockets and a dispatch
//! queue lives in `apns-client`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

mod clock;
mod error;
mod feedback;
mod gateway;

pub use clock::{Clock, SystemClock};
pub use error::GatewayError;
pub use feedback::FeedbackSession;
pub use gateway::{GatewayAction, GatewaySession, GatewayState};
