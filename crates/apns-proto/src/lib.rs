//! Binary wire codec for the legacy Apple Push Notification gateway.
//!
//! Covers three wire structures:
//!
//! - the outbound notification frame ([`notification::encode_notification`])
//! - the inbound 6-byte error response frame ([`response::decode_response`])
//! - the feedback service's repeated 38-byte records
//!   ([`feedback::FeedbackParser`])
//!
//! This crate is pure and synchronous: it has no async runtime dependency and
//! performs no I/O. The transport layer that reads and writes these bytes
//! lives in `apns-transport`; the session state machines that decide *when*
//! to call into this codec live in `apns-core`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod feedback;
mod notification;
mod response;
mod token;

pub use error::ProtocolError;
pub use feedback::{FeedbackParser, FeedbackRecord};
pub use notification::encode_notification;
pub use response::{ResponseStatus, decode_response};
pub use token::DeviceToken;

/// Command byte for an outbound notification frame (spec §3).
pub const COMMAND_NOTIFICATION: u8 = 0x01;

/// Command byte for an inbound error response frame (spec §3).
pub const COMMAND_RESPONSE: u8 = 0x08;

/// Fixed length of a device token, in bytes.
pub const TOKEN_LENGTH: usize = 32;

/// Fixed length of a decoded error response frame, in bytes.
pub const RESPONSE_FRAME_LENGTH: usize = 6;

/// Fixed length of a single feedback record, in bytes.
pub const FEEDBACK_RECORD_LENGTH: usize = 38;

/// Largest payload length representable by the notification frame's 16-bit
/// length field.
pub const MAX_FRAME_PAYLOAD_SIZE: usize = u16::MAX as usize;
