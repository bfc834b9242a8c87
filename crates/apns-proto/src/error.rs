//! Errors raised while encoding or decoding wire frames.

use thiserror::Error;

/// Errors from the frame codec.
///
/// All variants are caller-input errors (spec §7's `InvalidInput` kind):
/// bad token length, oversized payload, a malformed hex string, or a status
/// byte the gateway is not documented to send. None of these are retried by
/// the caller; they are raised synchronously.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Device token was not exactly 32 bytes.
    #[error("invalid token length: expected 32 bytes, got {actual}")]
    InvalidTokenLength {
        /// Length actually supplied.
        actual: usize,
    },

    /// Hex-encoded token was not exactly 64 hex characters.
    #[error("invalid hex token: {reason}")]
    InvalidHexToken {
        /// Human-readable reason (wrong length or non-hex character).
        reason: String,
    },

    /// Payload exceeded the configured or protocol maximum.
    #[error("payload too large: {size} bytes exceeds maximum of {max} bytes")]
    PayloadTooLarge {
        /// Size of the payload that was rejected.
        size: usize,
        /// Maximum permitted size.
        max: usize,
    },

    /// Buffer supplied to a decoder was shorter than the structure it holds.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Minimum required length.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },

    /// Response frame's command byte was not [`crate::COMMAND_RESPONSE`].
    #[error("unexpected command byte: {0:#04x}")]
    UnexpectedCommand(u8),

    /// Response frame's status byte was not one of the documented values.
    #[error("unknown response status byte: {0:#04x}")]
    UnknownStatus(u8),
}

/// Convenience alias for results returned by this crate.
pub type Result<T> = std::result::Result<T, ProtocolError>;
