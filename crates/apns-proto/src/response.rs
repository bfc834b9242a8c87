//! Decoding of the inbound 6-byte error response frame.
//!
//! Wire layout (big-endian, spec §3):
//!
//! ```text
//! offset size field
//! 0      1    command = 0x08
//! 1      1    status
//! 2      4    identifier
//! ```

use crate::{COMMAND_RESPONSE, ProtocolError, RESPONSE_FRAME_LENGTH, Result};

/// Gateway-reported status for a rejected (or, rarely, accepted) notification.
///
/// Mapping is fixed by the protocol (spec §4.1); any status byte not listed
/// here is a decode error, not a new variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    /// 0 — accepted.
    Success,
    /// 1 — gateway-side processing error.
    ProcessingError,
    /// 2 — missing device token.
    MissingDeviceToken,
    /// 3 — missing topic.
    MissingTopic,
    /// 4 — missing payload.
    MissingPayload,
    /// 5 — invalid token size.
    InvalidTokenSize,
    /// 6 — invalid topic size.
    InvalidTopicSize,
    /// 7 — invalid payload size.
    InvalidPayloadSize,
    /// 8 — invalid token.
    InvalidToken,
    /// 255 — unknown error, no specific reason given.
    Unknown,
}

impl ResponseStatus {
    const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Success),
            1 => Some(Self::ProcessingError),
            2 => Some(Self::MissingDeviceToken),
            3 => Some(Self::MissingTopic),
            4 => Some(Self::MissingPayload),
            5 => Some(Self::InvalidTokenSize),
            6 => Some(Self::InvalidTopicSize),
            7 => Some(Self::InvalidPayloadSize),
            8 => Some(Self::InvalidToken),
            255 => Some(Self::Unknown),
            _ => None,
        }
    }
}

/// Decode a 6-byte error response frame.
///
/// Returns the decoded status and the identifier it correlates to (the value
/// originally passed to [`crate::encode_notification`]).
///
/// # Errors
///
/// - [`ProtocolError::FrameTooShort`] if `frame.len() < 6`.
/// - [`ProtocolError::UnexpectedCommand`] if the first byte is not
///   [`COMMAND_RESPONSE`]. Per spec §3, a caller encountering this should log
///   and discard the remaining buffer rather than treat it as a response.
/// - [`ProtocolError::UnknownStatus`] if the status byte is not one of the
///   documented values.
pub fn decode_response(frame: &[u8]) -> Result<(ResponseStatus, u32)> {
    if frame.len() < RESPONSE_FRAME_LENGTH {
        return Err(ProtocolError::FrameTooShort {
            expected: RESPONSE_FRAME_LENGTH,
            actual: frame.len(),
        });
    }

    if frame[0] != COMMAND_RESPONSE {
        return Err(ProtocolError::UnexpectedCommand(frame[0]));
    }

    let status =
        ResponseStatus::from_byte(frame[1]).ok_or(ProtocolError::UnknownStatus(frame[1]))?;
    let identifier = u32::from_be_bytes(frame[2..6].try_into().expect("slice is 4 bytes"));

    Ok((status, identifier))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn encode_for_test(status_byte: u8, identifier: u32) -> [u8; RESPONSE_FRAME_LENGTH] {
        let mut frame = [0u8; RESPONSE_FRAME_LENGTH];
        frame[0] = COMMAND_RESPONSE;
        frame[1] = status_byte;
        frame[2..6].copy_from_slice(&identifier.to_be_bytes());
        frame
    }

    #[test]
    fn matches_spec_scenario_s2() {
        let frame = [0x08, 0x08, 0x0A, 0x0B, 0x0C, 0x0D];
        let (status, identifier) = decode_response(&frame).unwrap();
        assert_eq!(status, ResponseStatus::InvalidToken);
        assert_eq!(identifier, 0x0A0B_0C0D);
    }

    #[test]
    fn rejects_short_frame() {
        let result = decode_response(&[0x08, 0x08, 0x00]);
        assert!(matches!(result, Err(ProtocolError::FrameTooShort { .. })));
    }

    #[test]
    fn rejects_wrong_command() {
        let frame = encode_for_test(0, 0);
        let mut bad = frame;
        bad[0] = 0x02;
        let result = decode_response(&bad);
        assert!(matches!(result, Err(ProtocolError::UnexpectedCommand(0x02))));
    }

    #[test]
    fn rejects_unknown_status() {
        let frame = encode_for_test(9, 0);
        let result = decode_response(&frame);
        assert!(matches!(result, Err(ProtocolError::UnknownStatus(9))));
    }

    proptest! {
        #[test]
        fn decodes_all_documented_statuses(
            status_byte in prop::sample::select(vec![0u8, 1, 2, 3, 4, 5, 6, 7, 8, 255]),
            identifier in any::<u32>(),
        ) {
            let frame = encode_for_test(status_byte, identifier);
            let (_status, decoded_identifier) = decode_response(&frame).unwrap();
            prop_assert_eq!(decoded_identifier, identifier);
        }

        #[test]
        fn rejects_any_other_status(status_byte in any::<u8>(), identifier in any::<u32>()) {
            let documented = [0u8, 1, 2, 3, 4, 5, 6, 7, 8, 255];
            prop_assume!(!documented.contains(&status_byte));

            let frame = encode_for_test(status_byte, identifier);
            let result = decode_response(&frame);
            prop_assert!(matches!(result, Err(ProtocolError::UnknownStatus(_))));
        }
    }
}
