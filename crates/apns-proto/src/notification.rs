//! Encoding of the outbound notification frame.
//!
//! Wire layout (big-endian, spec §3):
//!
//! ```text
//! offset size field
//! 0      1    command = 0x01
//! 1      4    identifier
//! 5      4    expiry (unix seconds)
//! 9      2    token_length = 32
//! 11     32   token bytes
//! 43     2    payload_length
//! 45     N    payload bytes
//! ```

use crate::{COMMAND_NOTIFICATION, DeviceToken, MAX_FRAME_PAYLOAD_SIZE, ProtocolError, Result};

/// Encode a single notification frame.
///
/// # Errors
///
/// Returns [`ProtocolError::PayloadTooLarge`] if `payload.len()` exceeds
/// [`MAX_FRAME_PAYLOAD_SIZE`] (the wire format's 16-bit length field cannot
/// represent anything larger; callers additionally enforce the configured
/// `max_payload_size` before this point, see spec §4.1).
pub fn encode_notification(
    token: &DeviceToken,
    payload: &[u8],
    expiry_unix_seconds: u32,
    identifier: u32,
) -> Result<Vec<u8>> {
    if payload.len() > MAX_FRAME_PAYLOAD_SIZE {
        return Err(ProtocolError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_FRAME_PAYLOAD_SIZE,
        });
    }

    #[allow(clippy::cast_possible_truncation)] // bounded by the check above
    let payload_len = payload.len() as u16;

    let mut frame = Vec::with_capacity(1 + 4 + 4 + 2 + token.as_bytes().len() + 2 + payload.len());
    frame.push(COMMAND_NOTIFICATION);
    frame.extend_from_slice(&identifier.to_be_bytes());
    frame.extend_from_slice(&expiry_unix_seconds.to_be_bytes());
    #[allow(clippy::cast_possible_truncation)] // TOKEN_LENGTH is 32, fits u16
    frame.extend_from_slice(&(token.as_bytes().len() as u16).to_be_bytes());
    frame.extend_from_slice(token.as_bytes());
    frame.extend_from_slice(&payload_len.to_be_bytes());
    frame.extend_from_slice(payload);

    Ok(frame)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn matches_spec_scenario_s1() {
        let token = DeviceToken::new([0x11; 32]);
        let payload = br#"{"aps":{"alert":"hi"}}"#;
        assert_eq!(payload.len(), 22);

        let frame =
            encode_notification(&token, payload, 2_000_000_000, 0x0A0B_0C0D).unwrap();

        let mut expected = vec![0x01, 0x0A, 0x0B, 0x0C, 0x0D, 0x77, 0x35, 0x94, 0x00, 0x00, 0x20];
        expected.extend_from_slice(&[0x11; 32]);
        expected.extend_from_slice(&[0x00, 0x16]);
        expected.extend_from_slice(payload);

        assert_eq!(frame, expected);
    }

    #[test]
    fn rejects_oversized_payload() {
        let token = DeviceToken::new([0; 32]);
        let payload = vec![0u8; MAX_FRAME_PAYLOAD_SIZE + 1];
        let result = encode_notification(&token, &payload, 0, 0);
        assert!(matches!(result, Err(ProtocolError::PayloadTooLarge { .. })));
    }

    fn decode_fields(frame: &[u8]) -> ([u8; 32], Vec<u8>, u32, u32) {
        assert_eq!(frame[0], COMMAND_NOTIFICATION);
        let identifier = u32::from_be_bytes(frame[1..5].try_into().unwrap());
        let expiry = u32::from_be_bytes(frame[5..9].try_into().unwrap());
        let token_len = u16::from_be_bytes(frame[9..11].try_into().unwrap());
        assert_eq!(token_len, 32);
        let token: [u8; 32] = frame[11..43].try_into().unwrap();
        let payload_len = u16::from_be_bytes(frame[43..45].try_into().unwrap()) as usize;
        let payload = frame[45..45 + payload_len].to_vec();
        assert_eq!(frame.len(), 45 + payload_len);
        (token, payload, expiry, identifier)
    }

    proptest! {
        #[test]
        fn round_trip(
            token_bytes in prop::array::uniform32(any::<u8>()),
            payload in prop::collection::vec(any::<u8>(), 0..=256),
            expiry in any::<u32>(),
            identifier in any::<u32>(),
        ) {
            let token = DeviceToken::new(token_bytes);
            let frame = encode_notification(&token, &payload, expiry, identifier).unwrap();

            let (decoded_token, decoded_payload, decoded_expiry, decoded_identifier) =
                decode_fields(&frame);

            prop_assert_eq!(decoded_token, token_bytes);
            prop_assert_eq!(decoded_payload, payload);
            prop_assert_eq!(decoded_expiry, expiry);
            prop_assert_eq!(decoded_identifier, identifier);
        }
    }
}
