//! The 32-byte device token identifying a push-notification recipient.

use std::fmt;

use crate::{ProtocolError, Result, TOKEN_LENGTH};

/// Opaque 32-byte device token.
///
/// Constructed from either raw bytes ([`DeviceToken::from_bytes`]) or a
/// 64-character hex string ([`DeviceToken::from_hex`], case-insensitive).
/// Equality and hashing are by byte content (spec §3).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceToken([u8; TOKEN_LENGTH]);

impl DeviceToken {
    /// Construct from exactly 32 raw bytes.
    #[must_use]
    pub const fn new(bytes: [u8; TOKEN_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Construct from a byte slice, failing if it is not exactly 32 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidTokenLength`] if `bytes.len() != 32`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let array: [u8; TOKEN_LENGTH] = bytes
            .try_into()
            .map_err(|_| ProtocolError::InvalidTokenLength { actual: bytes.len() })?;
        Ok(Self(array))
    }

    /// Construct from a 64-character hex string (upper- or lowercase).
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidHexToken`] if the string is not
    /// exactly 64 characters or contains a non-hex-digit character.
    pub fn from_hex(hex: &str) -> Result<Self> {
        if hex.len() != TOKEN_LENGTH * 2 {
            return Err(ProtocolError::InvalidHexToken {
                reason: format!("expected 64 hex characters, got {}", hex.len()),
            });
        }
        if !hex.is_ascii() {
            return Err(ProtocolError::InvalidHexToken {
                reason: "expected 64 ASCII hex characters, got a multi-byte character".to_string(),
            });
        }

        let digits = hex.as_bytes();
        let mut bytes = [0u8; TOKEN_LENGTH];
        for (i, chunk) in bytes.iter_mut().enumerate() {
            let pair = &digits[i * 2..i * 2 + 2];
            // `hex` was verified ASCII above, so any byte-aligned window is valid UTF-8.
            let pair_str = std::str::from_utf8(pair).expect("ascii string slice is valid utf-8");
            *chunk = u8::from_str_radix(pair_str, 16).map_err(|_| ProtocolError::InvalidHexToken {
                reason: format!("non-hex digit pair {pair_str:?} at byte {i}"),
            })?;
        }

        Ok(Self(bytes))
    }

    /// Raw 32 bytes of the token.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; TOKEN_LENGTH] {
        &self.0
    }

    /// Lowercase hex encoding of the token.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl TryFrom<&[u8]> for DeviceToken {
    type Error = ProtocolError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes(bytes)
    }
}

impl From<[u8; TOKEN_LENGTH]> for DeviceToken {
    fn from(bytes: [u8; TOKEN_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl std::str::FromStr for DeviceToken {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Display for DeviceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for DeviceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DeviceToken").field(&self.to_hex()).finish()
    }
}
