//! Streaming parser for the feedback service's repeated 38-byte records.
//!
//! Wire layout per record (big-endian, spec §3):
//!
//! ```text
//! offset size field
//! 0      4    unix_seconds
//! 4      2    token_length = 32
//! 6      32   token bytes
//! ```

use crate::{DeviceToken, FEEDBACK_RECORD_LENGTH};

/// A single decoded feedback record: when the gateway first observed the
/// token as unreachable, and the token itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackRecord {
    /// Unix timestamp (seconds) at which the device was first reported
    /// unreachable.
    pub timestamp: u32,
    /// The device token the peer reports as unreachable.
    pub token: DeviceToken,
}

/// Stateful, restartable parser for the feedback byte stream.
///
/// Accepts arbitrary byte chunks via [`FeedbackParser::push`] and yields
/// zero or more [`FeedbackRecord`]s per call, retaining any trailing partial
/// record across calls. A full 38-byte record is always either consumed
/// whole or fully retained — no record is ever half-emitted (spec §4.1).
#[derive(Debug, Default)]
pub struct FeedbackParser {
    buffer: Vec<u8>,
}

impl FeedbackParser {
    /// Create a new, empty parser.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes, returning every complete record it completes.
    ///
    /// The token length field is not independently validated (it is fixed at
    /// 32 by the protocol); only the declared record length is consulted.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<FeedbackRecord> {
        self.buffer.extend_from_slice(chunk);

        let mut records = Vec::new();
        let mut consumed = 0;

        while self.buffer.len() - consumed >= FEEDBACK_RECORD_LENGTH {
            let record = &self.buffer[consumed..consumed + FEEDBACK_RECORD_LENGTH];

            let timestamp = u32::from_be_bytes(record[0..4].try_into().expect("4 bytes"));
            // record[4..6] is the 32-bit-fixed token_length field; the protocol
            // guarantees it is always 32, so it is not separately validated.
            let token = DeviceToken::new(record[6..38].try_into().expect("32 bytes"));

            records.push(FeedbackRecord { timestamp, token });
            consumed += FEEDBACK_RECORD_LENGTH;
        }

        self.buffer.drain(..consumed);
        records
    }

    /// Number of bytes currently buffered as a partial, not-yet-complete
    /// record. Non-zero only if the stream ended mid-record.
    #[must_use]
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn encode_record(timestamp: u32, token: [u8; 32]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(FEEDBACK_RECORD_LENGTH);
        bytes.extend_from_slice(&timestamp.to_be_bytes());
        bytes.extend_from_slice(&32u16.to_be_bytes());
        bytes.extend_from_slice(&token);
        bytes
    }

    #[test]
    fn matches_spec_scenario_s3() {
        let mut stream = encode_record(1_600_000_000, [0xAA; 32]);
        stream.extend(encode_record(1_600_000_001, [0xBB; 32]));

        let chunk_sizes = [5, 1, 37, 33];
        assert_eq!(chunk_sizes.iter().sum::<usize>(), stream.len());

        let mut parser = FeedbackParser::new();
        let mut records = Vec::new();
        let mut offset = 0;
        for size in chunk_sizes {
            records.extend(parser.push(&stream[offset..offset + size]));
            offset += size;
        }

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].timestamp, 1_600_000_000);
        assert_eq!(records[0].token.as_bytes(), &[0xAA; 32]);
        assert_eq!(records[1].timestamp, 1_600_000_001);
        assert_eq!(records[1].token.as_bytes(), &[0xBB; 32]);
        assert_eq!(parser.pending_bytes(), 0);
    }

    #[test]
    fn retains_trailing_partial_record() {
        let record = encode_record(1, [0x01; 32]);
        let mut parser = FeedbackParser::new();

        let emitted = parser.push(&record[..20]);
        assert!(emitted.is_empty());
        assert_eq!(parser.pending_bytes(), 20);

        let emitted = parser.push(&record[20..]);
        assert_eq!(emitted.len(), 1);
        assert_eq!(parser.pending_bytes(), 0);
    }

    proptest! {
        #[test]
        fn emits_exactly_n_records_across_arbitrary_chunk_boundaries(
            records in prop::collection::vec(
                (any::<u32>(), prop::array::uniform32(any::<u8>())),
                0..20,
            ),
            seed in any::<u8>(),
        ) {
            let mut stream = Vec::new();
            for (timestamp, token) in &records {
                stream.extend(encode_record(*timestamp, *token));
            }

            // Deterministic but varied chunk boundaries derived from `seed`.
            let mut parser = FeedbackParser::new();
            let mut emitted = Vec::new();
            let mut offset = 0;
            let mut step = usize::from(seed % 7) + 1;
            while offset < stream.len() {
                let end = (offset + step).min(stream.len());
                emitted.extend(parser.push(&stream[offset..end]));
                offset = end;
                step = step % 11 + 1;
            }

            prop_assert_eq!(emitted.len(), records.len());
            for ((expected_ts, expected_token), record) in records.iter().zip(emitted.iter()) {
                prop_assert_eq!(record.timestamp, *expected_ts);
                prop_assert_eq!(record.token.as_bytes(), expected_token);
            }
            prop_assert_eq!(parser.pending_bytes(), 0);
        }
    }
}
