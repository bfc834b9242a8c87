//! Feedback session accumulator.
//!
//! Wraps [`apns_proto::FeedbackParser`] with the token → earliest-timestamp
//! deduplication the feedback drain requires (spec §4.4). This type only
//! accumulates; the actual read loop against a live
//! [`apns_transport::TlsSession`] lives in the dispatch worker, which feeds it
//! chunks as they arrive and calls [`FeedbackSession::finish`] once the peer
//! closes.

use std::collections::HashMap;

use apns_proto::{DeviceToken, FeedbackParser};

/// Accumulates feedback records into a deduplicated token → timestamp
/// mapping.
///
/// Single-use: construct one per drain, feed it every chunk read from the
/// feedback socket in order, then call [`Self::finish`].
#[derive(Debug, Default)]
pub struct FeedbackSession {
    parser: FeedbackParser,
    unreachable: HashMap<DeviceToken, u32>,
}

impl FeedbackSession {
    /// Start a new, empty drain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next chunk read from the feedback socket.
    ///
    /// Any record completed by this chunk is folded into the mapping; if a
    /// token reappears, the earlier of the two timestamps is kept (spec
    /// §4.4: "ties broken by order of arrival", which the `or_insert`-style
    /// comparison below satisfies since the first occurrence already present
    /// is by construction the earliest seen so far).
    pub fn ingest(&mut self, chunk: &[u8]) {
        for record in self.parser.push(chunk) {
            self.unreachable
                .entry(record.token)
                .and_modify(|existing| *existing = (*existing).min(record.timestamp))
                .or_insert(record.timestamp);
        }
    }

    /// Number of bytes buffered waiting for the rest of a partial record.
    #[must_use]
    pub fn pending_bytes(&self) -> usize {
        self.parser.pending_bytes()
    }

    /// Consume the session, returning the accumulated mapping.
    ///
    /// Any bytes still pending (an incomplete trailing record) are dropped;
    /// the caller is expected to have logged [`Self::pending_bytes`] before
    /// calling this, per spec §4.4: "trailing unparsed bytes at close are
    /// logged but do not fail the operation".
    #[must_use]
    pub fn finish(self) -> HashMap<DeviceToken, u32> {
        self.unreachable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(timestamp: u32, fill: u8) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(38);
        bytes.extend_from_slice(&timestamp.to_be_bytes());
        bytes.extend_from_slice(&32u16.to_be_bytes());
        bytes.extend_from_slice(&[fill; 32]);
        bytes
    }

    #[test]
    fn duplicate_token_keeps_earliest_timestamp() {
        let mut session = FeedbackSession::new();
        session.ingest(&record(1_600_000_100, 0xAA));
        session.ingest(&record(1_600_000_000, 0xAA));

        let mapping = session.finish();
        assert_eq!(mapping.len(), 1);
        let token = DeviceToken::new([0xAA; 32]);
        assert_eq!(mapping[&token], 1_600_000_000);
    }

    #[test]
    fn distinct_tokens_both_kept() {
        let mut session = FeedbackSession::new();
        session.ingest(&record(1_600_000_000, 0xAA));
        session.ingest(&record(1_600_000_001, 0xBB));

        let mapping = session.finish();
        assert_eq!(mapping.len(), 2);
    }

    #[test]
    fn trailing_partial_record_is_dropped_silently() {
        let mut session = FeedbackSession::new();
        let full = record(1_600_000_000, 0xAA);
        session.ingest(&full);
        session.ingest(&full[..10]);

        assert_eq!(session.pending_bytes(), 10);
        let mapping = session.finish();
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn split_across_chunks_still_dedups() {
        let mut session = FeedbackSession::new();
        let full = record(1_600_000_050, 0xCC);
        session.ingest(&full[..4]);
        session.ingest(&full[4..20]);
        session.ingest(&full[20..]);
        session.ingest(&record(1_600_000_000, 0xCC));

        let mapping = session.finish();
        let token = DeviceToken::new([0xCC; 32]);
        assert_eq!(mapping[&token], 1_600_000_000);
    }
}
