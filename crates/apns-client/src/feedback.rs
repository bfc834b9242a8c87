//! One-shot feedback drain (spec §4.4).

use std::collections::HashMap;

use apns_core::FeedbackSession;
use apns_proto::DeviceToken;
use apns_transport::{Endpoint, PushTransport, TransportError};

const READ_CHUNK_SIZE: usize = 4096;

/// Connect to the feedback endpoint, read until the peer closes, and return
/// the accumulated token → earliest-unreachability-timestamp mapping.
///
/// The feedback service only ever sends data and then closes (spec §4.4); a
/// trailing partial record at close is logged and discarded rather than
/// treated as an error.
pub async fn drain(
    transport: &dyn PushTransport,
    endpoint: &Endpoint,
) -> Result<HashMap<DeviceToken, u32>, TransportError> {
    let mut stream = transport.connect(endpoint).await?;
    let mut session = FeedbackSession::new();

    loop {
        match stream.read(READ_CHUNK_SIZE).await? {
            Some(chunk) => session.ingest(&chunk),
            None => break,
        }
    }

    if session.pending_bytes() > 0 {
        tracing::warn!(
            pending = session.pending_bytes(),
            "feedback stream closed with a trailing partial record"
        );
    }

    stream.close().await;
    Ok(session.finish())
}
