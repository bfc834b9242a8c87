//! Scenario S3 (feedback streaming across odd chunk boundaries) and
//! property 7 ("at most one polling feedback session") from spec §8.

mod common;

use std::sync::Arc;
use std::time::Duration;

use apns_client::{ApnsService, ClientError, DeviceToken};
use apns_harness::{FakeFeedbackServer, FakePushServer, TestCertificates};

fn feedback_record(timestamp: u32, fill: u8) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(38);
    bytes.extend_from_slice(&timestamp.to_be_bytes());
    bytes.extend_from_slice(&32u16.to_be_bytes());
    bytes.extend_from_slice(&[fill; 32]);
    bytes
}

/// Splits `stream` into chunks of the given sizes (which must sum to its
/// length) to drive the four-chunk split from scenario S3.
fn split_into(stream: &[u8], sizes: &[usize]) -> Vec<Vec<u8>> {
    assert_eq!(sizes.iter().sum::<usize>(), stream.len());
    let mut chunks = Vec::new();
    let mut offset = 0;
    for size in sizes {
        chunks.push(stream[offset..offset + size].to_vec());
        offset += size;
    }
    chunks
}

#[tokio::test]
async fn s3_feedback_drain_yields_two_entries_across_four_chunks() {
    let certs = TestCertificates::generate();
    let push = FakePushServer::bind(&certs).await.expect("bind fake push server");
    let feedback = FakeFeedbackServer::bind(&certs).await.expect("bind fake feedback server");

    let config = common::config_for(&certs, &push, &feedback);
    let service = ApnsService::new(config).expect("build service");
    service.start();

    let mut stream = feedback_record(1_600_000_000, 0xAA);
    stream.extend(feedback_record(1_600_000_001, 0xBB));
    let chunks = split_into(&stream, &[5, 1, 37, 33]);

    let (observer, mut received) = common::RecordingUnreachableObserver::new();
    let serve = tokio::spawn(async move { feedback.serve_once(&chunks).await });

    service.fetch_unreachable(observer).await.expect("fetch_unreachable");
    serve.await.expect("server task join").expect("server task io");

    let mapping = tokio::time::timeout(Duration::from_secs(2), received.recv())
        .await
        .expect("observer fired within timeout")
        .expect("channel not closed");

    assert_eq!(mapping.len(), 2);
    assert_eq!(mapping[&DeviceToken::new([0xAA; 32])], 1_600_000_000);
    assert_eq!(mapping[&DeviceToken::new([0xBB; 32])], 1_600_000_001);

    service.stop().await;
}

#[tokio::test]
async fn property_7_only_one_feedback_drain_at_a_time() {
    let certs = TestCertificates::generate();
    let push = FakePushServer::bind(&certs).await.expect("bind fake push server");
    let feedback = FakeFeedbackServer::bind(&certs).await.expect("bind fake feedback server");

    let config = common::config_for(&certs, &push, &feedback);
    let service = Arc::new(ApnsService::new(config).expect("build service"));
    service.start();

    // No server-side `accept` is ever issued for this TCP listener, so the
    // first drain's TLS handshake blocks forever after its TCP connect
    // succeeds -- long enough to deterministically observe the second
    // call's contention without racing real I/O completion.
    let (observer1, _rx1) = common::RecordingUnreachableObserver::new();
    let blocked_service = service.clone();
    let blocked = tokio::spawn(async move { blocked_service.fetch_unreachable(observer1).await });

    tokio::task::yield_now().await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    let (observer2, _rx2) = common::RecordingUnreachableObserver::new();
    let result = service.fetch_unreachable(observer2).await;
    assert!(matches!(result, Err(ClientError::AlreadyPolling)));

    blocked.abort();
    service.stop().await;
}
