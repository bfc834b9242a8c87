//! Shared fixtures for `apns-client`'s end-to-end scenario tests (spec §8).

#![allow(dead_code)] // not every test file uses every helper

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use apns_client::{
    ClientIdentity, DeviceToken, EndpointSet, ResponseObserver, ResponseStatus, ServiceConfig,
    TrustAnchors, UnreachableObserver,
};
use apns_harness::{FakeFeedbackServer, FakePushServer, TestCertificates};
use tokio::sync::mpsc;

/// Builds a [`ServiceConfig`] pointed at the given fake servers' local
/// ports, trusting `certs`' CA and presenting `certs`' client leaf.
pub fn config_for(
    certs: &TestCertificates,
    push: &FakePushServer,
    feedback: &FakeFeedbackServer,
) -> ServiceConfig {
    let identity: ClientIdentity = certs.client_identity();
    let trust: TrustAnchors = certs.client_trust_anchors();
    let endpoints = EndpointSet {
        push: apns_client::Endpoint::new("127.0.0.1", push.local_addr().port()),
        feedback: apns_client::Endpoint::new("127.0.0.1", feedback.local_addr().port()),
        server_name: "localhost".to_string(),
    };
    ServiceConfig::new(identity, trust, endpoints)
}

/// An [`apns_client::IdentifierSupplier`] that always returns the same
/// fixed value, matching scenario S1's "identifier supplier returns
/// 0x0A0B0C0D".
#[derive(Debug)]
pub struct FixedIdentifierSupplier(pub u32);

impl apns_client::IdentifierSupplier for FixedIdentifierSupplier {
    fn next_identifier(&self) -> u32 {
        self.0
    }
}

/// Identifier supplier returning successive values from a fixed list, then
/// repeating the last one. Useful for scenarios that enqueue more than one
/// frame and want predictable, distinct identifiers.
#[derive(Debug)]
pub struct SequenceIdentifierSupplier {
    next: AtomicU32,
}

impl SequenceIdentifierSupplier {
    #[must_use]
    pub fn starting_at(seed: u32) -> Self {
        Self { next: AtomicU32::new(seed) }
    }
}

impl apns_client::IdentifierSupplier for SequenceIdentifierSupplier {
    fn next_identifier(&self) -> u32 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Records every decoded response, forwarding it over a channel so a test
/// can `recv().await` it from the task that installed the observer.
pub struct RecordingResponseObserver {
    tx: mpsc::UnboundedSender<(ResponseStatus, u32)>,
}

impl RecordingResponseObserver {
    #[must_use]
    pub fn new() -> (std::sync::Arc<Self>, mpsc::UnboundedReceiver<(ResponseStatus, u32)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (std::sync::Arc::new(Self { tx }), rx)
    }
}

impl ResponseObserver for RecordingResponseObserver {
    fn on_response(&self, status: ResponseStatus, identifier: u32) {
        let _ = self.tx.send((status, identifier));
    }
}

/// Records the mapping delivered to `fetch_unreachable`'s observer.
pub struct RecordingUnreachableObserver {
    tx: mpsc::UnboundedSender<HashMap<DeviceToken, u32>>,
}

impl RecordingUnreachableObserver {
    #[must_use]
    pub fn new() -> (std::sync::Arc<Self>, mpsc::UnboundedReceiver<HashMap<DeviceToken, u32>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (std::sync::Arc::new(Self { tx }), rx)
    }
}

impl UnreachableObserver for RecordingUnreachableObserver {
    fn on_unreachable(&self, unreachable: HashMap<DeviceToken, u32>) {
        let _ = self.tx.send(unreachable);
    }
}

/// An observer that, on its first invocation, runs a caller-supplied
/// closure (used by the "observer invocation off the worker" property to
/// enqueue a second frame from inside the callback).
pub struct OnceResponseObserver<F: Fn(ResponseStatus, u32) + Send + Sync> {
    ran: Mutex<bool>,
    action: F,
}

impl<F: Fn(ResponseStatus, u32) + Send + Sync> OnceResponseObserver<F> {
    pub fn new(action: F) -> Self {
        Self { ran: Mutex::new(false), action }
    }
}

impl<F: Fn(ResponseStatus, u32) + Send + Sync> ResponseObserver for OnceResponseObserver<F> {
    fn on_response(&self, status: ResponseStatus, identifier: u32) {
        let mut ran = self.ran.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if *ran {
            return;
        }
        *ran = true;
        drop(ran);
        (self.action)(status, identifier);
    }
}
