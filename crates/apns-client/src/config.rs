//! Service configuration (spec §6 `Configuration options`).

use std::sync::Arc;
use std::time::Duration;

use apns_proto::{DeviceToken, ResponseStatus};
use apns_transport::{ClientIdentity, EndpointSet, TrustAnchors};

use crate::identifier::{IdentifierSupplier, RandomIdentifierSupplier};

/// Default upper bound on payload byte length at enqueue time.
pub const DEFAULT_MAX_PAYLOAD_SIZE: usize = 256;

/// Default interval of no new frames after which the worker closes the push
/// session.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Default bounded capacity of the dispatch queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

/// Invoked on every decoded error response from the push gateway.
///
/// Runs off the dispatch worker's task (spec §5: "observer invocation cannot
/// block the worker"). Implementations that panic are isolated to their own
/// spawned task and only logged; they do not crash the worker.
pub trait ResponseObserver: Send + Sync {
    /// Handle one decoded response frame.
    fn on_response(&self, status: ResponseStatus, identifier: u32);
}

/// Invoked once per `fetch_unreachable` call with the collected mapping.
pub trait UnreachableObserver: Send + Sync {
    /// Handle the accumulated token → earliest-unreachability-timestamp
    /// mapping.
    fn on_unreachable(&self, unreachable: std::collections::HashMap<DeviceToken, u32>);
}

/// Identity, trust, and endpoint material plus the tunable options in spec
/// §6's configuration table.
///
/// Replaced wholesale via [`crate::ApnsService::configure`]; never mutated in
/// place, so a reader holding a clone of the old value always sees a
/// consistent snapshot (spec §9: "session replacement races").
#[derive(Clone)]
pub struct ServiceConfig {
    /// Client TLS identity presented to both endpoints.
    pub identity: ClientIdentity,
    /// Trust anchors used to verify the gateway's server certificate.
    pub trust_anchors: TrustAnchors,
    /// Push and feedback endpoints plus TLS server name.
    pub endpoints: EndpointSet,
    /// Upper bound on payload byte length at enqueue time.
    pub max_payload_size: usize,
    /// Idle interval after which the push session is proactively closed.
    pub idle_timeout: Duration,
    /// Bounded capacity of the dispatch queue.
    pub queue_capacity: usize,
    /// Strategy for generating the 32-bit identifier at enqueue time.
    pub identifier_supplier: Arc<dyn IdentifierSupplier>,
    /// Observer invoked on every decoded error response, if any.
    pub response_observer: Option<Arc<dyn ResponseObserver>>,
}

impl ServiceConfig {
    /// Build a configuration with spec-default options against `endpoints`,
    /// using the given identity and trust anchors.
    ///
    /// `response_observer` starts unset; use
    /// [`crate::ApnsService::set_response_observer`] to install one.
    #[must_use]
    pub fn new(identity: ClientIdentity, trust_anchors: TrustAnchors, endpoints: EndpointSet) -> Self {
        Self {
            identity,
            trust_anchors,
            endpoints,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            identifier_supplier: Arc::new(RandomIdentifierSupplier),
            response_observer: None,
        }
    }

    /// Override the maximum payload size (escape hatch; spec §3 warns
    /// against raising this without understanding gateway-side limits).
    #[must_use]
    pub fn with_max_payload_size(mut self, max_payload_size: usize) -> Self {
        self.max_payload_size = max_payload_size;
        self
    }

    /// Override the idle timeout.
    #[must_use]
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Override the dispatch queue capacity.
    #[must_use]
    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    /// Override the identifier supplier.
    #[must_use]
    pub fn with_identifier_supplier(mut self, supplier: Arc<dyn IdentifierSupplier>) -> Self {
        self.identifier_supplier = supplier;
        self
    }
}
