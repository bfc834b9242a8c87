//! Public façade for the legacy APNs binary-protocol client (spec §4.5).
//!
//! [`ApnsService`] is the crate's single entry point: construct it from a
//! [`ServiceConfig`], `start` it to spin up the dispatch worker, `enqueue`
//! notifications onto its bounded queue, and `fetch_unreachable` to drain the
//! feedback service. Everything else in this crate exists to support that
//! type.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

mod config;
mod error;
mod feedback;
mod identifier;
mod queue;
mod service;
mod worker;

pub use apns_core::SystemClock;
pub use apns_proto::{DeviceToken, ResponseStatus};
pub use apns_transport::{ClientIdentity, Endpoint, EndpointSet, TrustAnchors};

pub use config::{
    DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_PAYLOAD_SIZE, DEFAULT_QUEUE_CAPACITY, ResponseObserver,
    ServiceConfig, UnreachableObserver,
};
pub use error::ClientError;
pub use identifier::{IdentifierSupplier, MonotonicIdentifierSupplier, RandomIdentifierSupplier};
pub use service::ApnsService;
