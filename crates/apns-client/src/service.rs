//! The public service façade (spec §4.5).

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, Ordering};

use apns_core::{Clock, SystemClock};
use apns_proto::DeviceToken;
use apns_transport::{ClientIdentity, EndpointSet, PushTransport, TokioTlsTransport, TransportError, TrustAnchors};
use tokio::task::JoinHandle;

use crate::config::{ServiceConfig, UnreachableObserver};
use crate::error::ClientError;
use crate::queue::{DispatchQueue, WorkerQueue};
use crate::worker::{ConfigSlot, SharedConfig};

fn build_transport(config: &ServiceConfig) -> Result<Arc<dyn PushTransport>, TransportError> {
    let transport = TokioTlsTransport::new(
        config.identity.clone(),
        config.trust_anchors.clone(),
        config.endpoints.server_name.clone(),
    )?;
    Ok(Arc::new(transport))
}

struct RunningWorker {
    join: JoinHandle<WorkerQueue>,
}

/// The public façade: a single background dispatch worker plus a feedback
/// drain operation, both operating over one shared, replaceable
/// configuration (spec §4.5).
///
/// Generic over [`Clock`] so tests can substitute a fake clock; production
/// code uses the default [`SystemClock`].
pub struct ApnsService<C: Clock = SystemClock> {
    clock: C,
    config: SharedConfig,
    producer: StdMutex<Option<DispatchQueue>>,
    worker: StdMutex<Option<RunningWorker>>,
    feedback_in_progress: AtomicBool,
}

impl ApnsService<SystemClock> {
    /// Build a service against `config`, using the real system clock.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if `config`'s identity or trust
    /// anchors are rejected while building the underlying TLS transport.
    pub fn new(config: ServiceConfig) -> Result<Self, ClientError> {
        Self::with_clock(SystemClock, config)
    }
}

impl<C: Clock> ApnsService<C> {
    /// Build a service against `config`, using `clock` as the source of time
    /// for idle-timeout tracking.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if `config`'s identity or trust
    /// anchors are rejected while building the underlying TLS transport.
    pub fn with_clock(clock: C, config: ServiceConfig) -> Result<Self, ClientError> {
        let transport = build_transport(&config)?;
        Ok(Self {
            clock,
            config: Arc::new(StdMutex::new(ConfigSlot::new(config, transport))),
            producer: StdMutex::new(None),
            worker: StdMutex::new(None),
            feedback_in_progress: AtomicBool::new(false),
        })
    }

    /// Whether the dispatch worker is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker.lock().unwrap_or_else(std::sync::PoisonError::into_inner).is_some()
    }

    /// Approximate number of frames currently queued for dispatch.
    ///
    /// `0` whether the service is stopped or genuinely idle; use
    /// [`Self::is_running`] to distinguish the two.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.producer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .as_ref()
            .map_or(0, DispatchQueue::len)
    }

    /// Start the dispatch worker.
    ///
    /// Idempotent only in the sense that calling it while already running
    /// replaces the old producer and worker handles with fresh ones,
    /// abandoning (not stopping) the previous worker — callers should
    /// `stop` before `start`ing again.
    pub fn start(&self) {
        let capacity = {
            let guard = self.config.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            guard.config.queue_capacity
        };
        let (producer, worker_queue) = DispatchQueue::new(capacity);
        let join = tokio::spawn(crate::worker::run(self.clock.clone(), self.config.clone(), worker_queue));

        *self.producer.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(producer);
        *self.worker.lock().unwrap_or_else(std::sync::PoisonError::into_inner) =
            Some(RunningWorker { join });
    }

    /// Stop the dispatch worker gracefully.
    ///
    /// Drops the producer handle, which closes the dispatch channel; the
    /// worker finishes sending whatever was already buffered and exits on
    /// its own (spec §4.6: "stop is graceful"). Returns once the worker task
    /// has exited.
    pub async fn stop(&self) {
        let producer = self.producer.lock().unwrap_or_else(std::sync::PoisonError::into_inner).take();
        drop(producer);

        let running = self.worker.lock().unwrap_or_else(std::sync::PoisonError::into_inner).take();
        if let Some(running) = running {
            let _ = running.join.await;
        }
    }

    /// Encode and enqueue a notification for `token`.
    ///
    /// Returns the 32-bit identifier assigned to the frame, which the
    /// configured [`crate::config::ResponseObserver`] will later report
    /// against if the gateway sends an error response for it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidInput`] if `payload` exceeds the
    /// configured maximum size or otherwise fails to encode, or
    /// [`ClientError::NotRunning`] if `start` has not been called, or
    /// [`ClientError::QueueFull`] if the dispatch queue is at capacity.
    pub fn enqueue(
        &self,
        token: DeviceToken,
        payload: &[u8],
        expiry: u32,
    ) -> Result<u32, ClientError> {
        let (max_payload_size, identifier) = {
            let guard = self.config.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            (guard.config.max_payload_size, guard.config.identifier_supplier.next_identifier())
        };

        if payload.len() > max_payload_size {
            return Err(ClientError::InvalidInput(apns_proto::ProtocolError::PayloadTooLarge {
                size: payload.len(),
                max: max_payload_size,
            }));
        }

        let frame = apns_proto::encode_notification(&token, payload, expiry, identifier)?;

        let guard = self.producer.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let producer = guard.as_ref().ok_or(ClientError::NotRunning)?;
        producer.try_enqueue(frame).map_err(|_| ClientError::QueueFull)?;
        Ok(identifier)
    }

    /// Drain the feedback service once, delivering the resulting token →
    /// earliest-unreachability-timestamp mapping to `observer`.
    ///
    /// Runs independently of the dispatch worker's push session; only one
    /// drain may be in flight at a time.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::AlreadyPolling`] if a drain is already running,
    /// or [`ClientError::Transport`] if the feedback connection fails.
    pub async fn fetch_unreachable(
        &self,
        observer: Arc<dyn UnreachableObserver>,
    ) -> Result<(), ClientError> {
        if self.feedback_in_progress.compare_exchange(
            false,
            true,
            Ordering::AcqRel,
            Ordering::Acquire,
        ).is_err()
        {
            return Err(ClientError::AlreadyPolling);
        }

        let (transport, endpoint) = {
            let guard = self.config.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            (guard.transport.clone(), guard.config.endpoints.feedback.clone())
        };

        let result = crate::feedback::drain(transport.as_ref(), &endpoint).await;
        self.feedback_in_progress.store(false, Ordering::Release);

        let unreachable: HashMap<DeviceToken, u32> = result?;
        tokio::spawn(async move {
            observer.on_unreachable(unreachable);
        });
        Ok(())
    }

    /// Replace the identity, trust anchors, and endpoints in effect, leaving
    /// every other tuning option (timeouts, queue capacity, identifier
    /// supplier, response observer) untouched (spec §4.5: `configure`).
    ///
    /// The running dispatch worker picks up the new configuration the next
    /// time it needs to open a connection; an already-open push session is
    /// closed and reopened rather than reused across the change.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the new identity or trust
    /// anchors are rejected while building the replacement transport.
    pub fn configure(
        &self,
        identity: ClientIdentity,
        trust_anchors: TrustAnchors,
        endpoints: EndpointSet,
    ) -> Result<(), ClientError> {
        let mut guard = self.config.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        let mut next = guard.config.clone();
        next.identity = identity;
        next.trust_anchors = trust_anchors;
        next.endpoints = endpoints;
        let transport = build_transport(&next)?;

        guard.config = next;
        guard.transport = transport;
        guard.generation += 1;
        Ok(())
    }

    /// Install (or replace) the response observer.
    pub fn set_response_observer(&self, observer: Arc<dyn crate::config::ResponseObserver>) {
        let mut guard = self.config.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.config.response_observer = Some(observer);
    }

    /// Remove the response observer, if one is installed.
    pub fn clear_response_observer(&self) {
        let mut guard = self.config.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.config.response_observer = None;
    }
}
