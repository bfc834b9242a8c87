//! The single dispatch worker (spec §4.6).
//!
//! Owns the push session's write side exclusively. Drains the queue in a
//! loop: open the session lazily on the first frame, keep sending while more
//! frames arrive within the idle window, close on idle or on send failure,
//! requeue whatever was in flight when a send failed.
//!
//! While waiting for the next frame (or the idle timeout), the worker also
//! races a read against the live socket: the gateway may close the
//! connection and emit an error response at any point after a send, not only
//! in response to the next write (spec §4.3: "connected ──peer-close/
//! read-error──> draining" is reachable from any point while connected, not
//! only from a failed write).

use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use apns_core::{Clock, GatewayAction, GatewaySession, GatewayState};
use apns_proto::RESPONSE_FRAME_LENGTH;
use apns_transport::{Endpoint, PushTransport, TlsSession, TransportError};

use crate::config::{ResponseObserver, ServiceConfig};

/// How long the worker waits for the residual response bytes the spec §4.3
/// draining state expects after a write failure, before giving up and
/// treating the peer as having closed without sending anything.
const RESIDUAL_READ_TIMEOUT: Duration = Duration::from_millis(200);

/// A [`ServiceConfig`] and the transport built from its identity/trust
/// material, tagged with a generation counter.
///
/// Bumped by `configure` so the worker can tell a config snapshot it already
/// connected under is stale and must be torn down before reuse, even if it
/// otherwise still looks reachable (spec §9: "session replacement races").
pub struct ConfigSlot {
    /// Current configuration.
    pub config: ServiceConfig,
    /// Transport built from `config`'s identity, trust anchors, and server
    /// name; rebuilt whenever `configure` replaces them.
    pub transport: Arc<dyn PushTransport>,
    /// Incremented every time `config`/`transport` are replaced.
    pub generation: u64,
}

impl ConfigSlot {
    pub(crate) fn new(config: ServiceConfig, transport: Arc<dyn PushTransport>) -> Self {
        Self { config, transport, generation: 0 }
    }
}

/// Shared, mutex-guarded configuration slot (spec §5: "accessed under a
/// single mutex").
pub type SharedConfig = Arc<StdMutex<ConfigSlot>>;

struct Snapshot {
    config: ServiceConfig,
    transport: Arc<dyn PushTransport>,
    generation: u64,
}

fn snapshot(config: &SharedConfig) -> Snapshot {
    let guard = config.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    Snapshot {
        config: guard.config.clone(),
        transport: guard.transport.clone(),
        generation: guard.generation,
    }
}

/// Run the dispatch worker to completion.
///
/// Returns once `queue` is closed (every producer dropped) and both the
/// channel and the requeue list are drained — `ApnsService::stop` achieves
/// this by dropping its producer handle, which lets any frames already
/// buffered finish sending before the worker exits (spec §4.6: "stop is
/// graceful").
///
/// Returns the [`crate::queue::WorkerQueue`] so a caller can inspect whatever
/// was left (always empty on a clean exit).
pub async fn run<C: Clock>(
    clock: C,
    config: SharedConfig,
    mut queue: crate::queue::WorkerQueue,
) -> crate::queue::WorkerQueue {
    'outer: loop {
        let Some(mut current_frame) = queue.take().await else {
            break 'outer;
        };

        let mut session: GatewaySession<C::Instant> = GatewaySession::new();
        let mut tls: Option<TlsSession> = None;
        let mut connected_generation: Option<u64> = None;

        loop {
            let Snapshot { config: cfg, transport, generation } = snapshot(&config);

            if session.state() == GatewayState::Connected && connected_generation != Some(generation)
            {
                tracing::debug!("configuration changed; closing push session before reuse");
                close_session(&mut session, &mut tls).await;
            }

            if session.state() == GatewayState::Absent {
                match open_session(&mut session, transport.as_ref(), &cfg.endpoints.push, &clock)
                    .await
                {
                    Ok(stream) => {
                        tls = Some(stream);
                        connected_generation = Some(generation);
                    },
                    Err(error) => {
                        tracing::warn!(%error, "push session connect failed; requeuing frame");
                        queue.requeue(current_frame);
                        continue 'outer;
                    },
                }
            }

            let stream = tls.as_mut().expect("session is connected");
            match stream.write(&current_frame).await {
                Ok(()) => {
                    session
                        .on_write_success(clock.now())
                        .expect("write success only reported while connected");

                    tokio::select! {
                        biased;
                        next = queue.poll(cfg.idle_timeout) => {
                            match next {
                                Some(frame) => {
                                    current_frame = frame;
                                    continue;
                                },
                                None => {
                                    close_session(&mut session, &mut tls).await;
                                    continue 'outer;
                                },
                            }
                        },
                        peer = async {
                            tls.as_mut().expect("session is connected").read(RESPONSE_FRAME_LENGTH).await
                        } => {
                            tracing::debug!("peer activity observed while idle; draining");
                            handle_peer_activity(
                                &mut session,
                                &mut tls,
                                cfg.response_observer.clone(),
                                peer,
                            )
                            .await;
                            continue 'outer;
                        },
                    }
                },
                Err(error) => {
                    tracing::warn!(%error, "push frame write failed; requeuing and reconnecting");
                    queue.requeue(current_frame);
                    drain_after_failure(&mut session, &mut tls, cfg.response_observer.clone()).await;
                    continue 'outer;
                },
            }
        }
    }

    queue
}

async fn open_session<C: Clock>(
    session: &mut GatewaySession<C::Instant>,
    transport: &dyn PushTransport,
    endpoint: &Endpoint,
    clock: &C,
) -> Result<TlsSession, apns_transport::TransportError> {
    session.begin_connect().expect("absent session can always begin connecting");
    match transport.connect(endpoint).await {
        Ok(stream) => {
            session.on_connected(clock.now()).expect("just transitioned into connecting");
            Ok(stream)
        },
        Err(error) => {
            session.on_connect_failed().expect("just transitioned into connecting");
            Err(error)
        },
    }
}

async fn close_session<I>(session: &mut GatewaySession<I>, tls: &mut Option<TlsSession>)
where
    I: Copy + Ord + std::ops::Sub<Output = Duration>,
{
    if session.state() == GatewayState::Connected {
        let actions = session.begin_idle_close().expect("session is connected");
        execute(actions, tls, None).await;
    }
    session.on_closed();
    *tls = None;
}

/// Decode and deliver whatever bytes (if any) were obtained for the response
/// frame the peer may have sent just before closing, then close the
/// session. Shared by the write-failure and unsolicited-peer-activity paths.
async fn finish_draining<I>(
    session: &mut GatewaySession<I>,
    tls: &mut Option<TlsSession>,
    observer: Option<Arc<dyn ResponseObserver>>,
    bytes: Option<Vec<u8>>,
) where
    I: Copy + Ord + std::ops::Sub<Output = Duration>,
{
    match session.on_residual_read(bytes.as_deref()) {
        Ok(actions) => execute(actions, tls, observer).await,
        Err(error) => {
            tracing::debug!(%error, "residual bytes did not decode as a response frame");
            *tls = None;
        },
    }
}

/// A write just failed. The peer may have already sent and flushed an error
/// response before resetting the connection, so attempt one bounded read for
/// it before giving up (spec §4.3).
async fn drain_after_failure<I>(
    session: &mut GatewaySession<I>,
    tls: &mut Option<TlsSession>,
    observer: Option<Arc<dyn ResponseObserver>>,
) where
    I: Copy + Ord + std::ops::Sub<Output = Duration>,
{
    let Ok(actions) = session.begin_draining() else {
        *tls = None;
        return;
    };
    debug_assert_eq!(actions, vec![GatewayAction::AttemptResidualRead]);

    let residual = match tls.as_mut() {
        Some(stream) => tokio::time::timeout(RESIDUAL_READ_TIMEOUT, stream.read(RESPONSE_FRAME_LENGTH))
            .await
            .ok()
            .and_then(std::result::Result::ok)
            .flatten(),
        None => None,
    };

    finish_draining(session, tls, observer, residual).await;
}

/// The socket produced bytes (or closed) while the worker was idle-waiting
/// for the next frame, with no write in flight. Transition straight to
/// draining with whatever was read.
async fn handle_peer_activity<I>(
    session: &mut GatewaySession<I>,
    tls: &mut Option<TlsSession>,
    observer: Option<Arc<dyn ResponseObserver>>,
    peer: Result<Option<Vec<u8>>, TransportError>,
) where
    I: Copy + Ord + std::ops::Sub<Output = Duration>,
{
    let Ok(actions) = session.begin_draining() else {
        *tls = None;
        return;
    };
    debug_assert_eq!(actions, vec![GatewayAction::AttemptResidualRead]);

    let bytes = match peer {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::debug!(%error, "read failed while draining");
            None
        },
    };

    finish_draining(session, tls, observer, bytes).await;
}

async fn execute(
    actions: Vec<GatewayAction>,
    tls: &mut Option<TlsSession>,
    observer: Option<Arc<dyn ResponseObserver>>,
) {
    for action in actions {
        match action {
            GatewayAction::CloseSession => {
                if let Some(mut stream) = tls.take() {
                    stream.close().await;
                }
            },
            GatewayAction::DeliverResponse { status, identifier } => {
                // Spec §5: observer invocation must not block the worker, so
                // it never runs on this task.
                if let Some(observer) = observer.clone() {
                    tokio::spawn(async move {
                        observer.on_response(status, identifier);
                    });
                }
            },
            GatewayAction::OpenConnection | GatewayAction::SendFrame(_) => {
                unreachable!("open/send actions are handled inline by the worker, not executed here")
            },
            GatewayAction::AttemptResidualRead => {},
        }
    }
}
