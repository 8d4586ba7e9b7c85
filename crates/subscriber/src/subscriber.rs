//! Reconnecting subscriber — drives connection attempts over a
//! [`Transport`], tracks the cursor, and decides when to retry.

use std::sync::Arc;
use std::time::Duration;

use ev_domain::{Event, EventId};
use ev_transport::{Connection, StreamItem, Transport};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::debug::DebugLog;
use crate::reconnect::ReconnectBackoff;
use crate::sink::EventSink;
use crate::types::{AttemptError, SubscriberError, SubscriptionConfig};

/// Prefix every handshake frame must start with.
pub const HANDSHAKE_PREFIX: &str = ":ok";

/// A fully-configured subscriber ready to connect.
///
/// Create via [`SubscriberBuilder`](crate::builder::SubscriberBuilder).
pub struct Subscriber {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) config: SubscriptionConfig,
    pub(crate) reconnect_backoff: ReconnectBackoff,
    pub(crate) handshake_timeout: Duration,
    pub(crate) log: Arc<dyn DebugLog>,
}

/// State of one connection attempt.  Dropped when the attempt ends.
#[derive(Debug)]
struct AttemptState {
    /// Server's latest event id at pre-flight time.
    latest: Option<EventId>,
    /// Id of the last event handed to the sink (or the resume cursor).
    cursor: Option<EventId>,
    started: Instant,
    caught_up: bool,
    handshake_completed: bool,
}

impl AttemptState {
    fn new(cursor: Option<EventId>) -> Self {
        Self {
            latest: None,
            cursor,
            started: Instant::now(),
            caught_up: false,
            handshake_completed: false,
        }
    }
}

/// How one attempt ended.
enum AttemptOutcome {
    Cancelled,
    Rejected(String),
    SinkFailed(anyhow::Error),
    Ended(AttemptState),
    Errored(AttemptState, AttemptError),
}

impl Subscriber {
    /// Start a new builder.
    pub fn builder() -> crate::builder::SubscriberBuilder {
        crate::builder::SubscriberBuilder::new()
    }

    /// The configuration of the first attempt.
    pub fn config(&self) -> &SubscriptionConfig {
        &self.config
    }

    /// Run the subscription.  Events are handed to `sink` in stream order.
    ///
    /// Returns `Ok(())` once `shutdown` is cancelled.  Returns an error when
    /// the handshake is rejected, when the stream ends with retry disabled,
    /// when the sink fails, or when the reconnect policy is exhausted.
    /// Every other failure is retried with back-off.
    pub async fn run<S>(&self, sink: &mut S, shutdown: CancellationToken) -> Result<(), SubscriberError>
    where
        S: EventSink + ?Sized,
    {
        let policy = &self.reconnect_backoff;
        let mut config = self.config.clone();
        let mut backoff = policy.start();

        self.log.write(&format!(
            "{} version {}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        ));

        loop {
            let state = match self.attempt(&config, sink, &shutdown).await {
                AttemptOutcome::Cancelled => {
                    self.aborted();
                    return Ok(());
                }
                AttemptOutcome::Rejected(frame) => {
                    self.log.write(&format!("unexpected handshake: {frame:?}"));
                    tracing::error!(endpoint = %config.endpoint, "handshake rejected");
                    return Err(SubscriberError::Handshake(frame));
                }
                AttemptOutcome::SinkFailed(e) => {
                    self.log.write(&format!("sink failed: {e}"));
                    return Err(SubscriberError::Sink(e));
                }
                AttemptOutcome::Ended(state) => {
                    self.log.write("stream ended");
                    if let Some(ref id) = state.cursor {
                        self.log.write(&format!("latest id: {id}"));
                    }
                    tracing::info!(
                        endpoint = %config.endpoint,
                        last_event_id = ?state.cursor,
                        "stream ended"
                    );
                    if !config.retry {
                        return Err(SubscriberError::StreamEnded {
                            last_event_id: state.cursor,
                        });
                    }
                    state
                }
                AttemptOutcome::Errored(state, error) => {
                    self.log.write(&format!("error: {error}"));
                    tracing::warn!(
                        endpoint = %config.endpoint,
                        failures = backoff.failures,
                        error = %error,
                        "attempt failed"
                    );
                    state
                }
            };

            // A completed handshake closes the previous failure episode.
            if state.handshake_completed {
                backoff = policy.start();
            }

            if policy.should_give_up(backoff.failures) {
                tracing::error!(
                    endpoint = %config.endpoint,
                    attempts = backoff.failures,
                    "max reconnect attempts exhausted"
                );
                return Err(SubscriberError::ReconnectExhausted(backoff.failures));
            }

            self.log
                .write(&format!("retrying after {} ms...", backoff.delay.as_millis()));
            tracing::info!(
                endpoint = %config.endpoint,
                delay_ms = backoff.delay.as_millis() as u64,
                attempt = backoff.failures + 1,
                "reconnecting"
            );

            let cancelled = tokio::select! {
                biased;
                _ = shutdown.cancelled() => true,
                _ = tokio::time::sleep(backoff.delay) => false,
            };
            if cancelled {
                self.aborted();
                return Ok(());
            }

            backoff = backoff.escalate(policy);
            config = config.resume_from(state.cursor);
        }
    }

    /// Same as [`run`](Self::run), but owns the sink and returns a
    /// `JoinHandle`.
    pub fn spawn<S>(
        self,
        mut sink: S,
        shutdown: CancellationToken,
    ) -> tokio::task::JoinHandle<Result<(), SubscriberError>>
    where
        S: EventSink + 'static,
    {
        tokio::spawn(async move { self.run(&mut sink, shutdown).await })
    }

    fn aborted(&self) {
        self.log.write("user aborting");
        tracing::info!(endpoint = %self.config.endpoint, "subscription cancelled");
    }

    /// Single attempt: pre-flight -> connect -> handshake -> stream.
    async fn attempt<S>(
        &self,
        config: &SubscriptionConfig,
        sink: &mut S,
        shutdown: &CancellationToken,
    ) -> AttemptOutcome
    where
        S: EventSink + ?Sized,
    {
        let mut state = AttemptState::new(config.last_event_id.clone());

        // ── Pre-flight ───────────────────────────────────────────────
        self.log.write(&format!("verifying endpoint {}", config.endpoint));
        let latest = tokio::select! {
            biased;
            _ = shutdown.cancelled() => None,
            r = self.transport.latest_event_id(&config.endpoint) => Some(r),
        };
        let latest = match latest {
            None => return AttemptOutcome::Cancelled,
            Some(Ok(latest)) => latest,
            Some(Err(source)) => {
                let error = AttemptError::Preflight {
                    endpoint: config.endpoint.clone(),
                    source,
                };
                return AttemptOutcome::Errored(state, error);
            }
        };
        self.log
            .write(&format!("latest event from server: {}", display_id(&latest)));
        self.log.write(&format!(
            "latest event from client: {}",
            display_id(&config.last_event_id)
        ));
        self.log
            .write(&format!("retry: {}", if config.retry { "yes" } else { "no" }));
        state.latest = latest;

        // ── Connect ──────────────────────────────────────────────────
        let url = config.subscribe_url();
        let headers = config.headers();
        state.started = Instant::now();
        // One deadline covers the response headers and the first frame.
        let handshake_deadline = state.started + self.handshake_timeout;
        tracing::debug!(url = %url, last_event_id = ?config.last_event_id, "connecting");
        let opened = tokio::select! {
            biased;
            _ = shutdown.cancelled() => None,
            r = tokio::time::timeout_at(
                handshake_deadline,
                self.transport.open(&url, &headers),
            ) => Some(r),
        };
        let mut conn = match opened {
            None => return AttemptOutcome::Cancelled,
            Some(Err(_elapsed)) => {
                let error = AttemptError::HandshakeTimeout(self.handshake_timeout);
                return AttemptOutcome::Errored(state, error);
            }
            Some(Ok(Ok(conn))) => conn,
            Some(Ok(Err(source))) => {
                self.log.write(&format!("Error while subscribing to {url}"));
                return AttemptOutcome::Errored(state, AttemptError::Connect { url, source });
            }
        };

        // ── Handshake ────────────────────────────────────────────────
        let first = tokio::select! {
            biased;
            _ = shutdown.cancelled() => None,
            r = tokio::time::timeout_at(handshake_deadline, conn.next()) => Some(r),
        };
        let first = match first {
            None => return cancel(&conn),
            Some(Err(_elapsed)) => {
                conn.abort();
                let error = AttemptError::HandshakeTimeout(self.handshake_timeout);
                return AttemptOutcome::Errored(state, error);
            }
            Some(Ok(item)) => item,
        };
        match first {
            Some(StreamItem::Frame(frame)) if frame.starts_with(HANDSHAKE_PREFIX) => {}
            Some(StreamItem::Frame(frame)) => {
                conn.abort();
                return AttemptOutcome::Rejected(frame);
            }
            Some(StreamItem::Event(event)) => {
                conn.abort();
                return AttemptOutcome::Rejected(format!("event {} before handshake", event.id()));
            }
            Some(StreamItem::Error(e)) => {
                conn.abort();
                return AttemptOutcome::Errored(state, AttemptError::Stream(e));
            }
            None => return AttemptOutcome::Errored(state, AttemptError::ClosedBeforeHandshake),
        }

        state.handshake_completed = true;
        self.log
            .write(&format!("connected after {:?}!", state.started.elapsed()));
        tracing::info!(url = %url, "subscribed");

        // ── Stream ───────────────────────────────────────────────────
        loop {
            let item = tokio::select! {
                biased;
                _ = shutdown.cancelled() => None,
                item = conn.next() => Some(item),
            };
            let Some(item) = item else {
                return cancel(&conn);
            };

            match item {
                Some(StreamItem::Frame(frame)) => {
                    tracing::trace!(bytes = frame.len(), "frame");
                }
                Some(StreamItem::Event(event)) => {
                    if let Err(e) = sink.deliver(&event) {
                        conn.abort();
                        return AttemptOutcome::SinkFailed(e);
                    }
                    self.track(&mut state, &event);
                }
                Some(StreamItem::Error(e)) => {
                    self.log.write(&format!("Error while subscribing to {url}"));
                    conn.abort();
                    return AttemptOutcome::Errored(state, AttemptError::Stream(e));
                }
                None => {
                    conn.abort();
                    return AttemptOutcome::Ended(state);
                }
            }
        }
    }

    /// Advance the cursor past `event` and report catch-up once.
    fn track(&self, state: &mut AttemptState, event: &Event) {
        if !state.caught_up && state.latest.as_ref() == Some(event.id()) {
            state.caught_up = true;
            self.log.write(&format!(
                "caught up with server after {:?}!",
                state.started.elapsed()
            ));
            tracing::info!(event_id = %event.id(), "caught up with server");
        }
        state.cursor = Some(event.id().clone());
    }
}

fn cancel(conn: &Connection) -> AttemptOutcome {
    conn.abort();
    AttemptOutcome::Cancelled
}

fn display_id(id: &Option<EventId>) -> String {
    id.as_ref().map_or_else(|| "none".to_owned(), EventId::to_string)
}
