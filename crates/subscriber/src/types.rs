//! Core types: per-attempt configuration and errors.

use std::time::Duration;

use ev_domain::EventId;
use ev_transport::{SubscribeHeaders, TransportError};

/// Parameters of one connection attempt.
///
/// Immutable for the duration of an attempt; the reconnect loop derives the
/// next attempt's config with [`resume_from`](Self::resume_from).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionConfig {
    /// Base URL of the event server.
    pub endpoint: String,
    /// Cursor sent as `Last-Event-ID`.
    pub last_event_id: Option<EventId>,
    pub burst_count: Option<u32>,
    pub burst_time: Option<u64>,
    pub debug: bool,
    /// Reconnect after the server ends the stream.
    pub retry: bool,
}

impl SubscriptionConfig {
    /// `<endpoint>/subscribe`.
    pub fn subscribe_url(&self) -> String {
        format!("{}/subscribe", self.endpoint.trim_end_matches('/'))
    }

    pub fn headers(&self) -> SubscribeHeaders {
        SubscribeHeaders {
            last_event_id: self.last_event_id.clone(),
            burst_count: self.burst_count,
            burst_time: self.burst_time,
        }
    }

    /// The config of the next attempt, resuming after `cursor`.
    #[must_use]
    pub fn resume_from(&self, cursor: Option<EventId>) -> Self {
        Self {
            last_event_id: cursor,
            ..self.clone()
        }
    }
}

/// Why a subscription stopped for good.
#[derive(thiserror::Error, Debug)]
pub enum SubscriberError {
    #[error("config: {0}")]
    Config(String),
    #[error("handshake rejected: expected `:ok`, got {0:?}")]
    Handshake(String),
    #[error("stream ended{}", .last_event_id.as_ref().map(|id| format!(" after event {id}")).unwrap_or_default())]
    StreamEnded { last_event_id: Option<EventId> },
    #[error("reconnect exhausted after {0} attempts")]
    ReconnectExhausted(u32),
    #[error("sink: {0}")]
    Sink(#[source] anyhow::Error),
}

impl SubscriberError {
    /// Process exit code for this termination.  A clean cancellation is `0`.
    pub fn exit_code(&self) -> i32 {
        match self {
            SubscriberError::Config(_) => 2,
            _ => 1,
        }
    }
}

/// A failed attempt that the reconnect loop recovers from.
#[derive(thiserror::Error, Debug)]
pub(crate) enum AttemptError {
    #[error("pre-flight to {endpoint} failed: {source}")]
    Preflight {
        endpoint: String,
        #[source]
        source: TransportError,
    },
    #[error("connecting to {url} failed: {source}")]
    Connect {
        url: String,
        #[source]
        source: TransportError,
    },
    #[error("stream: {0}")]
    Stream(#[source] TransportError),
    #[error("no handshake within {0:?}")]
    HandshakeTimeout(Duration),
    #[error("stream closed before handshake")]
    ClosedBeforeHandshake,
}
