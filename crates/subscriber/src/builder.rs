//! Builder pattern for constructing a [`Subscriber`].

use std::sync::Arc;
use std::time::Duration;

use ev_domain::config::Config;
use ev_domain::EventId;
use ev_transport::Transport;

use crate::debug::{DebugLog, Silent, Stderr};
use crate::reconnect::ReconnectBackoff;
use crate::subscriber::Subscriber;
use crate::types::{SubscriberError, SubscriptionConfig};

/// Fluent builder for [`Subscriber`].
///
/// # Example
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use ev_domain::config::TransportConfig;
/// # use ev_subscriber::SubscriberBuilder;
/// # use ev_transport::HttpTransport;
/// let transport = Arc::new(HttpTransport::new(&TransportConfig::default()).unwrap());
/// let subscriber = SubscriberBuilder::new()
///     .endpoint("http://localhost:3000")
///     .last_event_id("1042")
///     .burst_count(100)
///     .retry(true)
///     .build(transport)
///     .unwrap();
/// ```
pub struct SubscriberBuilder {
    pub(crate) endpoint: String,
    pub(crate) last_event_id: Option<EventId>,
    pub(crate) burst_count: Option<u32>,
    pub(crate) burst_time: Option<u64>,
    pub(crate) debug: bool,
    pub(crate) retry: bool,
    pub(crate) reconnect_backoff: ReconnectBackoff,
    pub(crate) handshake_timeout: Duration,
    pub(crate) log: Option<Arc<dyn DebugLog>>,
}

impl SubscriberBuilder {
    pub fn new() -> Self {
        Self {
            endpoint: String::new(),
            last_event_id: None,
            burst_count: None,
            burst_time: None,
            debug: false,
            retry: false,
            reconnect_backoff: ReconnectBackoff::default(),
            handshake_timeout: Duration::from_secs(10),
            log: None,
        }
    }

    /// Seed every setting from the configuration file.
    pub fn from_config(config: &Config) -> Self {
        let sub = &config.subscriber;
        Self {
            endpoint: sub.endpoint.clone().unwrap_or_default(),
            last_event_id: sub.last_event_id.clone().map(EventId::from),
            burst_count: sub.burst_count,
            burst_time: sub.burst_time,
            debug: sub.debug,
            retry: sub.retry,
            reconnect_backoff: ReconnectBackoff::from(&config.reconnect),
            handshake_timeout: Duration::from_millis(config.transport.handshake_timeout_ms),
            log: None,
        }
    }

    // ── Subscription ─────────────────────────────────────────────────

    /// Set the event server base URL (e.g. `http://localhost:3000`).
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    /// Resume after this event id.
    pub fn last_event_id(mut self, id: impl Into<EventId>) -> Self {
        self.last_event_id = Some(id.into());
        self
    }

    /// Forwarded as the `burst-count` header.
    pub fn burst_count(mut self, n: u32) -> Self {
        self.burst_count = Some(n);
        self
    }

    /// Forwarded as the `burst-time` header (milliseconds).
    pub fn burst_time(mut self, ms: u64) -> Self {
        self.burst_time = Some(ms);
        self
    }

    /// Reconnect after the server ends the stream (default off).
    pub fn retry(mut self, retry: bool) -> Self {
        self.retry = retry;
        self
    }

    // ── Behavior ─────────────────────────────────────────────────────

    /// Print progress lines to stderr unless a [`DebugLog`] is injected.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Inject the debug output channel.
    pub fn debug_log(mut self, log: Arc<dyn DebugLog>) -> Self {
        self.log = Some(log);
        self
    }

    /// Override the reconnect backoff policy.
    pub fn reconnect_backoff(mut self, cfg: ReconnectBackoff) -> Self {
        self.reconnect_backoff = cfg;
        self
    }

    /// How long to wait for the `:ok` frame (default 10s).
    pub fn handshake_timeout(mut self, d: Duration) -> Self {
        self.handshake_timeout = d;
        self
    }

    /// Build the [`Subscriber`] over `transport`.
    pub fn build(self, transport: Arc<dyn Transport>) -> Result<Subscriber, SubscriberError> {
        if self.endpoint.trim().is_empty() {
            return Err(SubscriberError::Config("endpoint is required".into()));
        }

        let log = self.log.unwrap_or_else(|| {
            if self.debug {
                Arc::new(Stderr) as Arc<dyn DebugLog>
            } else {
                Arc::new(Silent)
            }
        });

        Ok(Subscriber {
            transport,
            config: SubscriptionConfig {
                endpoint: self.endpoint,
                last_event_id: self.last_event_id,
                burst_count: self.burst_count,
                burst_time: self.burst_time,
                debug: self.debug,
                retry: self.retry,
            },
            reconnect_backoff: self.reconnect_backoff,
            handshake_timeout: self.handshake_timeout,
            log,
        })
    }
}

impl Default for SubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}
