//! `reqwest` implementation of [`Transport`].
//!
//! `HttpTransport` wraps one `reqwest::Client` for the lifetime of the
//! subscriber.  The client carries only a connect timeout; the pre-flight
//! request adds its own total timeout so that the long-lived stream request
//! is never cut off.

use std::time::Duration;

use async_trait::async_trait;
use ev_domain::config::TransportConfig;
use ev_domain::{EventId, LatestEvent};
use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::sse::sse_item_stream;
use crate::traits::{Connection, SubscribeHeaders, Transport, TransportError};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    preflight_timeout: Duration,
}

impl HttpTransport {
    /// Build a transport from the shared `TransportConfig`.
    pub fn new(cfg: &TransportConfig) -> Result<Self, TransportError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_millis(cfg.connect_timeout_ms))
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;

        Ok(Self {
            http,
            preflight_timeout: Duration::from_millis(cfg.preflight_timeout_ms),
        })
    }

    /// The configured pre-flight timeout.
    pub fn preflight_timeout(&self) -> Duration {
        self.preflight_timeout
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait]
impl Transport for HttpTransport {
    async fn latest_event_id(&self, endpoint: &str) -> Result<Option<EventId>, TransportError> {
        let url = format!("{}/events/latest", endpoint.trim_end_matches('/'));
        let resp = self
            .http
            .get(&url)
            .timeout(self.preflight_timeout)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(from_reqwest)?;
        let latest: LatestEvent = serde_json::from_str(&body).map_err(|e| {
            TransportError::Decode(format!("failed to parse latest event: {e}: {body}"))
        })?;
        Ok(latest.id)
    }

    async fn open(
        &self,
        url: &str,
        headers: &SubscribeHeaders,
    ) -> Result<Connection, TransportError> {
        let mut rb = self.http.get(url).header(ACCEPT, "text/event-stream");
        for (name, value) in headers.pairs() {
            rb = rb.header(name, value);
        }

        let resp = rb.send().await.map_err(from_reqwest)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }

        tracing::debug!(url = %url, "event stream opened");
        let chunks = resp.bytes_stream().map(|chunk| chunk.map_err(from_reqwest));
        Ok(Connection::new(sse_item_stream(chunks), CancellationToken::new()))
    }
}

/// Convert a `reqwest::Error` into a [`TransportError`].
pub fn from_reqwest(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else if e.is_decode() {
        TransportError::Decode(e.to_string())
    } else {
        TransportError::Http(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_default_config() {
        let transport = HttpTransport::new(&TransportConfig::default()).unwrap();
        assert_eq!(transport.preflight_timeout(), Duration::from_secs(10));
    }
}
